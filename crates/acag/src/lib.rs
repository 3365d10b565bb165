//!
//! A crate containing the construction of the attack-centric attack graph
//! (ACAG), its reduction to the observer of the attacker (AO-ACAG), the pruning
//! of every branch that leads to detection and the extraction of the covert
//! attack strategies.
//!
//! This crate does not use unsafe code.

#![forbid(unsafe_code)]

mod acag;
mod analysis;
mod classification;
mod observer_reduction;
mod pruning;
mod state;
mod strategy;

pub use acag::*;
pub use analysis::*;
pub use classification::*;
pub use observer_reduction::*;
pub use pruning::*;
pub use state::*;
pub use strategy::*;
