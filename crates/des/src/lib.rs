//!
//! A crate containing the discrete event system primitives of the covert
//! attack analysis: the system assumptions, deterministic automata, belief
//! sets, unobservable reach, the closed-loop system and the supervisor and
//! attacker observers.
//!
//! This crate does not use unsafe code.

#![forbid(unsafe_code)]

mod assumptions;
mod automaton;
mod belief;
mod closed_loop;
mod event;
mod observer;
mod unobservable_reach;

pub use assumptions::*;
pub use automaton::*;
pub use belief::*;
pub use closed_loop::*;
pub use event::*;
pub use observer::*;
pub use unobservable_reach::*;
