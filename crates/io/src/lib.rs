//!
//! A crate containing IO related functionality. This includes the reading and
//! writing of .aut (Aldebaran) lts formats for every stage of the analysis and
//! the plain text reports of the label maps and strategies.
//!

#![forbid(unsafe_code)]

mod directory;
mod line_iterator;

pub mod io_aut;
pub mod reports;

pub use directory::*;
