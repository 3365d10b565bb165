//!
//! A crate containing labelled transition systems related functionality. The
//! transition systems carry an arbitrary state payload, which is interned such
//! that equal payloads always map to the same state index.
//!
//! This crate does not use unsafe code.

#![forbid(unsafe_code)]

mod indexed_partition;
mod labelled_transition_system;
mod random_lts;
mod reachability;
mod scc_decomposition;

pub use indexed_partition::*;
pub use labelled_transition_system::*;
pub use random_lts::*;
pub use reachability::*;
pub use scc_decomposition::*;
