//! Subcommand modules for the `cnp` binary.

pub mod convert;
pub mod dist;
pub mod score;
pub mod search;
