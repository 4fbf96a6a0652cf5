//! Terminal output and prompts for the command line.
//!
//! # Modules
//!
//! - [`display`]: styled result lines for `serve` and `send`
//! - [`prompt`]: masked password entry

pub mod display;
pub mod prompt;
