//! Command-line shell for CSVW imports: argument parsing, logging setup,
//! file I/O and the run summary.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
