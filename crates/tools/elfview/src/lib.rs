//! `readelf`-style reports for ELF64 files.
//!
//! Shared implementation of the `read-elf` and `read-symtab` tools: argument
//! parsing, configuration, logging, and the output sink around the
//! `elfview-elf` parser.

pub mod cli;
pub mod config;
pub mod logging;
pub mod run;
pub mod sink;
