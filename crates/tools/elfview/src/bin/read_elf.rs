//! Display the file header (and optionally sections and symbols) of an ELF64 file.

use std::process::ExitCode;

use clap::Parser;
use elfview::cli::ReadElfCli;

fn main() -> ExitCode {
    let cli = ReadElfCli::parse();
    elfview::run::exit_with("read-elf", elfview::run::read_elf(&cli))
}
