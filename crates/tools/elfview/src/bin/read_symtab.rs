//! Display the `.symtab` symbol table of an ELF64 file.

use std::process::ExitCode;

use clap::Parser;
use elfview::cli::ReadSymtabCli;

fn main() -> ExitCode {
    let cli = ReadSymtabCli::parse();
    elfview::run::exit_with("read-symtab", elfview::run::read_symtab(&cli))
}
