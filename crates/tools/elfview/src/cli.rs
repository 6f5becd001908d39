//! Command-line interface definitions for `read-elf` and `read-symtab`.

use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};
use serde::Deserialize;

/// Symbol label style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Labels {
    /// FUNC/OBJECT, GLOBAL/LOCAL, DEFAULT/HIDDEN/INTERNAL.
    Compat,
    /// Every standard type, binding and visibility name.
    Full,
}

impl From<Labels> for elfview_elf::LabelMode {
    fn from(labels: Labels) -> Self {
        match labels {
            Labels::Compat => Self::Compat,
            Labels::Full => Self::Full,
        }
    }
}

/// Options shared by both tools.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// ELF64 file to inspect.
    pub file: PathBuf,

    /// TOML configuration file (defaults to `$ELFVIEW_CONFIG` if set).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Symbol label style (overrides the configuration file).
    #[arg(long, value_enum)]
    pub labels: Option<Labels>,

    /// Read the file into memory instead of mapping it.
    #[arg(long)]
    pub buffered: bool,

    /// Show only errors on stderr.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Increase log verbosity (`-v` debug, `-vv` trace).
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Display the ELF file header.
#[derive(Debug, Parser)]
#[command(name = "read-elf", version, about)]
pub struct ReadElfCli {
    /// Shared options.
    #[command(flatten)]
    pub common: CommonArgs,

    /// Also display the section header table.
    #[arg(long, short = 'S')]
    pub sections: bool,

    /// Also display the symbol table.
    #[arg(long, short = 's')]
    pub symbols: bool,

    /// Display header, sections and symbols.
    #[arg(long, short = 'a')]
    pub all: bool,
}

/// Display the `.symtab` symbol table of an ELF file.
#[derive(Debug, Parser)]
#[command(name = "read-symtab", version, about)]
pub struct ReadSymtabCli {
    /// Shared options.
    #[command(flatten)]
    pub common: CommonArgs,
}
