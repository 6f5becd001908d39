//! Development automation for elfview.
//!
//! Usage:
//!   cargo xtask test     - Run host tests for every workspace package
//!   cargo xtask test -p elfview-elf --no-default-features - Test the no_std build
//!   cargo xtask clippy   - Run clippy with warnings denied
//!   cargo xtask fmt      - Format (or `--check`) all sources
//!   cargo xtask doc      - Generate documentation

mod cargo;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::cargo::CargoCommand;
use crate::config::Config;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development automation for elfview")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run host tests
    Test {
        /// Build in release mode
        #[arg(short, long)]
        release: bool,

        /// Package to test (default: all configured packages)
        #[arg(short, long)]
        package: Option<String>,

        /// Test without default features (no std, no mmap)
        #[arg(long)]
        no_default_features: bool,

        /// Extra arguments passed after -- (forwarded to test binary)
        #[arg(last = true)]
        extra_args: Vec<String>,
    },

    /// Run clippy lints
    Clippy {
        /// Package to lint (default: all configured packages)
        #[arg(short, long)]
        package: Option<String>,
    },

    /// Format sources
    Fmt {
        /// Check formatting without writing changes
        #[arg(long)]
        check: bool,
    },

    /// Generate documentation
    Doc {
        /// Open documentation in browser after building
        #[arg(long)]
        open: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Test {
            release,
            package,
            no_default_features,
            extra_args,
        } => {
            test::run_tests(&config, package, release, no_default_features, extra_args)?;
        }

        Commands::Clippy { package } => {
            let mut command = CargoCommand::new("clippy");
            command.packages = config.select(package);
            command.flags = vec!["--all-targets".into()];
            command.extra_args = vec!["-D".into(), "warnings".into()];
            command.run(&config)?;
        }

        Commands::Fmt { check } => {
            let mut command = CargoCommand::new("fmt");
            command.flags = vec!["--all".into()];
            if check {
                command.flags.push("--check".into());
            }
            command.run(&config)?;
        }

        Commands::Doc { open } => {
            let mut command = CargoCommand::new("doc");
            command.packages = config.select(None);
            command.flags = vec!["--no-deps".into()];
            if open {
                command.flags.push("--open".into());
            }
            command.run(&config)?;
        }
    }

    Ok(())
}
