//! Common cargo invocation for workspace packages.

use crate::config::Config;
use anyhow::{Context, Result};
use xshell::{Shell, cmd};

/// A cargo subcommand run from the workspace root.
pub struct CargoCommand {
    /// Cargo subcommand: "test", "clippy", "doc", "fmt".
    pub subcommand: String,
    /// Packages to operate on (one `-p` each). Empty means no `-p`.
    pub packages: Vec<String>,
    /// Whether to pass --release.
    pub release: bool,
    /// Arguments placed before `--` (cargo flags).
    pub flags: Vec<String>,
    /// Extra arguments appended after `--`.
    pub extra_args: Vec<String>,
}

impl CargoCommand {
    /// Create a command for `subcommand` with no options.
    pub fn new(subcommand: &str) -> Self {
        Self {
            subcommand: subcommand.into(),
            packages: Vec::new(),
            release: false,
            flags: Vec::new(),
            extra_args: Vec::new(),
        }
    }

    /// Build the argument list passed to cargo.
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![self.subcommand.clone()];

        for pkg in &self.packages {
            args.push("-p".into());
            args.push(pkg.clone());
        }

        if self.release {
            args.push("--release".into());
        }

        args.extend(self.flags.iter().cloned());

        if !self.extra_args.is_empty() {
            args.push("--".into());
            args.extend(self.extra_args.iter().cloned());
        }
        args
    }

    /// Execute the cargo command in the workspace root.
    pub fn run(&self, config: &Config) -> Result<()> {
        let sh = Shell::new()?;
        sh.change_dir(&config.workspace_root);

        let args = self.args();
        cmd!(sh, "cargo {args...}")
            .run()
            .with_context(|| format!("cargo {} failed", self.subcommand))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_order() {
        let mut c = CargoCommand::new("clippy");
        c.packages = vec!["elfview-elf".into(), "elfview".into()];
        c.flags = vec!["--all-targets".into()];
        c.extra_args = vec!["-D".into(), "warnings".into()];
        assert_eq!(
            c.args(),
            [
                "clippy",
                "-p",
                "elfview-elf",
                "-p",
                "elfview",
                "--all-targets",
                "--",
                "-D",
                "warnings"
            ]
        );
    }
}
