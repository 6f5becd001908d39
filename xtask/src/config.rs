//! Configuration loading from workspace metadata.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// `[workspace.metadata.elfview]` in the root Cargo.toml.
#[derive(Debug, Deserialize)]
struct ElfviewMetadata {
    /// Packages covered by `test`, `clippy` and `doc`.
    packages: Vec<String>,
}

/// Workspace configuration.
#[derive(Debug, Deserialize)]
struct WorkspaceConfig {
    workspace: WorkspaceSection,
}

#[derive(Debug, Deserialize)]
struct WorkspaceSection {
    metadata: Option<MetadataSection>,
}

#[derive(Debug, Deserialize)]
struct MetadataSection {
    elfview: Option<ElfviewMetadata>,
}

/// Configuration for xtask commands.
#[derive(Debug, Clone)]
pub struct Config {
    /// Workspace root directory.
    pub workspace_root: PathBuf,
    /// Packages checked by default.
    pub packages: Vec<String>,
}

impl Config {
    /// Load configuration from workspace.
    pub fn load() -> Result<Self> {
        let workspace_root = find_workspace_root()?;
        let cargo_toml = workspace_root.join("Cargo.toml");
        let content = std::fs::read_to_string(&cargo_toml)
            .with_context(|| format!("Failed to read {}", cargo_toml.display()))?;

        let packages = parse_packages(&content)?;

        Ok(Self {
            workspace_root,
            packages,
        })
    }

    /// The packages to operate on: `package` if given, else the configured list.
    pub fn select(&self, package: Option<String>) -> Vec<String> {
        package.map_or_else(|| self.packages.clone(), |p| vec![p])
    }
}

/// Read the package list out of the root manifest.
fn parse_packages(content: &str) -> Result<Vec<String>> {
    let config: WorkspaceConfig = toml::from_str(content).context("Failed to parse Cargo.toml")?;

    Ok(config
        .workspace
        .metadata
        .and_then(|m| m.elfview)
        .map(|e| e.packages)
        .unwrap_or_else(|| vec!["elfview-elf".to_string(), "elfview".to_string()]))
}

/// Find the workspace root by looking for Cargo.toml with [workspace].
fn find_workspace_root() -> Result<PathBuf> {
    let mut dir = std::env::current_dir().context("Failed to get current directory")?;

    loop {
        let cargo_toml = dir.join("Cargo.toml");
        if cargo_toml.exists() {
            let content = std::fs::read_to_string(&cargo_toml)?;
            if content.contains("[workspace]") {
                return Ok(dir);
            }
        }

        if !dir.pop() {
            anyhow::bail!("Could not find workspace root (no Cargo.toml with [workspace] found)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packages_from_metadata() {
        let toml = "[workspace]\nmembers = []\n[workspace.metadata.elfview]\npackages = [\"a\", \"b\"]\n";
        assert_eq!(parse_packages(toml).unwrap(), ["a", "b"]);
    }

    #[test]
    fn packages_default_without_metadata() {
        let toml = "[workspace]\nmembers = []\n";
        assert_eq!(parse_packages(toml).unwrap(), ["elfview-elf", "elfview"]);
    }
}
