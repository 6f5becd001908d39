//! Configuration loading: optional TOML file overlaid by command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use elfview_elf::{LabelMode, ReadMode};
use serde::Deserialize;

use crate::cli::{CommonArgs, Labels};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "ELFVIEW_CONFIG";

/// Contents of a configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    report: ReportSection,
    reader: ReaderSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ReportSection {
    labels: Option<Labels>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ReaderSection {
    mode: Option<ReaderMode>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ReaderMode {
    Mmap,
    Buffered,
}

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Input file.
    pub file: PathBuf,
    /// Symbol label style.
    pub labels: LabelMode,
    /// How the input is read.
    pub read_mode: ReadMode,
}

impl Settings {
    /// Resolve settings from command-line arguments, the `--config` file or
    /// `$ELFVIEW_CONFIG`, and defaults, in that order of precedence.
    pub fn resolve(args: &CommonArgs) -> Result<Self> {
        let path = args
            .config
            .clone()
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        let file_config = match path {
            Some(ref p) => load_file(p)?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(args, &file_config))
    }

    fn merge(args: &CommonArgs, file: &FileConfig) -> Self {
        let labels = args
            .labels
            .or(file.report.labels)
            .map_or_else(LabelMode::default, LabelMode::from);

        let read_mode = if args.buffered {
            ReadMode::Buffered
        } else {
            match file.reader.mode {
                Some(ReaderMode::Buffered) => ReadMode::Buffered,
                Some(ReaderMode::Mmap) | None => ReadMode::Mapped,
            }
        };

        Self {
            file: args.file.clone(),
            labels,
            read_mode,
        }
    }
}

fn load_file(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    tracing::debug!(path = %path.display(), ?config, "loaded configuration");
    Ok(config)
}
