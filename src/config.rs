// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

use crate::write::OutputFormat;

/// Settings for the CLI. Every field is optional in the YAML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where candidate input files are listed from.
    pub input_dir: PathBuf,
    /// Where per-brand files are written.
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    /// Show progress bars.
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            format: OutputFormat::Csv,
            progress: true,
        }
    }
}

impl Config {
    /// Read a YAML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let cfg = Config::from_yaml("output_dir: by_brand\nformat: parquet\n")?;
        assert_eq!(cfg.input_dir, PathBuf::from("input"));
        assert_eq!(cfg.output_dir, PathBuf::from("by_brand"));
        assert_eq!(cfg.format, OutputFormat::Parquet);
        assert!(cfg.progress);
        Ok(())
    }

    #[test]
    fn empty_file_is_default() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(b"\n")?;
        assert_eq!(Config::from_file(tmp.path())?, Config::default());
        Ok(())
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_yaml("colour: blue\n").is_err());
        assert!(Config::from_yaml("format: xlsx\n").is_err());
    }
}
