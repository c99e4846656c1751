use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

/// Name of the labeled dataset inside the output directory.
pub const DATASET_FILE_NAME: &str = "labeled_data.csv";

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Hyperspectral data annotation tool")]
pub struct Args {
    /// Directory containing hyperspectral cubes (.hdr + .raw)
    #[arg(long = "dir", default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory where the labeled dataset is written
    #[arg(long = "out", default_value = "dataset")]
    pub output_dir: PathBuf,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Process-wide settings, resolved once at start-up and handed to the
/// components that need them.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Full path of the labeled dataset file.
    pub fn dataset_path(&self) -> PathBuf {
        self.output_dir.join(DATASET_FILE_NAME)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Make sure the output directory exists.
    pub fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("creating output directory {}", self.output_dir.display())
        })?;
        log::info!("Data directory: {}", self.data_dir.display());
        log::info!("Dataset output: {}", self.dataset_path().display());
        Ok(())
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config::new(args.data_dir, args.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_default_to_data_and_dataset() {
        let args = Args::parse_from(["hsi-annotator"]);
        let config = Config::from(args);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.dataset_path(), Path::new("dataset").join("labeled_data.csv"));
    }

    #[test]
    fn args_override_directories() {
        let args = Args::parse_from(["hsi-annotator", "--dir", "/cubes", "--out", "/labels"]);
        let config = Config::from(args);
        assert_eq!(config.data_dir(), Path::new("/cubes"));
        assert_eq!(config.output_dir, PathBuf::from("/labels"));
    }

    #[test]
    fn prepare_creates_output_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("nested").join("out");
        let config = Config::new(tmp.path(), &out);
        config.prepare().unwrap();
        assert!(out.is_dir());
    }
}
