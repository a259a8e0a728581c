//! Runtime settings: built-in defaults, then an optional TOML file, then
//! `DETECT_*` environment variables

use crate::config::ENV_PREFIX;
use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Address the HTTP server listens on
    pub bind: String,

    /// The TorchScript detector, loaded once at startup
    pub model_path: PathBuf,

    /// Newline separated class labels. COCO labels are used when unset
    pub names_path: Option<PathBuf>,

    /// Where received images are written
    pub storage_dir: PathBuf,

    /// Side of the square model input
    pub input_size: u32,

    /// Overlap above which same-class boxes are suppressed
    pub iou_threshold: f32,

    /// Largest accepted JSON body
    pub max_payload_bytes: usize,

    /// HTTP worker threads, actix picks when unset
    pub workers: Option<usize>,

    /// Default tracing filter when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Settings {
    /// Load settings. `file` may not exist
    pub fn load(file: &str) -> Result<Self> {
        let settings: Settings = Config::builder()
            .set_default("bind", "0.0.0.0:8000")?
            .set_default("model_path", "best.pt")?
            .set_default("storage_dir", "received")?
            .set_default("input_size", 640)?
            .set_default("iou_threshold", 0.7)?
            .set_default("max_payload_bytes", 32 * 1024 * 1024)?
            .set_default("log_filter", "info,actix_web=info")?
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("reading settings from {file}"))?
            .try_deserialize()
            .context("invalid settings")?;
        settings
            .validate()
            .with_context(|| format!("invalid settings from {file}"))?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.input_size > 0, "input_size must be positive");
        ensure!(
            self.iou_threshold > 0.0 && self.iou_threshold <= 1.0,
            "iou_threshold must be in (0, 1], got {}",
            self.iou_threshold
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_without_file() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.toml");
        let settings = Settings::load(missing.to_str().unwrap()).unwrap();

        assert_eq!(settings.model_path, PathBuf::from("best.pt"));
        assert_eq!(settings.storage_dir, PathBuf::from("received"));
        assert_eq!(settings.input_size, 640);
        assert_eq!(settings.names_path, None);
        assert_eq!(settings.workers, None);
    }

    #[test]
    fn file_overrides_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("detect.toml");
        fs::write(
            &file,
            "bind = \"127.0.0.1:9000\"\n\
             names_path = \"names.txt\"\n\
             input_size = 320\n\
             workers = 2\n",
        )
        .unwrap();

        let settings = Settings::load(file.to_str().unwrap()).unwrap();
        assert_eq!(settings.bind, "127.0.0.1:9000");
        assert_eq!(settings.names_path, Some(PathBuf::from("names.txt")));
        assert_eq!(settings.input_size, 320);
        assert_eq!(settings.workers, Some(2));
        assert_eq!(settings.model_path, PathBuf::from("best.pt"));
    }

    #[test]
    fn rejects_zero_input_size() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("detect.toml");
        fs::write(&file, "input_size = 0\n").unwrap();

        let err = Settings::load(file.to_str().unwrap()).unwrap_err();
        assert!(format!("{err:#}").contains("input_size"));
    }

    #[test]
    fn rejects_iou_threshold_out_of_range() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("detect.toml");
        for iou in ["0.0", "1.5", "-0.2"] {
            fs::write(&file, format!("iou_threshold = {iou}\n")).unwrap();

            let err = Settings::load(file.to_str().unwrap()).unwrap_err();
            assert!(format!("{err:#}").contains("iou_threshold"));
        }
    }
}
