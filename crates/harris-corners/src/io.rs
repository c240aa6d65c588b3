//! JSON configuration and report for a single detection run.

use std::fs;
use std::path::{Path, PathBuf};

use harris_corners_core::{
    ConfigError, CornerPoint, DetectTrace, HarrisDetector, HarrisParams, StageTiming,
};
use serde::{Deserialize, Serialize};

use crate::measure::distances_from_origin;

pub const DEFAULT_REPORT_PATH: &str = "harris_corners_report.json";

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Input of one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectConfig {
    pub image_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    /// Where to save the image with corner markers, if anywhere.
    #[serde(default)]
    pub marked_path: Option<String>,
    #[serde(default)]
    pub params: HarrisParams,
}

impl DetectConfig {
    pub fn new(image_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            output_path: None,
            marked_path: None,
            params: HarrisParams::default(),
        }
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Report path, falling back to [`DEFAULT_REPORT_PATH`].
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH))
    }

    pub fn build_detector(&self) -> Result<HarrisDetector, ConfigError> {
        HarrisDetector::new(self.params.clone())
    }
}

/// Output of one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectReport {
    pub image_path: String,
    pub width: usize,
    pub height: usize,
    pub params: HarrisParams,
    pub corners: Vec<CornerPoint>,
    /// Distance from `(0, 0)` to each entry of `corners`.
    pub distances_from_origin: Vec<f32>,
    #[serde(default)]
    pub timings_ms: Vec<StageTiming>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DetectReport {
    /// Empty report for `cfg`; fill it with [`Self::set_trace`] or
    /// [`Self::set_error`].
    pub fn new(cfg: &DetectConfig, width: usize, height: usize) -> Self {
        Self {
            image_path: cfg.image_path.clone(),
            width,
            height,
            params: cfg.params.clone(),
            corners: Vec::new(),
            distances_from_origin: Vec::new(),
            timings_ms: Vec::new(),
            error: None,
        }
    }

    pub fn set_corners(&mut self, corners: Vec<CornerPoint>) {
        self.distances_from_origin = distances_from_origin(&corners);
        self.corners = corners;
        self.error = None;
    }

    /// Record corners and stage timings from a traced run.
    pub fn set_trace(&mut self, trace: DetectTrace) {
        self.timings_ms = trace.timings;
        self.set_corners(trace.corners);
    }

    pub fn set_error(&mut self, err: impl std::fmt::Display) {
        self.error = Some(err.to_string());
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
