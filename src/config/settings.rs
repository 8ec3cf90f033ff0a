use std::path::PathBuf;

use crate::config::env::{self, EnvKey};
use crate::vision::types::DetectionMode;

pub const SERVICE_TITLE: &str = "Capture Aerospace Backend";

const DEFAULT_LABELS: &str = "1,2,3,4,5";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: String,
    pub log_level: String,
    pub media_root: PathBuf,
    pub model_path: PathBuf,
    pub model_labels: Vec<String>,
    pub model_input_size: i32,
    pub score_filter: f32,
    pub detection_mode: DetectionMode,
    pub output_fps: Option<f64>,
    pub output_fourcc: String,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            database_url: env::get(EnvKey::DatabaseUrl)?,
            log_level: env::get_or(EnvKey::LogLevel, "debug"),
            media_root: PathBuf::from(env::get_or(EnvKey::MediaRoot, "media")),
            model_path: PathBuf::from(env::get_or(EnvKey::ModelPath, "data/model.onnx")),
            model_labels: parse_labels(&env::get_or(EnvKey::ModelLabels, DEFAULT_LABELS)),
            model_input_size: env::get_parsed(EnvKey::ModelInputSize, 640),
            score_filter: env::get_parsed(EnvKey::ScoreFilter, 0.6),
            detection_mode: env::get_parsed(EnvKey::DetectionMode, DetectionMode::Track),
            output_fps: env::get_optional::<f64>(EnvKey::OutputFps).filter(|fps| *fps > 0.0),
            output_fourcc: env::get_or(EnvKey::OutputFourcc, "mp4v"),
            max_upload_bytes: env::get_parsed(EnvKey::MaxUploadBytes, DEFAULT_MAX_UPLOAD_BYTES),
        })
    }
}

/// Comma separated class names, in model output order. Blank entries are dropped.
pub fn parse_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_trimmed_and_blanks_dropped() {
        assert_eq!(parse_labels(" tick, gate ,,"), vec!["tick", "gate"]);
        assert_eq!(parse_labels(DEFAULT_LABELS).len(), 5);
        assert!(parse_labels("").is_empty());
    }
}
