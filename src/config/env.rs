use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    DatabaseUrl,
    LogLevel,
    MediaRoot,
    ModelPath,
    ModelLabels,
    ModelInputSize,
    ScoreFilter,
    DetectionMode,
    OutputFps,
    OutputFourcc,
    MaxUploadBytes,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::LogLevel => "LOG_LEVEL",
            EnvKey::MediaRoot => "MEDIA_ROOT",
            EnvKey::ModelPath => "MODEL_PATH",
            EnvKey::ModelLabels => "MODEL_LABELS",
            EnvKey::ModelInputSize => "MODEL_INPUT_SIZE",
            EnvKey::ScoreFilter => "SCORE_FILTER",
            EnvKey::DetectionMode => "DETECTION_MODE",
            EnvKey::OutputFps => "OUTPUT_FPS",
            EnvKey::OutputFourcc => "OUTPUT_FOURCC",
            EnvKey::MaxUploadBytes => "MAX_UPLOAD_BYTES",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Like `get_parsed`, but an unset or unparsable value yields `None`.
pub fn get_optional<T: FromStr>(key: EnvKey) -> Option<T> {
    get(key).ok().and_then(|val| val.parse::<T>().ok())
}
