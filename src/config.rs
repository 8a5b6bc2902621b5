//! Configuration management for the Text Scanner server

use std::env;

use crate::ocr::EngineKind;

/// Default largest-dimension threshold below which images are upscaled
pub const DEFAULT_UPSCALE_THRESHOLD: u32 = 1024;

/// Default upscale factor for small images
pub const DEFAULT_UPSCALE_FACTOR: u32 = 2;

/// Default request body limit: 20MB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub engine: EngineKind,
    /// Tesseract language codes, in priority order
    pub languages: Vec<String>,
    /// Hardware acceleration, fixed for the lifetime of the process
    pub use_gpu: bool,
    pub tesseract_path: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub upscale_threshold: u32,
    pub upscale_factor: u32,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub max_upload_bytes: usize,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            ocr: OcrConfig {
                engine: EngineKind::Tesseract,
                languages: vec!["rus".to_string(), "eng".to_string()],
                use_gpu: false,
                tesseract_path: "tesseract".to_string(),
                ollama_url: "http://localhost:11434".to_string(),
                ollama_model: "llava".to_string(),
                upscale_threshold: DEFAULT_UPSCALE_THRESHOLD,
                upscale_factor: DEFAULT_UPSCALE_FACTOR,
            },
            limits: LimitsConfig {
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, falling back to defaults
    /// for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let engine = match lookup("OCR_ENGINE") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "OCR_ENGINE", value })?,
            None => defaults.ocr.engine,
        };

        let languages = match lookup("OCR_LANGUAGES") {
            Some(value) => {
                let languages = parse_languages(&value);
                if languages.is_empty() {
                    return Err(ConfigError::Empty("OCR_LANGUAGES"));
                }
                languages
            }
            None => defaults.ocr.languages,
        };

        let upscale_factor: u32 = parse_or(&lookup, "OCR_UPSCALE_FACTOR", defaults.ocr.upscale_factor)?;
        if upscale_factor == 0 {
            return Err(ConfigError::InvalidValue {
                key: "OCR_UPSCALE_FACTOR",
                value: "0".to_string(),
            });
        }

        Ok(Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_or(&lookup, "SERVER_PORT", defaults.server.port)?,
            },
            ocr: OcrConfig {
                engine,
                languages,
                use_gpu: match lookup("OCR_USE_GPU") {
                    Some(value) => parse_bool(&value)
                        .ok_or(ConfigError::InvalidValue { key: "OCR_USE_GPU", value })?,
                    None => defaults.ocr.use_gpu,
                },
                tesseract_path: lookup("TESSERACT_PATH").unwrap_or(defaults.ocr.tesseract_path),
                ollama_url: lookup("OLLAMA_URL").unwrap_or(defaults.ocr.ollama_url),
                ollama_model: lookup("OLLAMA_MODEL").unwrap_or(defaults.ocr.ollama_model),
                upscale_threshold: parse_or(
                    &lookup,
                    "OCR_UPSCALE_THRESHOLD",
                    defaults.ocr.upscale_threshold,
                )?,
                upscale_factor,
            },
            limits: LimitsConfig {
                max_upload_bytes: parse_or(
                    &lookup,
                    "MAX_UPLOAD_BYTES",
                    defaults.limits.max_upload_bytes,
                )?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_languages(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c == '+')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
