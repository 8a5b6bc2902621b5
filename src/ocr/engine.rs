//! OCR Engines
//!
//! Defines the engine trait and the off-the-shelf backends that perform the
//! actual text detection and recognition.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::types::{EngineKind, OcrError};
use crate::config::OcrConfig;

/// OCR engine trait
///
/// Implementations return recognized text fragments in reading order, without
/// bounding boxes or confidence scores.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Get the engine type
    fn kind(&self) -> EngineKind;

    /// Check if the engine can serve requests
    async fn is_available(&self) -> bool;

    /// Recognize text in a prepared RGB image
    async fn read_text(&self, image: &RgbImage) -> Result<Vec<String>, OcrError>;
}

/// Build the process-wide engine from configuration
pub fn build_engine(config: &OcrConfig) -> Arc<dyn OcrEngine> {
    match config.engine {
        EngineKind::Tesseract => {
            if config.use_gpu {
                tracing::warn!("GPU acceleration requested, but the tesseract engine runs on CPU only");
            }
            Arc::new(TesseractEngine::new(&config.tesseract_path, &config.languages))
        }
        EngineKind::Ollama => Arc::new(OllamaEngine::new(
            &config.ollama_url,
            &config.ollama_model,
            &config.languages,
            config.use_gpu,
        )),
    }
}

/// Encode an RGB buffer as PNG for engines that take encoded images
fn encode_png(image: &RgbImage) -> Result<Vec<u8>, OcrError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| OcrError::Processing(format!("Failed to encode image: {}", e)))?;
    Ok(buffer)
}

/// Split engine output into trimmed, non-empty fragments
pub(crate) fn split_fragments(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tesseract OCR engine, driven through its command-line interface
pub struct TesseractEngine {
    binary: String,
    /// Language argument, e.g. "rus+eng"
    languages: String,
}

impl TesseractEngine {
    pub fn new(binary: &str, languages: &[String]) -> Self {
        Self {
            binary: binary.to_string(),
            languages: languages.join("+"),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Tesseract
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn read_text(&self, image: &RgbImage) -> Result<Vec<String>, OcrError> {
        let png = encode_png(image)?;

        let mut child = Command::new(&self.binary)
            .arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg("3")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OcrError::EngineUnavailable(format!("Failed to run tesseract: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::Processing("Tesseract stdin unavailable".to_string()))?;

        // Feed the image concurrently so a full stdout pipe cannot stall the child
        let writer = tokio::spawn(async move {
            stdin.write_all(&png).await?;
            stdin.shutdown().await
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| OcrError::Processing(format!("Failed to wait for tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Processing(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(OcrError::Processing(format!("Failed to write image to tesseract: {}", e)))
            }
            Err(e) => return Err(OcrError::Processing(format!("Tesseract writer task failed: {}", e))),
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(split_fragments(&text))
    }
}

/// Ollama vision model engine
pub struct OllamaEngine {
    /// Ollama API URL
    base_url: String,
    /// Model name (e.g., "llava", "bakllava")
    model: String,
    languages: Vec<String>,
    use_gpu: bool,
    client: reqwest::Client,
}

impl OllamaEngine {
    pub fn new(base_url: &str, model: &str, languages: &[String], use_gpu: bool) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            languages: languages.to_vec(),
            use_gpu,
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, image_base64: String) -> serde_json::Value {
        let lang_hint = if self.languages.is_empty() {
            String::new()
        } else {
            format!(" The text may be in: {}.", self.languages.join(", "))
        };

        let prompt = format!(
            "Extract all text from this image exactly as written.{} Return only the extracted text, one line per line of text, nothing else.",
            lang_hint
        );

        let mut request = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "images": [image_base64],
            "stream": false
        });

        if !self.use_gpu {
            request["options"] = serde_json::json!({ "num_gpu": 0 });
        }

        request
    }
}

#[async_trait]
impl OcrEngine for OllamaEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Ollama
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn read_text(&self, image: &RgbImage) -> Result<Vec<String>, OcrError> {
        use base64::Engine;

        let png = encode_png(image)?;
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(png);
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&self.build_request(image_base64))
            .send()
            .await
            .map_err(|e| OcrError::EngineUnavailable(format!("Failed to call Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Api(format!("Ollama returned {}: {}", status, body)));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OcrError::Api(format!("Failed to parse response: {}", e)))?;

        let text = result["response"].as_str().unwrap_or("");
        Ok(split_fragments(text))
    }
}
