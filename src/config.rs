use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackendKind {
    Tesseract,
    Ocrs,
}

impl FromStr for OcrBackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "tesseract" => Ok(OcrBackendKind::Tesseract),
            "ocrs" => Ok(OcrBackendKind::Ocrs),
            other => Err(format!("unknown OCR backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub web_root: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_bytes: 10 * 1024 * 1024,
            web_root: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub render_dpi: u32,
    pub ocr_backend: OcrBackendKind,
    pub ocr_language: String,
    pub tesseract_bin: String,
    pub pdftoppm_bin: String,
    pub ocrs_model_dir: Option<PathBuf>,
    pub max_concurrent_jobs: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            render_dpi: 200,
            ocr_backend: OcrBackendKind::Tesseract,
            ocr_language: "eng".to_string(),
            tesseract_bin: "tesseract".to_string(),
            pdftoppm_bin: "pdftoppm".to_string(),
            ocrs_model_dir: None,
            max_concurrent_jobs: 4,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub extraction: ExtractionConfig,
}

impl ServiceConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), String> {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| format!("failed to read config: {}", err))?;
                Self::from_toml(&contents)?
            }
            _ => ServiceConfig::default(),
        };

        config.apply_env_overrides();
        config.normalize();
        Ok((config, config_path))
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|err| format!("failed to parse config: {}", err))
    }

    pub fn write(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create config dir: {}", err))?;
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| format!("failed to serialize config: {}", err))?;
        std::fs::write(path, payload).map_err(|err| format!("failed to write config: {}", err))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(host) = non_empty_var("LENS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = parsed_var::<u16>("LENS_PORT") {
            self.server.port = port;
        }
        if let Some(limit) = parsed_var::<usize>("LENS_MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = limit;
        }
        if let Some(web_root) = non_empty_var("LENS_WEB_ROOT") {
            self.server.web_root = Some(web_root);
        }
        if let Some(dpi) = parsed_var::<u32>("LENS_RENDER_DPI") {
            self.extraction.render_dpi = dpi;
        }
        if let Some(backend) = non_empty_var("LENS_OCR_BACKEND") {
            match backend.parse::<OcrBackendKind>() {
                Ok(kind) => self.extraction.ocr_backend = kind,
                Err(err) => warn!(
                    %err,
                    fallback = ?self.extraction.ocr_backend,
                    "Ignoring LENS_OCR_BACKEND"
                ),
            }
        }
        if let Some(language) = non_empty_var("LENS_OCR_LANGUAGE") {
            self.extraction.ocr_language = language;
        }
        if let Some(binary) = non_empty_var("LENS_TESSERACT_BIN") {
            self.extraction.tesseract_bin = binary;
        }
        if let Some(binary) = non_empty_var("LENS_PDFTOPPM_BIN") {
            self.extraction.pdftoppm_bin = binary;
        }
        if let Some(dir) = non_empty_var("LENS_OCRS_MODEL_DIR") {
            self.extraction.ocrs_model_dir = Some(PathBuf::from(dir));
        }
        if let Some(jobs) = parsed_var::<usize>("LENS_MAX_CONCURRENT_JOBS") {
            self.extraction.max_concurrent_jobs = jobs;
        }
    }

    fn normalize(&mut self) {
        if self.extraction.render_dpi == 0 {
            self.extraction.render_dpi = ExtractionConfig::default().render_dpi;
        }
        self.extraction.max_concurrent_jobs = self.extraction.max_concurrent_jobs.max(1);
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    non_empty_var(name).and_then(|value| value.trim().parse::<T>().ok())
}

fn default_config_path() -> Option<PathBuf> {
    env::var("LENS_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/lens.toml")))
}
