use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Config, OcrEngine, StrategyKind};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub ocr: Option<OcrConfig>,
    pub pdf: Option<PdfConfig>,
    pub hosted: Option<HostedConfig>,
    pub api_keys: Option<ApiKeysConfig>,
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrConfig {
    pub engine: Option<String>,
    pub language: Option<String>,
    pub tesseract_cmd: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfConfig {
    pub strategies: Option<Vec<String>>,
    pub render_scale: Option<f32>,
    pub pdftoppm_cmd: Option<String>,
    pub pdfinfo_cmd: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostedConfig {
    pub gemini_model: Option<String>,
    pub mistral_model: Option<String>,
    pub gemini_base_url: Option<String>,
    pub mistral_base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeysConfig {
    pub gemini_key: Option<String>,
    pub mistral_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_mb: Option<u32>,
}

/// Platform config directory path: `<config_dir>/scribe/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scribe").join("config.toml"))
}

/// Load config by cascading CWD `.scribe.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".scribe.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

fn pick<S, T>(overlay: &Option<S>, base: &Option<S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&field)
        .or_else(|| base.as_ref().and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        ocr: Some(OcrConfig {
            engine: pick(&overlay.ocr, &base.ocr, |o| o.engine.clone()),
            language: pick(&overlay.ocr, &base.ocr, |o| o.language.clone()),
            tesseract_cmd: pick(&overlay.ocr, &base.ocr, |o| o.tesseract_cmd.clone()),
        }),
        pdf: Some(PdfConfig {
            strategies: pick(&overlay.pdf, &base.pdf, |p| p.strategies.clone()),
            render_scale: pick(&overlay.pdf, &base.pdf, |p| p.render_scale),
            pdftoppm_cmd: pick(&overlay.pdf, &base.pdf, |p| p.pdftoppm_cmd.clone()),
            pdfinfo_cmd: pick(&overlay.pdf, &base.pdf, |p| p.pdfinfo_cmd.clone()),
        }),
        hosted: Some(HostedConfig {
            gemini_model: pick(&overlay.hosted, &base.hosted, |h| h.gemini_model.clone()),
            mistral_model: pick(&overlay.hosted, &base.hosted, |h| h.mistral_model.clone()),
            gemini_base_url: pick(&overlay.hosted, &base.hosted, |h| h.gemini_base_url.clone()),
            mistral_base_url: pick(&overlay.hosted, &base.hosted, |h| h.mistral_base_url.clone()),
            timeout_secs: pick(&overlay.hosted, &base.hosted, |h| h.timeout_secs),
        }),
        api_keys: Some(ApiKeysConfig {
            gemini_key: pick(&overlay.api_keys, &base.api_keys, |a| a.gemini_key.clone()),
            mistral_key: pick(&overlay.api_keys, &base.api_keys, |a| a.mistral_key.clone()),
        }),
        server: Some(ServerConfig {
            host: pick(&overlay.server, &base.server, |s| s.host.clone()),
            port: pick(&overlay.server, &base.server, |s| s.port),
            max_upload_mb: pick(&overlay.server, &base.server, |s| s.max_upload_mb),
        }),
    }
}

impl ConfigFile {
    /// Snapshot of the non-secret settings of `config`. API keys are left
    /// out so they never get written to disk by accident.
    pub fn from_config(config: &Config) -> Self {
        ConfigFile {
            ocr: Some(OcrConfig {
                engine: Some(config.ocr_engine.id().to_string()),
                language: Some(config.ocr_language.clone()),
                tesseract_cmd: Some(config.tesseract_cmd.clone()),
            }),
            pdf: Some(PdfConfig {
                strategies: Some(
                    config
                        .strategy_order
                        .iter()
                        .map(|k| k.id().to_string())
                        .collect(),
                ),
                render_scale: Some(config.render_scale),
                pdftoppm_cmd: Some(config.pdftoppm_cmd.clone()),
                pdfinfo_cmd: Some(config.pdfinfo_cmd.clone()),
            }),
            hosted: Some(HostedConfig {
                gemini_model: Some(config.gemini_model.clone()),
                mistral_model: Some(config.mistral_model.clone()),
                gemini_base_url: config.gemini_base_url.clone(),
                mistral_base_url: config.mistral_base_url.clone(),
                timeout_secs: Some(config.hosted_timeout_secs),
            }),
            api_keys: None,
            server: None,
        }
    }
}

/// Save the config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(config)?)?;
    Ok(path)
}

fn parse_engine(value: &str) -> Result<OcrEngine, ConfigError> {
    value.parse().map_err(|message| ConfigError::Invalid {
        key: "ocr.engine",
        message,
    })
}

fn parse_order(values: &[String]) -> Result<Vec<StrategyKind>, ConfigError> {
    let mut order = Vec::with_capacity(values.len());
    for value in values {
        let kind: StrategyKind = value.parse().map_err(|message| ConfigError::Invalid {
            key: "pdf.strategies",
            message,
        })?;
        if !order.contains(&kind) {
            order.push(kind);
        }
    }
    if order.is_empty() {
        return Err(ConfigError::Invalid {
            key: "pdf.strategies",
            message: "at least one strategy is required".into(),
        });
    }
    Ok(order)
}

/// Parse a comma-separated strategy list (`native-ocr,text-layer`).
pub fn parse_strategy_list(value: &str) -> Result<Vec<StrategyKind>, ConfigError> {
    let values: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    parse_order(&values)
}

/// Accept render scales in `0.5..=8.0`.
pub fn check_scale(scale: f32) -> Result<f32, ConfigError> {
    if scale.is_finite() && (0.5..=8.0).contains(&scale) {
        Ok(scale)
    } else {
        Err(ConfigError::Invalid {
            key: "pdf.render_scale",
            message: format!("{scale} is outside 0.5..=8.0"),
        })
    }
}

/// Hosted request timeouts must be at least one second.
pub fn check_timeout(secs: u64) -> Result<u64, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key: "hosted.timeout_secs",
            message: "must be at least 1".into(),
        });
    }
    Ok(secs)
}

impl Config {
    /// Overlay the values present in `file` onto `self`.
    pub fn apply_file(mut self, file: &ConfigFile) -> Result<Self, ConfigError> {
        if let Some(ocr) = &file.ocr {
            if let Some(engine) = &ocr.engine {
                self.ocr_engine = parse_engine(engine)?;
            }
            if let Some(language) = &ocr.language {
                self.ocr_language = language.clone();
            }
            if let Some(cmd) = &ocr.tesseract_cmd {
                self.tesseract_cmd = cmd.clone();
            }
        }
        if let Some(pdf) = &file.pdf {
            if let Some(strategies) = &pdf.strategies {
                self.strategy_order = parse_order(strategies)?;
            }
            if let Some(scale) = pdf.render_scale {
                self.render_scale = check_scale(scale)?;
            }
            if let Some(cmd) = &pdf.pdftoppm_cmd {
                self.pdftoppm_cmd = cmd.clone();
            }
            if let Some(cmd) = &pdf.pdfinfo_cmd {
                self.pdfinfo_cmd = cmd.clone();
            }
        }
        if let Some(hosted) = &file.hosted {
            if let Some(model) = &hosted.gemini_model {
                self.gemini_model = model.clone();
            }
            if let Some(model) = &hosted.mistral_model {
                self.mistral_model = model.clone();
            }
            if hosted.gemini_base_url.is_some() {
                self.gemini_base_url = hosted.gemini_base_url.clone();
            }
            if hosted.mistral_base_url.is_some() {
                self.mistral_base_url = hosted.mistral_base_url.clone();
            }
            if let Some(secs) = hosted.timeout_secs {
                self.hosted_timeout_secs = check_timeout(secs)?;
            }
        }
        if let Some(keys) = &file.api_keys {
            if keys.gemini_key.is_some() {
                self.gemini_key = keys.gemini_key.clone();
            }
            if keys.mistral_key.is_some() {
                self.mistral_key = keys.mistral_key.clone();
            }
        }
        Ok(self)
    }

    /// Overlay environment variables, read through `lookup`.
    ///
    /// Recognized: `SCRIBE_OCR_ENGINE`, `SCRIBE_OCR_LANG`, `SCRIBE_STRATEGIES`,
    /// `SCRIBE_RENDER_SCALE`, `GEMINI_API_KEY`, `MISTRAL_API_KEY`.
    pub fn apply_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(engine) = get("SCRIBE_OCR_ENGINE") {
            self.ocr_engine = parse_engine(&engine)?;
        }
        if let Some(language) = get("SCRIBE_OCR_LANG") {
            self.ocr_language = language;
        }
        if let Some(list) = get("SCRIBE_STRATEGIES") {
            self.strategy_order = parse_strategy_list(&list)?;
        }
        if let Some(scale) = get("SCRIBE_RENDER_SCALE") {
            let parsed = scale.parse::<f32>().map_err(|e| ConfigError::Invalid {
                key: "SCRIBE_RENDER_SCALE",
                message: e.to_string(),
            })?;
            self.render_scale = check_scale(parsed)?;
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.gemini_key = Some(key);
        }
        if let Some(key) = get("MISTRAL_API_KEY") {
            self.mistral_key = Some(key);
        }
        Ok(self)
    }

    /// Defaults, then the cascaded config files, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Config::default()
            .apply_file(&load_config())?
            .apply_env(|key| std::env::var(key).ok())
    }
}
