use serde::Deserialize;
use std::env;

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_TARGET_SIZE: u32 = 224;
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub service_name: String,
    pub max_content_length: usize,
    pub image: ImageSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImageSettings {
    /// Final `[width, height]` handed to the classifier.
    pub target_size: [u32; 2],
    /// Ceiling on the longer side before the final resize; `None` disables it.
    pub max_dimension: Option<u32>,
    pub allowed_extensions: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            service_name: "AI Craft Recognition Service".to_string(),
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            image: ImageSettings::default(),
        }
    }
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            target_size: [DEFAULT_TARGET_SIZE, DEFAULT_TARGET_SIZE],
            max_dimension: Some(DEFAULT_MAX_DIMENSION),
            allowed_extensions: ["png", "jpg", "jpeg", "gif", "webp"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl Settings {
    /// Defaults, then the YAML file named by `CRAFT_CONFIG`, then env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = match env::var("CRAFT_CONFIG") {
            Ok(path) => Self::from_yaml_file(&path)?,
            Err(_) => Self::default(),
        };
        settings.apply_overrides(|key| env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml_str(&config_str)
    }

    pub fn from_yaml_str(config_str: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_yaml::from_str(config_str)?;
        Ok(settings)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = parse_value("PORT", &port)?;
        }
        if let Some(name) = lookup("SERVICE_NAME") {
            self.service_name = name;
        }
        if let Some(limit) = lookup("MAX_CONTENT_LENGTH") {
            self.max_content_length = parse_value("MAX_CONTENT_LENGTH", &limit)?;
        }
        if let Some(size) = lookup("TARGET_SIZE") {
            self.image.target_size = parse_target_size(&size)?;
        }
        if let Some(max) = lookup("MAX_DIMENSION") {
            self.image.max_dimension = parse_max_dimension(&max)?;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Human-readable upload limit, e.g. `16MB`.
    pub fn max_content_label(&self) -> String {
        const MIB: usize = 1024 * 1024;
        if self.max_content_length >= MIB && self.max_content_length % MIB == 0 {
            format!("{}MB", self.max_content_length / MIB)
        } else {
            format!("{} bytes", self.max_content_length)
        }
    }
}

impl ImageSettings {
    pub fn is_allowed_filename(&self, filename: &str) -> bool {
        filename
            .rsplit_once('.')
            .map(|(_, ext)| {
                self.allowed_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_target_size(value: &str) -> Result<[u32; 2], ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: "TARGET_SIZE".to_string(),
        value: value.to_string(),
    };
    let (width, height): (u32, u32) = match value.trim().split_once(['x', 'X']) {
        Some((w, h)) => (parse_value("TARGET_SIZE", w)?, parse_value("TARGET_SIZE", h)?),
        None => {
            let side = parse_value("TARGET_SIZE", value)?;
            (side, side)
        }
    };
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok([width, height])
}

fn parse_max_dimension(value: &str) -> Result<Option<u32>, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "none" | "off" => Ok(None),
        other => parse_value("MAX_DIMENSION", other).map(Some),
    }
}
