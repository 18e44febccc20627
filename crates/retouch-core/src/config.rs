//! Configuration module
//!
//! Environment driven settings for the image service and the storage
//! collaborators. `image.defaultOptions` is kept as a [`Configuration`] tree so
//! that it can be merged with per-call output options.

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use crate::configuration::{ConfigValue, Configuration};
use crate::constants::{DEFAULT_IMAGE_QUALITY, DEFAULT_SIZE_CACHE_CAPACITY};

/// Image service configuration
#[derive(Clone, Debug)]
pub struct ImageConfig {
    /// `image.defaultOptions`, always containing `quality`
    pub default_options: Configuration,
    /// Directory for re-encoded temporary files
    pub temporary_directory: PathBuf,
    pub size_cache_capacity: usize,
    /// Apply the pipeline to animation frames on the rayon pool
    pub parallel_frames: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            default_options: Configuration::from_map(BTreeMap::from([(
                "quality".to_string(),
                ConfigValue::from(DEFAULT_IMAGE_QUALITY),
            )])),
            temporary_directory: env::temp_dir(),
            size_cache_capacity: DEFAULT_SIZE_CACHE_CAPACITY,
            parallel_frames: true,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub image: ImageConfig,
    pub storage_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ImageConfig::default();

        let mut default_options = match lookup("IMAGE_DEFAULT_OPTIONS") {
            Some(json) if !json.trim().is_empty() => Configuration::from_json_str(&json)
                .map_err(|e| anyhow::anyhow!("IMAGE_DEFAULT_OPTIONS is invalid: {}", e))?,
            _ => Configuration::new(),
        };

        if let Some(quality) = lookup("IMAGE_DEFAULT_QUALITY") {
            let quality: i64 = quality
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("IMAGE_DEFAULT_QUALITY must be an integer"))?;
            default_options
                .set("quality", quality)
                .map_err(|e| anyhow::anyhow!("{}", e))?;
        } else if default_options.get("quality").is_none() {
            default_options
                .set("quality", DEFAULT_IMAGE_QUALITY)
                .map_err(|e| anyhow::anyhow!("{}", e))?;
        }

        let image = ImageConfig {
            default_options,
            temporary_directory: lookup("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temporary_directory),
            size_cache_capacity: lookup("IMAGE_SIZE_CACHE_CAPACITY")
                .and_then(|s| s.parse().ok())
                .filter(|capacity: &usize| *capacity > 0)
                .unwrap_or(defaults.size_cache_capacity),
            parallel_frames: match lookup("PARALLEL_FRAMES") {
                Some(value) => parse_flag(&value).ok_or_else(|| {
                    anyhow::anyhow!(
                        "PARALLEL_FRAMES must be true or false, current value: {}",
                        value
                    )
                })?,
                None => defaults.parallel_frames,
            },
        };

        let config = Config {
            image,
            storage_path: lookup("STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data/resources")),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.image.default_options.get("quality") {
            Some(ConfigValue::Integer(q)) if (0..=100).contains(q) => Ok(()),
            Some(other) => Err(anyhow::anyhow!(
                "image.defaultOptions.quality allows only values between 0 and 100, current value: {}",
                other
            )),
            None => Ok(()),
        }
    }

    pub fn default_options(&self) -> &Configuration {
        &self.image.default_options
    }

    pub fn storage_path(&self) -> &PathBuf {
        &self.storage_path
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
