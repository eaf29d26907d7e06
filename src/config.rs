//! Pipeline configuration.
//!
//! Loaded from a TOML file (`gallery-ingest.toml` by default). Every key is
//! optional; a missing file means stock defaults. Asset-host credentials are
//! usually supplied through the environment instead of the file.
//!
//! ## Configuration Options
//!
//! ```toml
//! [validation]
//! max_file_bytes = 5242880            # 5 MiB, checked before any work
//! allowed_types = ["jpeg", "jpg", "png", "webp"]
//!
//! [compression]
//! max_size_bytes = 524288             # 0.5 MiB target per image
//! max_dimension_px = 1920             # longer edge
//! initial_quality = 90                # JPEG quality ladder start
//! min_quality = 40                    # JPEG quality ladder floor
//!
//! [upload]
//! endpoint = "https://api.cloudinary.com/v1_1"
//! cloud_name = ""                     # or CLOUDINARY_CLOUD_NAME
//! upload_preset = ""                  # or CLOUDINARY_UPLOAD_PRESET
//! timeout_secs = 60
//!
//! [processing]
//! max_processes = 4                   # omit for auto = CPU cores
//!
//! [gallery]
//! placeholder_image = "/placeholder.jpg"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::MediaType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "gallery-ingest.toml";

/// Environment variable overriding `upload.cloud_name`.
pub const ENV_CLOUD_NAME: &str = "CLOUDINARY_CLOUD_NAME";
/// Environment variable overriding `upload.upload_preset`.
pub const ENV_UPLOAD_PRESET: &str = "CLOUDINARY_UPLOAD_PRESET";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Pre-flight file policy.
    pub validation: ValidationConfig,
    /// Size and dimension budget for compressed images.
    pub compression: CompressionConfig,
    /// Remote asset host settings.
    pub upload: UploadConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Gallery presentation settings.
    pub gallery: GalleryConfig,
}

impl IngestConfig {
    /// Validate config values are within acceptable ranges.
    ///
    /// Upload credentials are not checked here: `check` and `remove` never
    /// talk to the host, so they may run without them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validation.max_file_bytes == 0 {
            return Err(ConfigError::Validation(
                "validation.max_file_bytes must be non-zero".into(),
            ));
        }
        if self.validation.allowed_types.is_empty() {
            return Err(ConfigError::Validation(
                "validation.allowed_types must not be empty".into(),
            ));
        }
        if let Some(unknown) = self
            .validation
            .allowed_types
            .iter()
            .find(|t| MediaType::from_extension(t).is_none())
        {
            return Err(ConfigError::Validation(format!(
                "validation.allowed_types: unsupported type '{unknown}'"
            )));
        }
        if self.compression.max_size_bytes == 0 {
            return Err(ConfigError::Validation(
                "compression.max_size_bytes must be non-zero".into(),
            ));
        }
        if self.compression.max_dimension_px == 0 {
            return Err(ConfigError::Validation(
                "compression.max_dimension_px must be non-zero".into(),
            ));
        }
        let (initial, min) = (
            self.compression.initial_quality,
            self.compression.min_quality,
        );
        if !(1..=100).contains(&initial) || !(1..=100).contains(&min) {
            return Err(ConfigError::Validation(
                "compression quality values must be 1-100".into(),
            ));
        }
        if min > initial {
            return Err(ConfigError::Validation(
                "compression.min_quality must not exceed initial_quality".into(),
            ));
        }
        if self.upload.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "upload.timeout_secs must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Overlay credentials from the environment. Empty values are ignored.
    ///
    /// Takes a lookup function so tests don't have to mutate the process
    /// environment.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(cloud) = non_empty(ENV_CLOUD_NAME) {
            self.upload.cloud_name = cloud;
        }
        if let Some(preset) = non_empty(ENV_UPLOAD_PRESET) {
            self.upload.upload_preset = preset;
        }
    }
}

/// Pre-flight file policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Files whose declared size exceeds this are rejected as too large.
    pub max_file_bytes: u64,
    /// Accepted file extensions (lowercase, without the dot).
    pub allowed_types: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 5 * 1024 * 1024,
            allowed_types: ["jpeg", "jpg", "png", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Compression budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    /// Target upper bound for the encoded file.
    pub max_size_bytes: u64,
    /// Target upper bound for the longer edge, in pixels.
    pub max_dimension_px: u32,
    /// First JPEG quality tried.
    pub initial_quality: u8,
    /// Lowest JPEG quality tried before shrinking dimensions.
    pub min_quality: u8,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 512 * 1024,
            max_dimension_px: 1920,
            initial_quality: 90,
            min_quality: 40,
        }
    }
}

/// Remote asset host settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// API base; the cloud name and `/image/upload` are appended.
    pub endpoint: String,
    /// Account identifier on the asset host.
    pub cloud_name: String,
    /// Unsigned upload preset token.
    pub upload_preset: String,
    /// Per-request timeout. Timeouts surface as network failures.
    pub timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.cloudinary.com/v1_1".to_string(),
            cloud_name: String::new(),
            upload_preset: String::new(),
            timeout_secs: 60,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of files in flight at once. One limit covers both
    /// stages: a worker compresses a file and then uploads it, so a
    /// single-core host uploads one file at a time.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, never less than one
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Gallery presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Shown wherever a product with an empty gallery needs a primary image.
    pub placeholder_image: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            placeholder_image: "/placeholder.jpg".to_string(),
        }
    }
}

/// Parse config from TOML text and validate it (no env overrides).
pub fn parse_config(content: &str) -> Result<IngestConfig, ConfigError> {
    let config: IngestConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to defaults when the file is absent,
/// then apply environment overrides and validate.
pub fn load_config(path: &Path) -> Result<IngestConfig, ConfigError> {
    let mut config = if path.exists() {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)?
    } else {
        IngestConfig::default()
    };
    config.apply_env_overrides(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# gallery-ingest configuration
# ===========================
# All options are optional. Values shown are the defaults.

# ---------------------------------------------------------------------------
# Pre-flight policy: checked for every file before any work starts.
# A rejected file never affects the rest of the batch.
# ---------------------------------------------------------------------------
[validation]
# Largest accepted upload, in bytes (5 MiB).
max_file_bytes = 5242880
# Accepted extensions. Files without a known extension fall back to their
# declared MIME type.
allowed_types = ["jpeg", "jpg", "png", "webp"]

# ---------------------------------------------------------------------------
# Compression budget. When an image can't be compressed (corrupt data,
# unsupported encoding) the original is uploaded unchanged.
# ---------------------------------------------------------------------------
[compression]
# Target size of the uploaded file, in bytes (0.5 MiB).
max_size_bytes = 524288
# Longer edge, in pixels. Images are never upscaled.
max_dimension_px = 1920
# JPEG quality ladder: start here, step down by 10 ...
initial_quality = 90
# ... but never below this before shrinking dimensions instead.
min_quality = 40

# ---------------------------------------------------------------------------
# Remote asset host (Cloudinary-style unsigned upload).
# Credentials may instead come from CLOUDINARY_CLOUD_NAME and
# CLOUDINARY_UPLOAD_PRESET; the environment wins over this file.
# ---------------------------------------------------------------------------
[upload]
endpoint = "https://api.cloudinary.com/v1_1"
cloud_name = ""
upload_preset = ""
# Per-request timeout in seconds.
timeout_secs = 60

# ---------------------------------------------------------------------------
# Parallel processing.
# ---------------------------------------------------------------------------
[processing]
# Maximum files in flight at once (each is compressed, then uploaded, by
# the same worker). Omit for one per CPU core; larger values are clamped.
# max_processes = 4

# ---------------------------------------------------------------------------
# Gallery presentation.
# ---------------------------------------------------------------------------
[gallery]
# Primary image used for products with no photos.
placeholder_image = "/placeholder.jpg"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn default_policy_values() {
        let config = IngestConfig::default();
        assert_eq!(config.validation.max_file_bytes, 5 * 1024 * 1024);
        assert_eq!(
            config.validation.allowed_types,
            vec!["jpeg", "jpg", "png", "webp"]
        );
        assert_eq!(config.compression.max_size_bytes, 524_288);
        assert_eq!(config.compression.max_dimension_px, 1920);
        assert_eq!(config.gallery.placeholder_image, "/placeholder.jpg");
        assert!(config.processing.max_processes.is_none());
    }

    #[test]
    fn default_config_passes_validation() {
        assert!(IngestConfig::default().validate().is_ok());
    }

    #[test]
    fn parse_partial_config_keeps_other_defaults() {
        let config = parse_config(
            r#"
            [compression]
            max_dimension_px = 1200
            "#,
        )
        .unwrap();

        assert_eq!(config.compression.max_dimension_px, 1200);
        assert_eq!(config.compression.max_size_bytes, 524_288);
        assert_eq!(config.validation, ValidationConfig::default());
    }

    #[test]
    fn unknown_key_rejected() {
        let result = parse_config(
            r#"
            [validation]
            max_size = 10
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_section_rejected() {
        let result = parse_config("[thumbnails]\naspect_ratio = [4, 5]\n");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn validate_rejects_unknown_allowed_type() {
        let result = parse_config("[validation]\nallowed_types = [\"png\", \"gif\"]\n");
        match result {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("gif")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_empty_allowed_types() {
        let result = parse_config("[validation]\nallowed_types = []\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_zero_limits() {
        for toml in [
            "[validation]\nmax_file_bytes = 0\n",
            "[compression]\nmax_size_bytes = 0\n",
            "[compression]\nmax_dimension_px = 0\n",
            "[upload]\ntimeout_secs = 0\n",
        ] {
            assert!(
                matches!(parse_config(toml), Err(ConfigError::Validation(_))),
                "expected rejection for {toml:?}"
            );
        }
    }

    #[test]
    fn validate_quality_ordering() {
        let result = parse_config("[compression]\ninitial_quality = 50\nmin_quality = 60\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));

        let result = parse_config("[compression]\ninitial_quality = 101\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));

        let ok = parse_config("[compression]\ninitial_quality = 60\nmin_quality = 60\n");
        assert!(ok.is_ok());
    }

    #[test]
    fn env_overrides_credentials() {
        let env: HashMap<&str, &str> = [
            (ENV_CLOUD_NAME, "shop-cloud"),
            (ENV_UPLOAD_PRESET, "unsigned-products"),
        ]
        .into_iter()
        .collect();

        let mut config = IngestConfig::default();
        config.upload.cloud_name = "from-file".into();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.upload.cloud_name, "shop-cloud");
        assert_eq!(config.upload.upload_preset, "unsigned-products");
    }

    #[test]
    fn env_overrides_ignore_blank_values() {
        let mut config = IngestConfig::default();
        config.upload.upload_preset = "from-file".into();
        config.apply_env_overrides(|key| (key == ENV_UPLOAD_PRESET).then(|| "  ".to_string()));
        assert_eq!(config.upload.upload_preset, "from-file");
    }

    #[test]
    fn load_config_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.validation, ValidationConfig::default());
        assert_eq!(config.compression, CompressionConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(
            &path,
            "[processing]\nmax_processes = 2\n[gallery]\nplaceholder_image = \"/img/none.png\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.processing.max_processes, Some(2));
        assert_eq!(config.gallery.placeholder_image, "/img/none.png");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[validation\nmax_file_bytes = ").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let parsed: IngestConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(parsed, IngestConfig::default());
    }

    #[test]
    fn effective_threads_auto_uses_all_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(cores + 64),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_never_zero() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }
}
