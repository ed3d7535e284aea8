//! Configuration options shared by all attention backends.
//!
//! The [`Config`] struct captures run-time knobs that callers can tune without
//! swapping implementations: which kernel backs the adapter, whether the
//! kernel runs at wrap time or on first invocation, and the working precision
//! of the reference path.

use std::{fmt, fs, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use super::AttentionError;

/// Environment variable overriding [`Config::backend`].
pub const ENV_BACKEND: &str = "WINDOWED_ATTENTION_BACKEND";
/// Environment variable overriding [`Config::evaluation`].
pub const ENV_EVALUATION: &str = "WINDOWED_ATTENTION_EVALUATION";
/// Environment variable overriding [`Config::precision`].
pub const ENV_PRECISION: &str = "WINDOWED_ATTENTION_PRECISION";

/// Which kernel the adapter binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendSelection {
    /// Fused kernel on CUDA devices when compiled in, reference elsewhere.
    #[default]
    Auto,
    /// Always use the portable reference kernel.
    ReferenceOnly,
    /// Require the fused flash-attention kernel.
    FusedOnly,
}

/// When the kernel runs relative to [`wrap`](crate::AttentionAdapter::wrap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evaluation {
    /// Run the kernel inside `wrap` and capture its output.
    #[default]
    Eager,
    /// Bind the arguments in `wrap` and run the kernel on first invocation.
    Lazy,
}

/// Working precision for the reference kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionPolicy {
    /// Compute in the dtype of the inputs.
    #[default]
    Inherit,
    /// Upcast to `f32`, compute, and cast the output back.
    #[serde(rename = "f32")]
    ForceF32,
}

/// Configuration driving adapter behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendSelection,
    pub evaluation: Evaluation,
    pub precision: PrecisionPolicy,
}

impl Config {
    /// Load a configuration file. `.json` files are parsed as JSON, `.toml`
    /// files (or files without an extension) as TOML. Environment overrides
    /// are applied on top of the file contents.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AttentionError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let mut config: Config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            Some("toml") | Some("tml") | None => toml::from_str(&contents)?,
            Some(other) => return Err(AttentionError::ConfigFormat(other.to_string())),
        };
        config.apply_env_overrides();
        log::debug!("loaded attention config from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Replace fields with values from the `WINDOWED_ATTENTION_*` environment
    /// variables. Values that fail to parse are logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        override_from_env(ENV_BACKEND, &mut self.backend);
        override_from_env(ENV_EVALUATION, &mut self.evaluation);
        override_from_env(ENV_PRECISION, &mut self.precision);
    }
}

fn override_from_env<T>(key: &str, slot: &mut T)
where
    T: FromStr<Err = AttentionError>,
{
    let Ok(raw) = std::env::var(key) else {
        return;
    };
    match raw.parse() {
        Ok(value) => *slot = value,
        Err(err) => log::warn!("ignoring {key}={raw:?}: {err}"),
    }
}

impl FromStr for BackendSelection {
    type Err = AttentionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "reference" | "reference_only" => Ok(Self::ReferenceOnly),
            "fused" | "fused_only" => Ok(Self::FusedOnly),
            other => Err(AttentionError::InvalidConfig(format!(
                "unknown backend '{other}' (expected auto, reference or fused)"
            ))),
        }
    }
}

impl FromStr for Evaluation {
    type Err = AttentionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eager" => Ok(Self::Eager),
            "lazy" => Ok(Self::Lazy),
            other => Err(AttentionError::InvalidConfig(format!(
                "unknown evaluation mode '{other}' (expected eager or lazy)"
            ))),
        }
    }
}

impl FromStr for PrecisionPolicy {
    type Err = AttentionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inherit" => Ok(Self::Inherit),
            "f32" | "force_f32" => Ok(Self::ForceF32),
            other => Err(AttentionError::InvalidConfig(format!(
                "unknown precision policy '{other}' (expected inherit or f32)"
            ))),
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Eager => f.write_str("eager"),
            Evaluation::Lazy => f.write_str("lazy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_eager_auto_inherit() {
        let config = Config::default();
        assert_eq!(config.backend, BackendSelection::Auto);
        assert_eq!(config.evaluation, Evaluation::Eager);
        assert_eq!(config.precision, PrecisionPolicy::Inherit);
    }

    #[test]
    fn parses_enum_aliases() {
        assert_eq!(
            "Reference".parse::<BackendSelection>().unwrap(),
            BackendSelection::ReferenceOnly
        );
        assert_eq!(
            "fused_only".parse::<BackendSelection>().unwrap(),
            BackendSelection::FusedOnly
        );
        assert_eq!(" LAZY ".parse::<Evaluation>().unwrap(), Evaluation::Lazy);
        assert_eq!(
            "f32".parse::<PrecisionPolicy>().unwrap(),
            PrecisionPolicy::ForceF32
        );
        assert!(matches!(
            "tpu".parse::<BackendSelection>(),
            Err(AttentionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn toml_partial_file_keeps_defaults() {
        let config: Config = toml::from_str("evaluation = \"lazy\"\n").unwrap();
        assert_eq!(config.evaluation, Evaluation::Lazy);
        assert_eq!(config.backend, BackendSelection::Auto);
        assert_eq!(config.precision, PrecisionPolicy::Inherit);
    }

    #[test]
    fn rejects_unknown_extension() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "evaluation: lazy").unwrap();
        let err = Config::from_path(file.path()).unwrap_err();
        assert!(matches!(err, AttentionError::ConfigFormat(ext) if ext == "yaml"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_path(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, AttentionError::Io(_)));
    }
}
