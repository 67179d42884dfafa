use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::batching::{BatchingConfig, SourceConfig};
use crate::logging::LoggingConfig;
use crate::validate;

// ---------------------------------------------------------------------------
// PrefetchConfig (resolved, validated)
// ---------------------------------------------------------------------------

/// Top-level `prefetch.toml` configuration. Every section may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrefetchConfig {
    pub batching: BatchingConfig,
    pub source: SourceConfig,
    pub logging: LoggingConfig,
}

impl PrefetchConfig {
    /// Read and parse a `prefetch.toml` file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.as_ref().display()))?;
        content.parse()
    }
}

impl FromStr for PrefetchConfig {
    type Err = anyhow::Error;

    /// Parse a TOML string into a validated [`PrefetchConfig`].
    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        let config: PrefetchConfig = toml::from_str(toml_str)?;
        validate::validate(&config)?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;
    use std::io::Write;
    use std::time::Duration;

    const FULL_TOML: &str = r#"
[batching]
max_batch_size = 1024
max_latency = "250ms"

[source]
channel_capacity = 512

[logging]
level = "warn"
format = "json"
file = "logs/kvp.log"

[logging.modules]
kvp_runtime = "debug"
"#;

    #[test]
    fn load_full_toml() {
        let cfg: PrefetchConfig = FULL_TOML.parse().unwrap();

        assert_eq!(cfg.batching.max_batch_size, 1024);
        assert_eq!(
            cfg.batching.max_latency.as_duration(),
            Duration::from_millis(250),
        );
        assert_eq!(cfg.source.channel_capacity, 512);
        assert_eq!(cfg.logging.level, "warn");
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(
            cfg.logging.file.as_deref(),
            Some(Path::new("logs/kvp.log"))
        );
        assert_eq!(cfg.logging.modules["kvp_runtime"], "debug");
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg: PrefetchConfig = "".parse().unwrap();
        assert_eq!(cfg.batching, BatchingConfig::default());
        assert_eq!(cfg.source, SourceConfig::default());
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, LogFormat::Plain);
    }

    #[test]
    fn partial_batching_section_keeps_other_default() {
        let cfg: PrefetchConfig = "[batching]\nmax_batch_size = 64\n".parse().unwrap();
        assert_eq!(cfg.batching.max_batch_size, 64);
        assert_eq!(
            cfg.batching.max_latency,
            BatchingConfig::default().max_latency
        );
    }

    #[test]
    fn reject_zero_batch_size() {
        let toml = FULL_TOML.replace("max_batch_size = 1024", "max_batch_size = 0");
        assert!(toml.parse::<PrefetchConfig>().is_err());
    }

    #[test]
    fn reject_zero_latency() {
        let toml = FULL_TOML.replace("\"250ms\"", "\"0s\"");
        let err = toml.parse::<PrefetchConfig>().unwrap_err();
        assert!(err.to_string().contains("max_latency"), "{err}");
    }

    #[test]
    fn reject_bad_latency_suffix() {
        let toml = FULL_TOML.replace("\"250ms\"", "\"250ns\"");
        assert!(toml.parse::<PrefetchConfig>().is_err());
    }

    #[test]
    fn reject_unknown_log_level() {
        let toml = FULL_TOML.replace("level = \"warn\"", "level = \"loud\"");
        assert!(toml.parse::<PrefetchConfig>().is_err());
        let toml = FULL_TOML.replace("kvp_runtime = \"debug\"", "kvp_runtime = \"chatty\"");
        assert!(toml.parse::<PrefetchConfig>().is_err());
    }

    #[test]
    fn reject_unknown_format() {
        let toml = FULL_TOML.replace("format = \"json\"", "format = \"xml\"");
        assert!(toml.parse::<PrefetchConfig>().is_err());
    }

    #[test]
    fn reject_unknown_section() {
        let toml = format!("{FULL_TOML}\n[server]\nlisten = \"tcp://127.0.0.1:9800\"\n");
        assert!(toml.parse::<PrefetchConfig>().is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL_TOML.as_bytes()).unwrap();
        let cfg = PrefetchConfig::load(file.path()).unwrap();
        assert_eq!(cfg.batching.max_batch_size, 1024);
    }

    #[test]
    fn load_missing_file_names_path() {
        let err = PrefetchConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"), "{err}");
    }
}
