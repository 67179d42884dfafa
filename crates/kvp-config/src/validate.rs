use crate::prefetch::PrefetchConfig;

/// Internal validation, called automatically during `PrefetchConfig::from_str` / `load`.
pub(crate) fn validate(config: &PrefetchConfig) -> anyhow::Result<()> {
    config.batching.validate()?;

    if config.source.channel_capacity == 0 {
        anyhow::bail!("source.channel_capacity must be > 0");
    }

    config.logging.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::batching::{BatchingConfig, SourceConfig};
    use crate::logging::LoggingConfig;

    fn valid_config() -> PrefetchConfig {
        PrefetchConfig {
            batching: BatchingConfig::new(8, Duration::from_millis(100)),
            source: SourceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn accept_valid() {
        validate(&valid_config()).unwrap();
    }

    #[test]
    fn reject_zero_capacity() {
        let mut cfg = valid_config();
        cfg.source.channel_capacity = 0;
        let err = validate(&cfg).unwrap_err();
        assert!(err.to_string().contains("channel_capacity"), "{err}");
    }

    #[test]
    fn reject_empty_module_level() {
        let mut cfg = valid_config();
        cfg.logging
            .modules
            .insert("kvp_runtime".into(), " ".into());
        let err = validate(&cfg).unwrap_err();
        assert!(err.to_string().contains("kvp_runtime"), "{err}");
    }

    #[test]
    fn reject_unknown_level() {
        let mut cfg = valid_config();
        cfg.logging.level = "loud".into();
        let err = validate(&cfg).unwrap_err();
        assert!(err.to_string().contains("logging.level"), "{err}");
    }
}
