use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Level names accepted in `level` and `modules`, matched case-insensitively.
pub const LEVEL_NAMES: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// The `[logging]` section. Every field has a default, so the section may be
/// left out entirely.
///
/// ```toml
/// [logging]
/// level = "info"
/// format = "json"
/// file = "logs/kvp.log"
/// [logging.modules]
/// kvp_runtime = "debug"   # ingest task, batch publication
/// kvp_core = "warn"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for every target without a `modules` entry.
    pub level: String,
    /// Per-target overrides keyed by crate path, e.g. `kvp_runtime` or
    /// `kvp_runtime::ingest_task`.
    pub modules: HashMap<String, String>,
    /// Log file, resolved against the config file's directory when relative.
    pub file: Option<PathBuf>,
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Reject level strings that are not one of [`LEVEL_NAMES`].
    ///
    /// `EnvFilter` would read an unknown word as a target name and silently
    /// fall back to its default level.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !is_level_name(&self.level) {
            anyhow::bail!(
                "logging.level: unknown level {:?} (expected one of {})",
                self.level,
                LEVEL_NAMES.join("/")
            );
        }
        for (module, level) in &self.modules {
            if module.trim().is_empty() {
                anyhow::bail!("logging.modules: empty module name");
            }
            if !is_level_name(level) {
                anyhow::bail!(
                    "logging.modules.{module}: unknown level {level:?} (expected one of {})",
                    LEVEL_NAMES.join("/")
                );
            }
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            modules: HashMap::new(),
            file: None,
            format: LogFormat::Plain,
        }
    }
}

fn is_level_name(level: &str) -> bool {
    let level = level.trim();
    LEVEL_NAMES.iter().any(|name| name.eq_ignore_ascii_case(level))
}

/// `plain` renders `[domain]`-prefixed text; `json` emits one object per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}
