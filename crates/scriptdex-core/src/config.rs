use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, ScriptdexError};
use crate::llm::parse_env_bool;

pub const CONFIG_FILE_NAME: &str = "scriptdex.toml";
pub const SNAPSHOT_FILE_NAME: &str = "command_index.json";

const DEFAULT_PROVIDER: &str = "deepseek";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Optional on-disk config, read from `<root>/scriptdex.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    provider: Option<String>,
    timeout_ms: Option<u64>,
    semantic: Option<bool>,
    #[serde(default)]
    scan: ScanSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScanSection {
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    include_hidden: bool,
}

/// Effective runtime configuration: file values overridden by environment,
/// falling back to defaults.
#[derive(Debug, Clone)]
pub struct ScriptdexConfig {
    pub root: PathBuf,
    pub snapshot_path: PathBuf,
    pub provider: String,
    pub timeout_ms: u64,
    pub semantic_enabled: bool,
    pub scan_exclude: Vec<String>,
    pub scan_include_hidden: bool,
}

impl ScriptdexConfig {
    pub fn load(root: &Path) -> Result<Self> {
        let file = read_config_file(&root.join(CONFIG_FILE_NAME))?;

        let provider = env_override("SCRIPTDEX_AI_PROVIDER")
            .or(file.provider)
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string())
            .to_lowercase();
        let timeout_ms = env_override("SCRIPTDEX_AI_TIMEOUT_MS")
            .and_then(|raw| raw.parse::<u64>().ok())
            .or(file.timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let semantic_enabled = if parse_env_bool(std::env::var("SCRIPTDEX_NO_AI").ok().as_deref())
        {
            false
        } else {
            file.semantic.unwrap_or(true)
        };

        Ok(Self {
            root: root.to_path_buf(),
            snapshot_path: root.join(SNAPSHOT_FILE_NAME),
            provider,
            timeout_ms,
            semantic_enabled,
            scan_exclude: file.scan.exclude,
            scan_include_hidden: file.scan.include_hidden,
        })
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw)
        .map_err(|err| ScriptdexError::Config(format!("{}: {err}", path.display())))
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ScriptdexConfig::load(dir.path()).expect("load defaults");

        assert_eq!(config.provider, DEFAULT_PROVIDER);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(config.semantic_enabled);
        assert_eq!(config.snapshot_path, dir.path().join(SNAPSHOT_FILE_NAME));
        assert!(config.scan_exclude.is_empty());
    }

    #[test]
    fn config_file_values_are_honored() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "provider = \"Claude\"\ntimeout_ms = 2500\nsemantic = false\n\n[scan]\nexclude = [\"vendor/**\"]\ninclude_hidden = true\n",
        )
        .expect("write config");

        let config = ScriptdexConfig::load(dir.path()).expect("load config");
        assert_eq!(config.provider, "claude");
        assert_eq!(config.timeout_ms, 2500);
        assert!(!config.semantic_enabled);
        assert_eq!(config.scan_exclude, vec!["vendor/**"]);
        assert!(config.scan_include_hidden);
    }

    #[test]
    fn malformed_config_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "provider = [nope")
            .expect("write config");

        let err = ScriptdexConfig::load(dir.path()).expect_err("must reject bad toml");
        assert!(matches!(err, ScriptdexError::Config(_)));
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "providr = \"deepseek\"\n")
            .expect("write config");

        assert!(ScriptdexConfig::load(dir.path()).is_err());
    }
}
