/// Config file loading and creation for mergerank CLI.
///
/// Config lives at ~/.config/mergerank/config.toml.
/// All fields are optional — CLI args override config values.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bail;

#[derive(Deserialize, Default, Debug, PartialEq)]
pub struct MergerankConfig {
    pub state_file: Option<String>,
    pub seed: Option<u64>,
    pub json: Option<bool>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# mergerank configuration
# All values here can be overridden by CLI flags.

# Where to keep sort progress between runs. Without it nothing is persisted.
# state_file = \"/home/me/.local/share/mergerank/state.json\"

# Fixed shuffle seed (random when unset)
# seed = 42

# Print results as JSON instead of a table
# json = false
";

/// Returns the default config path: ~/.config/mergerank/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("mergerank").join("config.toml")
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> MergerankConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => MergerankConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

fn parse_config(content: &str) -> Result<MergerankConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Create the default config file. Errors if it already exists.
pub fn create_default_config() -> PathBuf {
    let path = config_path();

    if path.exists() {
        bail(format!("Config file already exists at {}", path.display()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| bail(format!("Failed to create directory {}: {e}", parent.display())));
    }

    std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
        .unwrap_or_else(|e| bail(format!("Failed to write config to {}: {e}", path.display())));

    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_is_all_defaults() {
        assert_eq!(parse_config(DEFAULT_CONFIG_TEMPLATE).unwrap(), MergerankConfig::default());
    }

    #[test]
    fn test_parse_values() {
        let cfg = parse_config("state_file = \"/tmp/s.json\"\nseed = 7\njson = true\n").unwrap();
        assert_eq!(cfg.state_file.as_deref(), Some("/tmp/s.json"));
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.json, Some(true));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config(&dir.path().join("nope.toml")), MergerankConfig::default());
    }
}
