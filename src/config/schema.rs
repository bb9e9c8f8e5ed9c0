/// Configuration schema and defaults for mmpctl.
///
/// Defines the TOML-serializable configuration structure with the
/// `[backend]`, `[console]`, and `[logging]` sections. Every field has a
/// built-in default; users only set the values they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level mmpctl configuration.
///
/// Maps directly to the `~/.mmpctl/config.toml` and `.mmpctl.toml` file
/// schemas. All sections and fields are optional — missing values fall
/// back to built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MmpConfig {
    pub backend: BackendConfig,
    pub console: ConsoleConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Backend endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the platform backend.
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [console]
// ---------------------------------------------------------------------------

/// Interactive console settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Resource type preselected when a system is first opened.
    pub default_resource_type: String,
    /// Show the quick-tips panel on the welcome screen.
    pub welcome_tips: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            default_resource_type: "student".to_string(),
            welcome_tips: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Activity logging settings.
///
/// When enabled, every API request is appended to
/// `~/.mmpctl/activity-log.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether API activity logging is enabled.
    pub enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl MmpConfig {
    /// Generate the annotated default TOML config file content.
    ///
    /// Used by `mmpctl config init` to create a starting config file with
    /// all settings documented.
    pub fn default_toml() -> String {
        r#"# mmpctl Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (MMPCTL_*)
#   2. Project config (.mmpctl.toml in current directory)
#   3. User global config (~/.mmpctl/config.toml)
#   4. Built-in defaults

[backend]
base_url = "http://localhost:8000"

[console]
default_resource_type = "student"
welcome_tips = true

[logging]
enabled = true
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = MmpConfig::default();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.console.default_resource_type, "student");
        assert!(config.console.welcome_tips);
        assert!(config.logging.enabled);
    }

    #[test]
    fn deserialize_minimal_toml() {
        let toml_str = r#"
[backend]
base_url = "https://admin.example.com"
"#;
        let config: MmpConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend.base_url, "https://admin.example.com");
        // All other sections fall back to defaults
        assert_eq!(config.console.default_resource_type, "student");
        assert!(config.logging.enabled);
    }

    #[test]
    fn deserialize_full_toml() {
        let toml_str = r#"
[backend]
base_url = "http://10.0.0.5:9000"

[console]
default_resource_type = "teacher"
welcome_tips = false

[logging]
enabled = false
"#;
        let config: MmpConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.console.default_resource_type, "teacher");
        assert!(!config.console.welcome_tips);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let config: MmpConfig = toml::from_str("").unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert!(config.logging.enabled);
    }

    #[test]
    fn default_toml_parses_back() {
        let toml_str = MmpConfig::default_toml();
        let config: MmpConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.console.default_resource_type, "student");
    }
}
