/// Configuration system for mmpctl.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::MmpConfig::default()`]
/// 2. **User global config** — `~/.mmpctl/config.toml`
/// 3. **Project local config** — `.mmpctl.toml` in the current working directory
/// 4. **Environment variables** — `MMPCTL_*` overrides (highest precedence)
///
/// Later layers override earlier ones. Missing sections in a TOML file
/// fall back to the previous layer's values.
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::MmpConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved mmpctl configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML →
/// env vars. This is the primary entry point for all modules that need
/// configuration.
pub fn load() -> MmpConfig {
    let mut config = MmpConfig::default();

    // Layer 2: user global config (~/.mmpctl/config.toml)
    if let Some(global) = load_toml_file(global_config_path()) {
        merge_config(&mut config, &global);
    }

    // Layer 3: project local config (.mmpctl.toml)
    if let Some(project) = load_toml_file(project_config_path()) {
        merge_config(&mut config, &project);
    }

    // Layer 4: environment variable overrides
    apply_env_overrides(&mut config);

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed. Malformed files are silently ignored — a broken
/// config must never make the tool unusable.
fn load_toml_file(path: Option<PathBuf>) -> Option<MmpConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge a loaded config layer into the base config.
///
/// Each TOML file is deserialized with `serde(default)`, so unset keys in
/// the overlay hold default values that match the base's defaults — the
/// overlay can simply replace the base.
fn merge_config(base: &mut MmpConfig, overlay: &MmpConfig) {
    *base = overlay.clone();
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.mmpctl/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mmpctl").join("config.toml"))
}

/// Path to the project local config: `.mmpctl.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".mmpctl.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `MMPCTL_BACKEND_URL` — backend base URL
/// - `MMPCTL_DEFAULT_TYPE` — resource type preselected in the console
/// - `MMPCTL_LOGGING` — activity logging (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut MmpConfig) {
    if let Ok(val) = std::env::var("MMPCTL_BACKEND_URL")
        && !val.is_empty()
    {
        config.backend.base_url = val;
    }
    if let Ok(val) = std::env::var("MMPCTL_DEFAULT_TYPE")
        && !val.is_empty()
    {
        config.console.default_resource_type = val;
    }
    if let Ok(val) = std::env::var("MMPCTL_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.mmpctl/config.toml`.
///
/// Creates the `~/.mmpctl/` directory if it doesn't exist. Returns an
/// error if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.mmpctl/ directory")?;
    }

    fs::write(&path, MmpConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Reads the current global config (or defaults), updates the specified
/// key, and writes the result back. Supports dotted keys like
/// `backend.base_url`.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&MmpConfig::default())
            .context("failed to serialize default config")?
    };

    let mut value_table: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;

    set_toml_value(&mut value_table, key, value)?;

    let output =
        toml::to_string_pretty(&value_table).context("failed to serialize updated config")?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.is_empty() {
        anyhow::bail!("empty config key");
    }

    // Navigate to the parent table
    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    // Determine the type of the existing value to parse correctly
    let existing = table.get(leaf);
    let new_value = match existing {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn malformed_config_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not toml {{{{").unwrap();
        assert!(load_toml_file(Some(path)).is_none());
    }

    #[test]
    fn missing_config_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_toml_file(Some(dir.path().join("absent.toml"))).is_none());
        assert!(load_toml_file(None).is_none());
    }

    #[test]
    fn valid_config_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend]\nbase_url = \"http://x:1\"\n").unwrap();
        let loaded = load_toml_file(Some(path)).unwrap();
        assert_eq!(loaded.backend.base_url, "http://x:1");
    }

    #[test]
    fn set_toml_value_updates_string() {
        let toml_str = r#"
[backend]
base_url = "http://localhost:8000"
"#;
        let mut root: toml::Value = toml::from_str(toml_str).unwrap();
        set_toml_value(&mut root, "backend.base_url", "https://admin.example.com").unwrap();

        let table = root.as_table().unwrap();
        let backend = table["backend"].as_table().unwrap();
        assert_eq!(
            backend["base_url"].as_str(),
            Some("https://admin.example.com")
        );
    }

    #[test]
    fn set_toml_value_updates_bool() {
        let toml_str = r#"
[logging]
enabled = true
"#;
        let mut root: toml::Value = toml::from_str(toml_str).unwrap();
        set_toml_value(&mut root, "logging.enabled", "false").unwrap();

        let table = root.as_table().unwrap();
        let logging = table["logging"].as_table().unwrap();
        assert_eq!(logging["enabled"].as_bool(), Some(false));
    }

    #[test]
    fn set_toml_value_rejects_invalid_key() {
        let toml_str = r#"
[backend]
base_url = "http://localhost:8000"
"#;
        let mut root: toml::Value = toml::from_str(toml_str).unwrap();
        let result = set_toml_value(&mut root, "nonexistent.key", "value");
        assert!(result.is_err());
    }

    #[test]
    fn show_effective_config_returns_toml() {
        let result = show_effective_config();
        assert!(result.is_ok());
        let toml_str = result.unwrap();
        // Should be parseable back
        let _: MmpConfig = toml::from_str(&toml_str).unwrap();
    }
}
