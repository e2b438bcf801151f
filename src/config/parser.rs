use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;
use toml::{Table, Value};

/// Loads a configuration file, repairing it when it is missing or mistyped
///
/// Every known key is checked against the type of its default value. Keys
/// with a wrong type (and keys missing from the document) take the default,
/// and the merged configuration is written back so the file becomes valid.
/// A document that is not TOML at all is replaced by the defaults.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - The merged and validated configuration
/// * `Err(ConfigError)` - The file could not be written back, or a semantic
///   check failed
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use tracker_scout::config::load_config;
///
/// let config = load_config(Path::new("rutracker.toml")).unwrap();
/// println!("Timeout: {}s", config.timeout_secs);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let document = match std::fs::read_to_string(path) {
        Ok(content) => match content.parse::<Table>() {
            Ok(table) => Some(table),
            Err(e) => {
                tracing::error!("Config {} is not valid TOML: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config {}: {}", path.display(), e);
            None
        }
    };

    let (config, is_valid) = match document {
        Some(table) => merge_document(&table)?,
        None => (Config::default(), false),
    };

    if !is_valid {
        save_config(path, &config)?;
    }

    validate(&config)?;

    Ok(config)
}

/// Writes a configuration as pretty TOML
pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    tracing::info!("Config written to {}", path.display());
    Ok(())
}

/// Merges a parsed document over the defaults, key by key
///
/// Returns the merged configuration and whether the document was valid
/// as-is.
fn merge_document(document: &Table) -> Result<(Config, bool), ConfigError> {
    let defaults = default_table()?;
    let mut merged = Table::new();
    let mut is_valid = true;

    for (key, default_value) in &defaults {
        let value = match document.get(key) {
            Some(Value::Table(given)) if default_value.is_table() => {
                let nested = default_value.as_table().cloned().unwrap_or_default();
                let (table, nested_valid) = merge_table(&nested, given, key);
                is_valid &= nested_valid;
                Value::Table(table)
            }
            Some(given) if same_type(given, default_value) => given.clone(),
            Some(_) => {
                tracing::warn!("Config key '{}' has the wrong type, using default", key);
                is_valid = false;
                default_value.clone()
            }
            None => {
                is_valid = false;
                default_value.clone()
            }
        };
        merged.insert(key.clone(), value);
    }

    let config: Config = Value::Table(merged).try_into()?;
    Ok((config, is_valid))
}

fn merge_table(defaults: &Table, given: &Table, parent: &str) -> (Table, bool) {
    let mut merged = Table::new();
    let mut is_valid = true;

    for (key, default_value) in defaults {
        match given.get(key) {
            Some(value) if same_type(value, default_value) => {
                merged.insert(key.clone(), value.clone());
            }
            _ => {
                tracing::warn!("Config key '{}.{}' is missing or mistyped", parent, key);
                is_valid = false;
                merged.insert(key.clone(), default_value.clone());
            }
        }
    }

    (merged, is_valid)
}

fn default_table() -> Result<Table, ConfigError> {
    match Value::try_from(Config::default())? {
        Value::Table(table) => Ok(table),
        _ => Err(ConfigError::Validation(
            "default configuration is not a table".to_string(),
        )),
    }
}

fn same_type(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}
