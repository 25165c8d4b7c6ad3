//! Configuration commands.
//!
//! - `config show`: Display current configuration
//! - `config get`: Print a single value
//! - `config set`: Set a configuration value

use owo_colors::OwoColorize;
use serde_json::json;

use super::print_json;
use crate::config::{CONFIG_KEYS, Config};
use crate::error::{ListwinError, Result};

/// Show current configuration
pub fn cmd_config_show(output_json: bool) -> Result<()> {
    let config = Config::load()?;

    if output_json {
        let mut values = serde_json::Map::new();
        for key in CONFIG_KEYS {
            values.insert(key.to_string(), json!(config.get(key)?));
        }
        values.insert("effective_base_url".to_string(), json!(config.base_url()));
        values.insert(
            "config_file".to_string(),
            json!(Config::config_path().to_string_lossy()),
        );
        return print_json(&serde_json::Value::Object(values));
    }

    println!("{}\n", "Configuration:".cyan().bold());
    for key in CONFIG_KEYS {
        match config.get(key)? {
            Some(value) => println!("  {}: {value}", key.cyan()),
            None => println!("  {}: {}", key.cyan(), "not configured".dimmed()),
        }
    }
    if config.base_url.is_none()
        && let Some(url) = config.base_url()
    {
        println!("  {}", format!("(base_url from LISTWIN_BASE_URL: {url})").dimmed());
    }
    println!();
    println!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    );
    Ok(())
}

/// Print a single configuration value
pub fn cmd_config_get(key: &str, output_json: bool) -> Result<()> {
    let config = Config::load()?;
    let value = config
        .get(key)?
        .ok_or_else(|| ListwinError::Config(format!("{key} is not set")))?;

    if output_json {
        print_json(&json!({ "key": key, "value": value }))
    } else {
        println!("{value}");
        Ok(())
    }
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, output_json: bool) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    if output_json {
        print_json(&json!({
            "action": "config_set",
            "key": key,
            "value": value,
            "success": true,
        }))
    } else {
        println!("Set {} = {}", key.cyan(), value);
        Ok(())
    }
}
