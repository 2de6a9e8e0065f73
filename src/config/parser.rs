//! Generic TOML parsing with file path context.
//!
//! Used by [`super::PanelConfig::load_from`] and available to embedding
//! applications that keep their own settings next to the panel's.
//!
//! Example error output:
//! ```text
//! Failed to parse config file: /etc/panel/panel.toml
//! Caused by:
//!     invalid type: string "many", expected usize
//! ```

use anyhow::{Context, Result};
use std::path::Path;

/// Parse a TOML configuration file into the specified type.
///
/// Reads the whole file, then deserializes it into any
/// [`serde::de::DeserializeOwned`] type. Both the read and the parse step add
/// the file path to the error chain.
///
/// # Examples
///
/// ```rust,no_run
/// use panel_core::config::{PanelConfig, parse_config};
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let config: PanelConfig = parse_config(Path::new("panel.toml"))?;
/// println!("workers: {}", config.mapper.max_workers);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// - the file does not exist or cannot be read
/// - the file is not valid TOML or does not match `T`
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Debug, serde::Deserialize)]
    struct Limits {
        workers: usize,
        label: String,
    }

    #[test]
    fn test_parse_config() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("limits.toml");
        std::fs::write(&config_path, "workers = 3\nlabel = \"rows\"\n").unwrap();

        let limits: Limits = parse_config(&config_path).unwrap();
        assert_eq!(limits.workers, 3);
        assert_eq!(limits.label, "rows");
    }

    #[test]
    fn test_parse_config_missing_file_names_path() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("absent.toml");

        let err = parse_config::<Limits>(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_parse_config_type_mismatch() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("bad.toml");
        std::fs::write(&config_path, "workers = \"many\"\nlabel = \"rows\"\n").unwrap();

        let err = parse_config::<Limits>(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
