//! Configuration files

use anyhow::Result;
use panel_core::config::{PanelConfig, parse_config};
use panel_core::core::user_friendly_error;
use panel_core::resolution::IsolationPolicy;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_from_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "[mapper]\nmax_workers = 6\n\n[isolation]\npolicy = \"reject\"")?;

    let config = PanelConfig::load_from(file.path())?;

    assert_eq!(config.mapper.max_workers, 6);
    assert_eq!(config.isolation.policy, IsolationPolicy::Reject);
    assert_eq!(config.cascade, PanelConfig::default().cascade);
    Ok(())
}

#[test]
fn test_missing_file_yields_defaults_without_path() -> Result<()> {
    let config = PanelConfig::load_with_env(None)?;
    assert_eq!(config.cascade, PanelConfig::default().cascade);
    Ok(())
}

#[test]
fn test_bad_file_reports_path_and_suggestion() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "[cascade]\nmax_rounds = \"many\"")?;

    let err = parse_config::<PanelConfig>(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains(&file.path().display().to_string()));

    let context = user_friendly_error(err);
    assert!(context.suggestion.is_some());
    Ok(())
}
