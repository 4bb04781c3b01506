use std::path::{Path, PathBuf};

use super::types::AppConfig;
use crate::error::ConfigError;

/// `~/.indexer`
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| ConfigError::NoHomeDir)?;
    Ok(PathBuf::from(home).join(".indexer"))
}

/// Read and parse one TOML file. Missing sections fall back to defaults.
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str::<AppConfig>(&s).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Resolve configuration for the binary.
///
/// An explicit path must exist. Otherwise `~/.indexer/config.toml` wins over
/// `./config.toml`, and defaults apply when neither is present. Environment
/// overrides are applied last.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut cfg = match explicit {
        Some(path) => load_from(path)?,
        None => {
            let home_config = data_dir()?.join("config.toml");
            let local_config = Path::new("config.toml");
            if home_config.exists() {
                load_from(&home_config)?
            } else if local_config.exists() {
                load_from(local_config)?
            } else {
                AppConfig::default()
            }
        }
    };

    apply_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

pub fn load_default() -> Result<AppConfig, ConfigError> {
    load(None)
}

/// Apply `INDEXER_*` overrides read through `lookup`. Blank values are ignored.
pub fn apply_overrides<F>(cfg: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("INDEXER_HTTP_HOST") {
        cfg.http.host = v.trim().to_string();
    }
    if let Some(v) = get("INDEXER_HTTP_PORT") {
        cfg.http.port = v
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "INDEXER_HTTP_PORT",
                value: v.clone(),
            })?;
    }
    if let Some(v) = get("INDEXER_LOG_LEVEL") {
        cfg.logging.level = v.trim().to_string();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nhost = \"0.0.0.0\"\n\n[logging]\nlevel = \"debug\"").unwrap();

        let cfg = load_from(file.path()).unwrap();
        assert_eq!(cfg.http.host, "0.0.0.0");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.http.port, 8098);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http\nport = ").unwrap();

        let err = load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = AppConfig::default();
        apply_overrides(
            &mut cfg,
            env(&[
                ("INDEXER_HTTP_HOST", "0.0.0.0"),
                ("INDEXER_HTTP_PORT", " 9100 "),
                ("INDEXER_LOG_LEVEL", "   "),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.http.bind_addr(), "0.0.0.0:9100");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_invalid_port_override() {
        let mut cfg = AppConfig::default();
        let err = apply_overrides(&mut cfg, env(&[("INDEXER_HTTP_PORT", "http")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "INDEXER_HTTP_PORT",
                ..
            }
        ));
    }
}
