use std::path::{Path, PathBuf};

use blockdump_pipeline::DownloadConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};

use crate::cli::DownloadArgs;

pub const DEFAULT_CONFIG_FILE: &str = "blockdump.toml";
pub const ENV_PREFIX: &str = "BLOCKDUMP_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("config file {0} does not exist")]
    MissingFile(PathBuf),

    #[error("invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),
}

/// Defaults, then the TOML file, then `BLOCKDUMP_*`, then flags.
pub fn load(args: &DownloadArgs) -> Result<DownloadConfig, ConfigLoadError> {
    let file = match &args.config {
        Some(path) if !path.exists() => return Err(ConfigLoadError::MissingFile(path.clone())),
        Some(path) => Some(path.clone()),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
    };
    extract(layered(file.as_deref(), ENV_PREFIX, args))
}

fn layered(file: Option<&Path>, env_prefix: &str, args: &DownloadArgs) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(DownloadConfig::default()));
    if let Some(path) = file {
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(Env::prefixed(env_prefix))
        .merge(Serialized::defaults(args))
}

fn extract(figment: Figment) -> Result<DownloadConfig, ConfigLoadError> {
    figment.extract().map_err(|e| ConfigLoadError::Figment(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_ENV: &str = "BLOCKDUMP_TEST_UNSET_PREFIX_";

    #[test]
    fn defaults_without_sources() {
        let config = extract(layered(None, NO_ENV, &DownloadArgs::default())).unwrap();
        assert_eq!(config, DownloadConfig::default());
    }

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blockdump.toml");
        std::fs::write(&path, "start = 10\nend = 20\nconcurrency = 4\nretries = 2\n").unwrap();
        let args = DownloadArgs {
            end: Some(15),
            timeout: Some(3),
            ..DownloadArgs::default()
        };

        let config = extract(layered(Some(&path), NO_ENV, &args)).unwrap();

        assert_eq!((config.start, config.end), (10, 15));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.retries, 2);
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.base_url, blockdump_pipeline::DEFAULT_BASE_URL);
    }

    #[test]
    fn wrong_types_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "concurrency = \"many\"\n").unwrap();

        assert!(extract(layered(Some(&path), NO_ENV, &DownloadArgs::default())).is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let args = DownloadArgs {
            config: Some(PathBuf::from("/nonexistent/blockdump.toml")),
            ..DownloadArgs::default()
        };
        assert!(matches!(load(&args), Err(ConfigLoadError::MissingFile(_))));
    }
}
