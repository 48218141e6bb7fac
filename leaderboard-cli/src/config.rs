/// Config file loading and creation for the leaderboard CLI.
///
/// Config lives at ~/.config/student-leaderboard/config.toml.
/// All fields are optional. CLI args and env vars override config values.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::bail;
use crate::supabase::SupabaseConfig;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_RETRIES: usize = 2;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Deserialize, Default, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LeaderboardConfig {
    pub supabase_url: Option<String>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub retries: Option<usize>,
    pub timeout_secs: Option<u64>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# student-leaderboard configuration
# All values here can be overridden by CLI flags.

# Supabase project URL (or set SUPABASE_URL)
# supabase_url = \"https://your-project.supabase.co\"

# Anon key: use SUPABASE_ANON_KEY env var or --anon-key flag (not stored in config)

# Address and port for `leaderboard serve`
# bind = \"0.0.0.0\"
# port = 3000

# Extra attempts per Supabase request after a failure
# retries = 2

# Per-request timeout in seconds
# timeout_secs = 10
";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("No Supabase URL specified. Pass --supabase-url, set SUPABASE_URL, or set supabase_url in {0}")]
    MissingUrl(PathBuf),

    #[error("No anon key specified. Pass --anon-key or set SUPABASE_ANON_KEY")]
    MissingAnonKey,
}

/// Connection values from the command line and the environment.
#[derive(Debug, Default, Clone)]
pub struct ConnectionOverrides {
    pub supabase_url: Option<String>,
    pub anon_key: Option<String>,
    pub retries: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub env_url: Option<String>,
    pub env_anon_key: Option<String>,
}

/// Merge CLI args, env vars and the config file (in that order of precedence).
pub fn resolve_supabase(
    overrides: ConnectionOverrides,
    cfg: &LeaderboardConfig,
    config_path: &Path,
) -> Result<SupabaseConfig, ConfigError> {
    let url = overrides
        .supabase_url
        .or(overrides.env_url)
        .or_else(|| cfg.supabase_url.clone())
        .ok_or_else(|| ConfigError::MissingUrl(config_path.to_path_buf()))?;
    let anon_key = overrides
        .anon_key
        .or(overrides.env_anon_key)
        .ok_or(ConfigError::MissingAnonKey)?;

    Ok(SupabaseConfig {
        url,
        anon_key,
        timeout: Duration::from_secs(overrides.timeout_secs.or(cfg.timeout_secs).unwrap_or(DEFAULT_TIMEOUT_SECS)),
        retries: overrides.retries.or(cfg.retries).unwrap_or(DEFAULT_RETRIES),
    })
}

/// Returns the default config path: ~/.config/student-leaderboard/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("student-leaderboard").join("config.toml")
}

pub fn parse_config(content: &str) -> Result<LeaderboardConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> LeaderboardConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => LeaderboardConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

/// Create the default config file. Errors if it already exists.
pub fn create_default_config() -> PathBuf {
    let path = config_path();

    if path.exists() {
        bail(format!("Config file already exists at {}", path.display()));
    }

    // Create parent directories
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
    fn test_default_template_parses_to_empty_config() {
        assert_eq!(parse_config(DEFAULT_CONFIG_TEMPLATE).unwrap(), LeaderboardConfig::default());
    }

    #[test]
    fn test_parse_config_values() {
        let cfg = parse_config("supabase_url = \"https://x.supabase.co\"\nport = 8080\nretries = 0\n").unwrap();
        assert_eq!(cfg.supabase_url.as_deref(), Some("https://x.supabase.co"));
        assert_eq!(cfg.port, Some(8080));
        assert_eq!(cfg.retries, Some(0));
        assert_eq!(cfg.bind, None);
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        assert!(parse_config("anon_key = \"secret\"\n").is_err());
    }

    #[test]
    fn test_cli_beats_env_beats_file() {
        let cfg = LeaderboardConfig {
            supabase_url: Some("https://file".to_string()),
            retries: Some(5),
            ..Default::default()
        };
        let path = Path::new("/tmp/config.toml");

        let from_env = resolve_supabase(
            ConnectionOverrides {
                env_url: Some("https://env".to_string()),
                env_anon_key: Some("k".to_string()),
                ..Default::default()
            },
            &cfg,
            path,
        )
        .unwrap();
        assert_eq!(from_env.url, "https://env");
        assert_eq!(from_env.retries, 5);
        assert_eq!(from_env.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let from_cli = resolve_supabase(
            ConnectionOverrides {
                supabase_url: Some("https://cli".to_string()),
                anon_key: Some("cli-key".to_string()),
                env_url: Some("https://env".to_string()),
                env_anon_key: Some("env-key".to_string()),
                retries: Some(0),
                timeout_secs: Some(3),
            },
            &cfg,
            path,
        )
        .unwrap();
        assert_eq!(from_cli.url, "https://cli");
        assert_eq!(from_cli.anon_key, "cli-key");
        assert_eq!(from_cli.retries, 0);
        assert_eq!(from_cli.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_missing_values_are_reported() {
        let path = Path::new("/tmp/config.toml");
        assert_eq!(
            resolve_supabase(ConnectionOverrides::default(), &LeaderboardConfig::default(), path).unwrap_err(),
            ConfigError::MissingUrl(path.to_path_buf())
        );

        let url_only = ConnectionOverrides {
            supabase_url: Some("https://x".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_supabase(url_only, &LeaderboardConfig::default(), path).unwrap_err(),
            ConfigError::MissingAnonKey
        );
    }
}
