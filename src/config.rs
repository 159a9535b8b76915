//! Bootstrap configuration — embedded defaults overridden by process env.
//!
//! A `KEY=VALUE` defaults file is compiled into the binary. At startup the
//! process environment is layered on top and the result is materialized into
//! an explicit [`Config`] passed to every step — no global mutable state.

use std::collections::HashMap;

use thiserror::Error;

/// Defaults compiled into the binary at build time.
const DEFAULT_ENV: &str = include_str!("../.env");

/// Errors raised when a step needs a configuration value that is absent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} not set")]
    MissingVar(&'static str),
}

/// All configuration the bootstrap consumes, resolved once at startup.
///
/// Every field is optional at this layer; each step decides which values it
/// requires and raises [`ConfigError::MissingVar`] before any side effect.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub repo_host: Option<String>,
    pub distbuild_repo: Option<String>,
    pub wrapper_repo: Option<String>,
    pub agent_bin: Option<String>,
    pub proxy_bin: Option<String>,
    pub distninja_bin: Option<String>,
    pub auth_user: Option<String>,
    pub auth_pass: Option<String>,
}

impl Config {
    /// Resolve configuration from the embedded defaults and the process
    /// environment.
    #[must_use]
    pub fn load() -> Self {
        Self::from_sources(DEFAULT_ENV, |key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary defaults file and environment lookup.
    ///
    /// A variable present in the environment shadows the file value even
    /// when empty; empty values are then treated as unset.
    pub fn from_sources(defaults: &str, env: impl Fn(&str) -> Option<String>) -> Self {
        let file = parse_env_file(defaults);
        let get = |key: &str| {
            env(key)
                .or_else(|| file.get(key).cloned())
                .filter(|v| !v.trim().is_empty())
        };

        Self {
            repo_host: get("REPO_HOST"),
            distbuild_repo: get("DISTBUILD_REPO"),
            wrapper_repo: get("WRAPPER_REPO"),
            agent_bin: get("AGENT_BIN"),
            proxy_bin: get("PROXY_BIN"),
            distninja_bin: get("DISTNINJA_BIN"),
            // Older deployments exported the credentials under prefixed
            // names; both spellings are accepted.
            auth_user: get("AUTH_USER").or_else(|| get("DISTBUILD_AUTH_USER")),
            auth_pass: get("AUTH_PASS").or_else(|| get("DISTBUILD_AUTH_PASSWORD")),
        }
    }

    /// Repository host, required for every git operation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when `REPO_HOST` is unset.
    pub fn repo_host(&self) -> Result<&str, ConfigError> {
        self.repo_host
            .as_deref()
            .ok_or(ConfigError::MissingVar("REPO_HOST"))
    }

    /// Basic-auth credentials for downloads, present only when both halves
    /// are configured.
    #[must_use]
    pub fn basic_auth(&self) -> Option<(String, String)> {
        match (&self.auth_user, &self.auth_pass) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        }
    }
}

/// Parse `KEY=VALUE` lines. Blank lines, `#` comments, and lines without
/// `=` are skipped; keys and values are trimmed.
fn parse_env_file(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        vars.insert(key.trim().to_string(), value.trim().to_string());
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# comment
REPO_HOST=https://git.example.com
PROXY_BIN = https://dl.example.com/proxy \n\
malformed line
AUTH_USER=alice
";

    #[test]
    fn parses_defaults_file() {
        let vars = parse_env_file(SAMPLE);
        assert_eq!(
            vars.get("REPO_HOST").map(String::as_str),
            Some("https://git.example.com")
        );
        assert_eq!(
            vars.get("PROXY_BIN").map(String::as_str),
            Some("https://dl.example.com/proxy")
        );
        assert!(!vars.contains_key("malformed line"));
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn environment_overrides_file_defaults() {
        let config = Config::from_sources(SAMPLE, |key| {
            (key == "REPO_HOST").then(|| "https://mirror.example.com".to_string())
        });
        assert_eq!(
            config.repo_host.as_deref(),
            Some("https://mirror.example.com")
        );
        // Untouched keys fall back to the file.
        assert_eq!(config.auth_user.as_deref(), Some("alice"));
    }

    #[test]
    fn empty_environment_value_masks_file_default() {
        let config = Config::from_sources(SAMPLE, |key| {
            (key == "REPO_HOST").then(String::new)
        });
        assert!(config.repo_host.is_none());
        assert!(matches!(
            config.repo_host(),
            Err(ConfigError::MissingVar("REPO_HOST"))
        ));
    }

    #[test]
    fn basic_auth_needs_both_halves() {
        let config = Config::from_sources(SAMPLE, |_| None);
        assert!(config.basic_auth().is_none());

        let config = Config::from_sources(SAMPLE, |key| {
            (key == "AUTH_PASS").then(|| "s3cret".to_string())
        });
        assert_eq!(
            config.basic_auth(),
            Some(("alice".to_string(), "s3cret".to_string()))
        );
    }

    #[test]
    fn prefixed_credential_names_are_accepted() {
        let config = Config::from_sources("", |key| match key {
            "DISTBUILD_AUTH_USER" => Some("bob".to_string()),
            "DISTBUILD_AUTH_PASSWORD" => Some("pw".to_string()),
            _ => None,
        });
        assert_eq!(
            config.basic_auth(),
            Some(("bob".to_string(), "pw".to_string()))
        );
    }

    #[test]
    #[serial_test::serial]
    #[allow(unsafe_code)]
    fn load_reads_the_process_environment() {
        // SAFETY: serialized across the test binary; no other thread reads
        // the environment while this test runs.
        unsafe { std::env::set_var("REPO_HOST", "https://env.example.com") };
        let config = Config::load();
        unsafe { std::env::remove_var("REPO_HOST") };
        assert_eq!(
            config.repo_host.as_deref(),
            Some("https://env.example.com")
        );
    }
}
