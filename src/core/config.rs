use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const URL_ENV: &str = "SUPABASE_URL";
pub const KEY_ENV: &str = "SUPABASE_ANON_KEY";
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: Option<u16>,
    pub unix_socket: Option<PathBuf>,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// `rest` for the hosted table store, `memory` for an in-process one
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    /// Per-request timeout in seconds; unset means wait indefinitely
    pub request_timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            unix_socket: None,
            num_threads: default_num_threads(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: String::new(),
            api_key: String::new(),
            request_timeout: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: default_console(),
        }
    }
}

// Default value functions
fn default_port() -> Option<u16> {
    Some(3000)
}

fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_backend() -> String {
    "rest".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load the file if it exists, then apply environment overrides
    ///
    /// A missing file is not an error: the service can run from the
    /// environment alone.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Override file values with `SUPABASE_URL`, `SUPABASE_ANON_KEY` and `PORT`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(URL_ENV) {
            self.store.url = url;
        }

        if let Some(key) = lookup(KEY_ENV) {
            self.store.api_key = key;
        }

        if let Some(port) = lookup(PORT_ENV) {
            let port = port
                .trim()
                .parse::<u16>()
                .context(format!("{} must be a port number, got '{}'", PORT_ENV, port))?;
            self.server.port = Some(port);
        }

        Ok(())
    }

    /// Environment variables the `rest` backend needs but did not get
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.store.backend == "rest" {
            if self.store.url.is_empty() {
                missing.push(URL_ENV);
            }
            if self.store.api_key.is_empty() {
                missing.push(KEY_ENV);
            }
        }
        missing
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.store.request_timeout.map(Duration::from_secs)
    }

    /// Validate configuration values
    ///
    /// The store endpoint and key are not checked here, see
    /// [`Config::missing_credentials`].
    pub fn validate(&self) -> Result<()> {
        if self.server.port.is_none() && self.server.unix_socket.is_none() {
            bail!("Either port or unix_socket must be specified in server config");
        }

        if let Some(port) = self.server.port {
            if port == 0 {
                bail!("Server port must be greater than 0");
            }
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        let valid_backends = ["rest", "memory"];
        if !valid_backends.contains(&self.store.backend.as_str()) {
            bail!(
                "Invalid store backend '{}'. Must be one of: rest, memory",
                self.store.backend
            );
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}
