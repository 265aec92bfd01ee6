//! Provider configuration and logging setup.
use std::{env, fmt, fs, io};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, de};

use crate::constants::*;
use crate::kmi::DistributionRetry;
use crate::provider::diagnostics::{Diagnostic, Diagnostics};

//------------ ConfigDefaults ------------------------------------------------

pub struct ConfigDefaults;

impl ConfigDefaults {
    fn log_level() -> LevelFilter {
        match env::var(KMI_ENV_LOG_LEVEL) {
            Ok(level) => match LevelFilter::from_str(&level) {
                Ok(level) => level,
                Err(_) => {
                    eprintln!("Unrecognized value for log level in env var {}, using 'warn'", KMI_ENV_LOG_LEVEL);
                    LevelFilter::Warn
                }
            },
            _ => LevelFilter::Warn,
        }
    }

    fn http_timeout_secs() -> u64 {
        HTTP_CLIENT_TIMEOUT_SECS
    }

    fn collection_retry_initial_secs() -> u64 {
        COLLECTION_RETRY_INITIAL_SECS
    }

    fn collection_retry_max_elapsed_secs() -> u64 {
        COLLECTION_RETRY_MAX_ELAPSED_SECS
    }
}

//------------ Config --------------------------------------------------------

/// The provider configuration.
///
/// This is what a host passes as the provider block, and what `kmic`
/// reads from its TOML config file. All connection values may be left
/// out here and be supplied through the environment instead, see
/// [`Config::resolve_connection`].
#[derive(Deserialize)]
pub struct Config {
    pub host: Option<String>,
    pub api_key: Option<SecretString>,
    pub api_crt: Option<String>,
    pub akamai_ca: Option<String>,
    pub api_key_path: Option<PathBuf>,
    pub api_crt_path: Option<PathBuf>,
    pub akamai_ca_path: Option<PathBuf>,
    pub proxy_host: Option<String>,

    #[serde(default = "ConfigDefaults::log_level", deserialize_with = "de_level_filter")]
    pub log_level: LevelFilter,

    #[serde(default = "ConfigDefaults::http_timeout_secs")]
    pub http_timeout_secs: u64,

    #[serde(default = "ConfigDefaults::collection_retry_initial_secs")]
    pub collection_retry_initial_secs: u64,

    #[serde(default = "ConfigDefaults::collection_retry_max_elapsed_secs")]
    pub collection_retry_max_elapsed_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: None,
            api_key: None,
            api_crt: None,
            akamai_ca: None,
            api_key_path: None,
            api_crt_path: None,
            akamai_ca_path: None,
            proxy_host: None,
            log_level: ConfigDefaults::log_level(),
            http_timeout_secs: ConfigDefaults::http_timeout_secs(),
            collection_retry_initial_secs: ConfigDefaults::collection_retry_initial_secs(),
            collection_retry_max_elapsed_secs: ConfigDefaults::collection_retry_max_elapsed_secs(),
        }
    }
}

impl Config {
    pub fn read_config(file: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(file)?;
        let c: Config = toml::from_str(&content)?;
        Ok(c)
    }

    /// Builds the config from the provider block passed by the host.
    ///
    /// The host passes unset attributes as `null`, these get their
    /// defaults.
    pub fn from_json(mut value: serde_json::Value) -> Result<Self, ConfigError> {
        if let serde_json::Value::Object(map) = &mut value {
            map.retain(|_, v| !v.is_null());
        }
        serde_json::from_value(value).map_err(|e| ConfigError::Other(format!("Invalid provider configuration: {}", e)))
    }

    /// The policy for waiting on collection distribution.
    pub fn distribution_retry(&self) -> DistributionRetry {
        DistributionRetry {
            initial_interval: Duration::from_secs(self.collection_retry_initial_secs),
            multiplier: COLLECTION_RETRY_MULTIPLIER,
            max_elapsed: Duration::from_secs(self.collection_retry_max_elapsed_secs),
        }
    }

    /// Resolves the connection settings.
    ///
    /// Configured values win over the environment, which is looked up
    /// through `env`. For each credential a path wins over an inline
    /// value. All missing values are reported together.
    pub fn resolve_connection<F>(&self, env: F) -> Result<ConnectionSettings, Diagnostics>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |configured: Option<&str>, name: &str| -> Option<String> {
            non_empty(configured)
                .map(ToString::to_string)
                .or_else(|| non_empty(env(name).as_deref()).map(ToString::to_string))
        };
        let lookup_path = |configured: &Option<PathBuf>, name: &str| -> Option<PathBuf> {
            configured
                .as_ref()
                .filter(|p| !p.as_os_str().is_empty())
                .cloned()
                .or_else(|| non_empty(env(name).as_deref()).map(PathBuf::from))
        };

        let host = lookup(self.host.as_deref(), KMI_ENV_HOST);
        let api_key = lookup(self.api_key.as_ref().map(|k| k.expose_secret().as_str()), KMI_ENV_API_KEY);
        let api_crt = lookup(self.api_crt.as_deref(), KMI_ENV_API_CRT);
        let akamai_ca = lookup(self.akamai_ca.as_deref(), KMI_ENV_AKAMAI_CA);
        let api_key_path = lookup_path(&self.api_key_path, KMI_ENV_API_KEY_PATH);
        let api_crt_path = lookup_path(&self.api_crt_path, KMI_ENV_API_CRT_PATH);
        let akamai_ca_path = lookup_path(&self.akamai_ca_path, KMI_ENV_AKAMAI_CA_PATH);
        let proxy_host = lookup(self.proxy_host.as_deref(), KMI_ENV_PROXY_HOST);

        let api_key = PemSource::pick(api_key_path, api_key);
        let api_crt = PemSource::pick(api_crt_path, api_crt);
        let akamai_ca = PemSource::pick(akamai_ca_path, akamai_ca);

        let mut diagnostics = Diagnostics::default();
        if host.is_none() {
            diagnostics.push(missing_value("host", "Missing KMI API Host", "KMI API host", KMI_ENV_HOST));
        }
        if api_key.is_none() {
            diagnostics.push(missing_value("api_key", "Missing KMI API Key", "KMI API key", KMI_ENV_API_KEY));
        }
        if api_crt.is_none() {
            diagnostics.push(missing_value(
                "api_crt",
                "Missing KMI API Certificate",
                "KMI API certificate",
                KMI_ENV_API_CRT,
            ));
        }
        if akamai_ca.is_none() {
            diagnostics.push(missing_value(
                "akamai_ca",
                "Missing KMI Certificate Authority",
                "KMI certificate authority",
                KMI_ENV_AKAMAI_CA,
            ));
        }

        match (host, api_key, api_crt, akamai_ca) {
            (Some(host), Some(api_key), Some(api_crt), Some(akamai_ca)) if diagnostics.is_empty() => {
                Ok(ConnectionSettings {
                    host,
                    api_key,
                    api_crt,
                    akamai_ca,
                    proxy_host,
                    timeout: Duration::from_secs(self.http_timeout_secs),
                })
            }
            _ => Err(diagnostics),
        }
    }

    pub fn init_logging(&self) -> Result<(), ConfigError> {
        self.stderr_logger()
    }

    /// Creates a stderr logger.
    ///
    /// Standard output is reserved for the documents `kmic` prints.
    fn stderr_logger(&self) -> Result<(), ConfigError> {
        self.fern_logger()
            .chain(io::stderr())
            .apply()
            .map_err(|e| ConfigError::Other(format!("Failed to init stderr logging: {}", e)))
    }

    /// Creates and returns a fern logger with log level tweaks
    fn fern_logger(&self) -> fern::Dispatch {
        // suppress overly noisy logging
        let framework_level = self.log_level.min(LevelFilter::Warn);

        let show_target = self.log_level == LevelFilter::Trace || self.log_level == LevelFilter::Debug;
        fern::Dispatch::new()
            .format(move |out, message, record| {
                if show_target {
                    out.finish(format_args!(
                        "{} [{}] [{}] {}",
                        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                        record.level(),
                        record.target(),
                        message
                    ))
                } else {
                    out.finish(format_args!(
                        "{} [{}] {}",
                        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                        record.level(),
                        message
                    ))
                }
            })
            .level(self.log_level)
            .level_for("rustls", framework_level)
            .level_for("hyper", framework_level)
            .level_for("hyper_util", framework_level)
            .level_for("mio", framework_level)
            .level_for("reqwest", framework_level)
            .level_for("want", framework_level)
            .level_for("h2", framework_level)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn missing_value(attribute: &str, summary: &str, what: &str, env_var: &str) -> Diagnostic {
    Diagnostic::attribute_error(
        attribute,
        summary,
        format!(
            "The provider cannot create the KMI API client as there is a missing or empty value for the {}. \
             Set the {} value (or its path variant) in the configuration or use the {} environment variable. \
             If either is already set, ensure the value is not empty.",
            what, attribute, env_var
        ),
    )
}

fn de_level_filter<'de, D>(d: D) -> Result<LevelFilter, D::Error>
where
    D: Deserializer<'de>,
{
    let string = String::deserialize(d)?;
    LevelFilter::from_str(&string).map_err(|_| de::Error::custom(format!("Unrecognized log level: {}", string)))
}

//------------ PemSource -----------------------------------------------------

/// Where a piece of PEM encoded credential material comes from.
pub enum PemSource {
    Inline(SecretString),
    File(PathBuf),
}

impl PemSource {
    fn pick(path: Option<PathBuf>, inline: Option<String>) -> Option<Self> {
        match (path, inline) {
            (Some(path), _) => Some(PemSource::File(path)),
            (None, Some(inline)) => Some(PemSource::Inline(SecretString::new(inline))),
            (None, None) => None,
        }
    }

    /// Returns the PEM bytes, reading the file if needed.
    pub fn load(&self) -> Result<Vec<u8>, io::Error> {
        match self {
            PemSource::Inline(pem) => Ok(pem.expose_secret().as_bytes().to_vec()),
            PemSource::File(path) => fs::read(path),
        }
    }
}

impl fmt::Display for PemSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PemSource::Inline(_) => write!(f, "inline value"),
            PemSource::File(path) => write!(f, "file '{}'", path.display()),
        }
    }
}

impl fmt::Debug for PemSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

//------------ ConnectionSettings --------------------------------------------

/// Fully resolved settings for connecting to a KMI server.
#[derive(Debug)]
pub struct ConnectionSettings {
    pub host: String,
    pub api_key: PemSource,
    pub api_crt: PemSource,
    pub akamai_ca: PemSource,
    pub proxy_host: Option<String>,
    pub timeout: Duration,
}

//------------ ConfigError ---------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    IoError(io::Error),
    TomlError(toml::de::Error),
    Other(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => e.fmt(f),
            ConfigError::TomlError(e) => e.fmt(f),
            ConfigError::Other(s) => s.fmt(f),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub fn other(s: &str) -> ConfigError {
        ConfigError::Other(s.to_string())
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::TomlError(e)
    }
}

//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    fn summaries(diagnostics: &Diagnostics) -> Vec<String> {
        diagnostics.iter().map(|d| d.summary.clone()).collect()
    }

    #[test]
    fn read_toml_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
host = "https://kmi.example.net:11838"
api_key_path = "/etc/kmi/client.key"
api_crt_path = "/etc/kmi/client.crt"
akamai_ca_path = "/etc/kmi/ca.pem"
log_level = "debug"
collection_retry_initial_secs = 5
"#
        )
        .unwrap();

        let config = Config::read_config(file.path()).unwrap();
        assert_eq!(config.host.as_deref(), Some("https://kmi.example.net:11838"));
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.http_timeout_secs, HTTP_CLIENT_TIMEOUT_SECS);

        let retry = config.distribution_retry();
        assert_eq!(retry.initial_interval, Duration::from_secs(5));
        assert_eq!(retry.max_elapsed, Duration::from_secs(COLLECTION_RETRY_MAX_ELAPSED_SECS));
    }

    #[test]
    fn read_json_config_with_nulls() {
        let config = Config::from_json(serde_json::json!({
            "host": "https://kmi.example.net:11838",
            "api_key": null,
            "http_timeout_secs": null,
            "collection_retry_initial_secs": 10,
        }))
        .unwrap();
        assert_eq!(config.host.as_deref(), Some("https://kmi.example.net:11838"));
        assert!(config.api_key.is_none());
        assert_eq!(config.http_timeout_secs, HTTP_CLIENT_TIMEOUT_SECS);
        assert_eq!(config.collection_retry_initial_secs, 10);
    }

    #[test]
    fn reject_bad_log_level() {
        let res = toml::from_str::<Config>("log_level = \"chatty\"");
        assert!(res.is_err());
    }

    #[test]
    fn report_all_missing_values() {
        let config = Config::default();
        let diagnostics = config.resolve_connection(env_of(&[])).err().unwrap();
        assert_eq!(
            summaries(&diagnostics),
            vec![
                "Missing KMI API Host",
                "Missing KMI API Key",
                "Missing KMI API Certificate",
                "Missing KMI Certificate Authority"
            ]
        );
        assert_eq!(diagnostics.iter().next().unwrap().attribute.as_deref(), Some("host"));
    }

    #[test]
    fn empty_values_count_as_missing() {
        let config = Config {
            host: Some(String::new()),
            api_key: Some(SecretString::new(String::new())),
            ..Default::default()
        };
        let diagnostics = config
            .resolve_connection(env_of(&[(KMI_ENV_API_CRT, "crt"), (KMI_ENV_AKAMAI_CA, "ca")]))
            .err()
            .unwrap();
        assert_eq!(summaries(&diagnostics), vec!["Missing KMI API Host", "Missing KMI API Key"]);
    }

    #[test]
    fn configured_values_win_over_environment() {
        let config = Config {
            host: Some("https://configured:11838".to_string()),
            api_crt: Some("configured crt".to_string()),
            ..Default::default()
        };
        let settings = config
            .resolve_connection(env_of(&[
                (KMI_ENV_HOST, "https://from-env:11838"),
                (KMI_ENV_API_KEY, "env key"),
                (KMI_ENV_API_CRT, "env crt"),
                (KMI_ENV_AKAMAI_CA, "env ca"),
                (KMI_ENV_PROXY_HOST, "http://proxy:3128"),
            ]))
            .unwrap();

        assert_eq!(settings.host, "https://configured:11838");
        assert_eq!(settings.api_crt.load().unwrap(), b"configured crt");
        assert_eq!(settings.api_key.load().unwrap(), b"env key");
        assert_eq!(settings.akamai_ca.load().unwrap(), b"env ca");
        assert_eq!(settings.proxy_host.as_deref(), Some("http://proxy:3128"));
    }

    #[test]
    fn paths_win_over_inline_values() {
        let mut key_file = tempfile::NamedTempFile::new().unwrap();
        write!(key_file, "key from file").unwrap();

        let config = Config {
            host: Some("https://kmi:11838".to_string()),
            api_key: Some(SecretString::new("inline key".to_string())),
            api_key_path: Some(key_file.path().to_path_buf()),
            api_crt: Some("crt".to_string()),
            ..Default::default()
        };
        let settings = config
            .resolve_connection(env_of(&[(KMI_ENV_AKAMAI_CA_PATH, "/nonexistent/ca.pem")]))
            .unwrap();

        assert!(matches!(settings.api_key, PemSource::File(_)));
        assert_eq!(settings.api_key.load().unwrap(), b"key from file");
        assert!(matches!(settings.akamai_ca, PemSource::File(_)));
        assert!(settings.akamai_ca.load().is_err());
        assert_eq!(settings.akamai_ca.to_string(), "file '/nonexistent/ca.pem'");
    }
}
