//! The options for the `kmic` command line tool.

//------------ Sub-modules ---------------------------------------------------

pub mod args;

//------------ Content -------------------------------------------------------

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use log::LevelFilter;
use serde_json::{Value, json};

use crate::config::{Config, ConfigError};
use crate::constants::{KMI_CLIENT_APP, KMI_ENV_LOG_LEVEL};
use crate::provider::KmiProvider;
use crate::provider::datasources::AccountDataSource;
use crate::provider::resource::DataSource;

use self::args::{InputMsg, JsonFile, PriorStateMsg};
use super::report::{Report, ReportFormat};

//------------ Options -------------------------------------------------------

/// The command line options for `kmic`.
#[derive(clap::Parser)]
#[command(version, about = KMI_CLIENT_APP)]
pub struct Options {
    #[command(flatten)]
    pub general: GeneralOptions,

    #[command(subcommand)]
    pub command: Command,
}

impl Options {
    /// Creates the options from the process arguments.
    ///
    /// If the arguments won’t result in usable options, exits the process.
    pub fn from_args() -> Self {
        Self::parse()
    }
}

//------------ GeneralOptions ------------------------------------------------

/// The options common to all commands.
///
/// These override the values from the config file. Values left unset
/// in both are taken from the environment.
#[derive(clap::Args)]
pub struct GeneralOptions {
    /// Path to a TOML config file with the provider settings.
    #[arg(short, long, env = "KMI_CONFIG")]
    pub config: Option<PathBuf>,

    /// The URI of the KMI API.
    #[arg(long)]
    pub host: Option<String>,

    /// Path to the client private key.
    #[arg(long)]
    pub api_key_path: Option<PathBuf>,

    /// Path to the client certificate.
    #[arg(long)]
    pub api_crt_path: Option<PathBuf>,

    /// Path to the CA bundle trusted for the KMI server.
    #[arg(long)]
    pub akamai_ca_path: Option<PathBuf>,

    /// Proxy to use for all KMI requests.
    #[arg(long)]
    pub proxy_host: Option<String>,

    /// Log level: off, error, warn, info, debug or trace.
    #[arg(long, env = KMI_ENV_LOG_LEVEL)]
    pub log_level: Option<String>,

    /// Report format: none, json or text.
    #[arg(short, long, default_value = "json")]
    pub format: ReportFormat,
}

impl GeneralOptions {
    /// Returns the provider config with all overrides applied.
    pub fn config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::read_config(path)?,
            None => Config::default(),
        };

        if let Some(host) = &self.host {
            config.host = Some(host.clone());
        }
        if let Some(path) = &self.api_key_path {
            config.api_key_path = Some(path.clone());
        }
        if let Some(path) = &self.api_crt_path {
            config.api_crt_path = Some(path.clone());
        }
        if let Some(path) = &self.akamai_ca_path {
            config.akamai_ca_path = Some(path.clone());
        }
        if let Some(proxy) = &self.proxy_host {
            config.proxy_host = Some(proxy.clone());
        }
        if let Some(level) = &self.log_level {
            config.log_level = LevelFilter::from_str(level)
                .map_err(|_| ConfigError::Other(format!("Unrecognized log level: {}", level)))?;
        }

        Ok(config)
    }
}

//------------ Command -------------------------------------------------------

#[derive(clap::Subcommand)]
pub enum Command {
    /// Print the schema of the provider, its resources and data sources.
    Schema,

    /// Create a resource and print its new state.
    Create(ResourceInput),

    /// Refresh the state of a resource.
    Read(ResourceInput),

    /// Update a resource and print its new state.
    Update(ResourceUpdate),

    /// Delete a resource.
    Delete(ResourceInput),

    /// Read a data source.
    Data(ResourceInput),

    /// Show the engines, collections and groups of an account.
    Account(Account),
}

impl Command {
    /// Returns whether the command talks to the KMI server.
    pub fn needs_client(&self) -> bool {
        !matches!(self, Command::Schema)
    }

    pub async fn run(self, provider: &KmiProvider) -> Report {
        match self {
            Self::Schema => Report::new(Ok(serde_json::to_value(KmiProvider::schema()).ok())),
            Self::Create(cmd) => provider.create(&cmd.type_name, cmd.input.content).await.into(),
            Self::Read(cmd) => provider.read(&cmd.type_name, cmd.input.content).await.into(),
            Self::Update(cmd) => provider
                .update(&cmd.type_name, cmd.prior.content, cmd.input.content)
                .await
                .into(),
            Self::Delete(cmd) => provider.delete(&cmd.type_name, cmd.input.content).await.into(),
            Self::Data(cmd) => provider.read_data_source(&cmd.type_name, cmd.input.content).await.into(),
            Self::Account(cmd) => cmd.run(provider).await,
        }
    }
}

//------------ ResourceInput -------------------------------------------------

#[derive(clap::Args)]
pub struct ResourceInput {
    /// The resource or data source type, e.g. kmi_group.
    #[arg(long = "type", value_name = "TYPE")]
    pub type_name: String,

    /// JSON file with the plan, state or config. Use '-' for stdin.
    #[arg(long, value_name = "FILE")]
    pub input: JsonFile<Value, InputMsg>,
}

#[derive(clap::Args)]
pub struct ResourceUpdate {
    /// The resource type, e.g. kmi_group.
    #[arg(long = "type", value_name = "TYPE")]
    pub type_name: String,

    /// JSON file with the planned state. Use '-' for stdin.
    #[arg(long, value_name = "FILE")]
    pub input: JsonFile<Value, InputMsg>,

    /// JSON file with the current state.
    #[arg(long, value_name = "FILE")]
    pub prior: JsonFile<Value, PriorStateMsg>,
}

//------------ Account -------------------------------------------------------

#[derive(clap::Args)]
pub struct Account {
    /// The name of the account.
    pub name: String,
}

impl Account {
    pub async fn run(self, provider: &KmiProvider) -> Report {
        provider
            .read_data_source(AccountDataSource::TYPE_NAME, json!({ "account_name": self.name }))
            .await
            .into()
    }
}

//------------ Tests ---------------------------------------------------------
