//! The provider: configuration and dispatch of host calls to the typed
//! resources and data sources.
//!
//! The host addresses resources by type name and exchanges their state
//! as JSON. Every call is decoded into the model of the resource, handled
//! by the resource, and the resulting state is encoded again.

pub mod datasources;
pub mod diagnostics;
pub mod resource;
pub mod resources;
pub mod schema;

use std::collections::BTreeMap;
use std::env;

use log::{debug, info};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Config;
use crate::constants::KMI_PROVIDER_TYPE_NAME;
use crate::kmi::{DistributionRetry, KmiClient};

use self::datasources::{AccountDataSource, CollectionDataSource};
use self::diagnostics::Diagnostics;
use self::resource::{DataSource, ProviderData, Resource};
use self::resources::{
    CollectionResource, DefinitionResource, EngineResource, GroupMembershipResource, GroupResource, TemplateResource,
    WorkloadResource,
};
use self::schema::{Attribute, ProviderSchema, Schema};

//------------ KmiProvider ---------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct KmiProvider {
    data: Option<ProviderData>,
}

impl KmiProvider {
    /// Creates an unconfigured provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider that uses the given client.
    pub fn with_client(client: KmiClient, retry: DistributionRetry) -> Self {
        KmiProvider {
            data: Some(ProviderData { client, retry }),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.data.is_some()
    }

    pub fn schema() -> ProviderSchema {
        let mut resources = BTreeMap::new();
        resources.insert(EngineResource::TYPE_NAME, EngineResource::schema());
        resources.insert(WorkloadResource::TYPE_NAME, WorkloadResource::schema());
        resources.insert(CollectionResource::TYPE_NAME, CollectionResource::schema());
        resources.insert(GroupResource::TYPE_NAME, GroupResource::schema());
        resources.insert(GroupMembershipResource::TYPE_NAME, GroupMembershipResource::schema());
        resources.insert(DefinitionResource::TYPE_NAME, DefinitionResource::schema());
        resources.insert(TemplateResource::TYPE_NAME, TemplateResource::schema());

        let mut data_sources = BTreeMap::new();
        data_sources.insert(AccountDataSource::TYPE_NAME, AccountDataSource::schema());
        data_sources.insert(CollectionDataSource::TYPE_NAME, CollectionDataSource::schema());

        ProviderSchema {
            type_name: KMI_PROVIDER_TYPE_NAME,
            provider: Self::provider_schema(),
            resources,
            data_sources,
        }
    }

    fn provider_schema() -> Schema {
        Schema::new(
            "Manages objects in a KMI server.",
            vec![
                Attribute::string("host")
                    .optional()
                    .description("URI for the KMI API. May also be provided via KMI_HOST."),
                Attribute::string("api_key")
                    .optional()
                    .sensitive()
                    .description("Client private key in PEM format. May also be provided via KMI_API_KEY."),
                Attribute::string("api_crt")
                    .optional()
                    .description("Client certificate in PEM format. May also be provided via KMI_API_CRT."),
                Attribute::string("akamai_ca")
                    .optional()
                    .description("CA bundle trusted for the KMI server. May also be provided via KMI_AKAMAI_CA."),
                Attribute::string("api_key_path")
                    .optional()
                    .sensitive()
                    .description("Path to the client private key. May also be provided via KMI_API_KEY_PATH."),
                Attribute::string("api_crt_path")
                    .optional()
                    .description("Path to the client certificate. May also be provided via KMI_API_CRT_PATH."),
                Attribute::string("akamai_ca_path")
                    .optional()
                    .description("Path to the CA bundle. May also be provided via KMI_AKAMAI_CA_PATH."),
                Attribute::string("proxy_host")
                    .optional()
                    .description("Proxy for all KMI requests. May also be provided via KMI_PROXY_HOST."),
                Attribute::number("http_timeout_secs").optional(),
                Attribute::number("collection_retry_initial_secs").optional(),
                Attribute::number("collection_retry_max_elapsed_secs").optional(),
            ],
        )
    }

    /// Configures the provider from the JSON provider block.
    pub fn configure(&mut self, config: Value) -> Result<(), Diagnostics> {
        let config = Config::from_json(config).map_err(|e| Diagnostics::error("Invalid provider configuration", e))?;
        self.configure_with(&config, |name| env::var(name).ok())
    }

    /// Configures the provider, looking up unset values through `env`.
    pub fn configure_with<F>(&mut self, config: &Config, env: F) -> Result<(), Diagnostics>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = config.resolve_connection(env)?;
        let client = KmiClient::new(&settings).map_err(|e| {
            Diagnostics::error(
                "Unable to Create KMI API Client",
                format!(
                    "An unexpected error occurred when creating the KMI API client. KMI client error: {}",
                    e
                ),
            )
        })?;

        info!("Configured KMI provider for {}", client.host());
        self.data = Some(ProviderData {
            client,
            retry: config.distribution_retry(),
        });
        Ok(())
    }

    fn data(&self) -> Result<&ProviderData, Diagnostics> {
        self.data.as_ref().ok_or_else(|| {
            Diagnostics::error(
                "Unconfigured provider",
                "The provider must be configured before resources or data sources are used.",
            )
        })
    }
}

/// # Resource lifecycle
impl KmiProvider {
    pub async fn create(&self, type_name: &str, plan: Value) -> Result<Value, Diagnostics> {
        self.dispatch(type_name, ResourceCall::Create(plan))
            .await
            .map(Option::unwrap_or_default)
    }

    /// Refreshes a resource. Returns `None` if it should be removed from
    /// the state.
    pub async fn read(&self, type_name: &str, state: Value) -> Result<Option<Value>, Diagnostics> {
        self.dispatch(type_name, ResourceCall::Read(state)).await
    }

    pub async fn update(&self, type_name: &str, prior: Value, plan: Value) -> Result<Value, Diagnostics> {
        self.dispatch(type_name, ResourceCall::Update(prior, plan))
            .await
            .map(Option::unwrap_or_default)
    }

    pub async fn delete(&self, type_name: &str, state: Value) -> Result<(), Diagnostics> {
        self.dispatch(type_name, ResourceCall::Delete(state)).await.map(|_| ())
    }

    pub async fn read_data_source(&self, type_name: &str, config: Value) -> Result<Value, Diagnostics> {
        let data = self.data()?;
        debug!("Reading data source {}", type_name);
        match type_name {
            AccountDataSource::TYPE_NAME => call_data_source::<AccountDataSource>(data, config).await,
            CollectionDataSource::TYPE_NAME => call_data_source::<CollectionDataSource>(data, config).await,
            _ => Err(Diagnostics::error(
                "Unknown data source type",
                format!("The provider has no data source '{}'", type_name),
            )),
        }
    }

    async fn dispatch(&self, type_name: &str, call: ResourceCall) -> Result<Option<Value>, Diagnostics> {
        let data = self.data()?;
        debug!("{} {}", call.name(), type_name);
        match type_name {
            EngineResource::TYPE_NAME => call_resource::<EngineResource>(data, call).await,
            WorkloadResource::TYPE_NAME => call_resource::<WorkloadResource>(data, call).await,
            CollectionResource::TYPE_NAME => call_resource::<CollectionResource>(data, call).await,
            GroupResource::TYPE_NAME => call_resource::<GroupResource>(data, call).await,
            GroupMembershipResource::TYPE_NAME => call_resource::<GroupMembershipResource>(data, call).await,
            DefinitionResource::TYPE_NAME => call_resource::<DefinitionResource>(data, call).await,
            TemplateResource::TYPE_NAME => call_resource::<TemplateResource>(data, call).await,
            _ => Err(Diagnostics::error(
                "Unknown resource type",
                format!("The provider has no resource '{}'", type_name),
            )),
        }
    }
}

//------------ ResourceCall --------------------------------------------------

enum ResourceCall {
    Create(Value),
    Read(Value),
    Update(Value, Value),
    Delete(Value),
}

impl ResourceCall {
    fn name(&self) -> &'static str {
        match self {
            ResourceCall::Create(_) => "Create",
            ResourceCall::Read(_) => "Read",
            ResourceCall::Update(_, _) => "Update",
            ResourceCall::Delete(_) => "Delete",
        }
    }
}

async fn call_resource<R: Resource>(data: &ProviderData, call: ResourceCall) -> Result<Option<Value>, Diagnostics> {
    let resource = R::new(data);
    match call {
        ResourceCall::Create(plan) => {
            let state = resource.create(decode(R::TYPE_NAME, plan)?).await?;
            encode(R::TYPE_NAME, &state).map(Some)
        }
        ResourceCall::Read(state) => match resource.read(decode(R::TYPE_NAME, state)?).await? {
            Some(state) => encode(R::TYPE_NAME, &state).map(Some),
            None => {
                info!("{} no longer exists in KMI, removing it from state", R::TYPE_NAME);
                Ok(None)
            }
        },
        ResourceCall::Update(prior, plan) => {
            let prior = decode(R::TYPE_NAME, prior)?;
            let plan = decode(R::TYPE_NAME, plan)?;
            let state = resource.update(prior, plan).await?;
            encode(R::TYPE_NAME, &state).map(Some)
        }
        ResourceCall::Delete(state) => {
            resource.delete(decode(R::TYPE_NAME, state)?).await?;
            Ok(None)
        }
    }
}

async fn call_data_source<D: DataSource>(data: &ProviderData, config: Value) -> Result<Value, Diagnostics> {
    let source = D::new(data);
    let state = source.read(decode(D::TYPE_NAME, config)?).await?;
    encode(D::TYPE_NAME, &state)
}

fn decode<T: DeserializeOwned>(type_name: &str, value: Value) -> Result<T, Diagnostics> {
    serde_json::from_value(value).map_err(|e| {
        Diagnostics::error(
            "Invalid resource data",
            format!("Cannot decode data for {}: {}", type_name, e),
        )
    })
}

fn encode<T: Serialize>(type_name: &str, value: &T) -> Result<Value, Diagnostics> {
    serde_json::to_value(value).map_err(|e| {
        Diagnostics::error(
            "Invalid resource state",
            format!("Cannot encode state for {}: {}", type_name, e),
        )
    })
}

//------------ Tests ---------------------------------------------------------
