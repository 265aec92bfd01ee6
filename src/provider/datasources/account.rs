use serde::{Deserialize, Serialize};

use crate::kmi::{AccountCollection, AccountDetails, AccountEngine, AccountGroup, KmiClient};
use crate::provider::diagnostics::Diagnostics;
use crate::provider::resource::{DataSource, ProviderData};
use crate::provider::schema::{Attribute, Schema};

//------------ AccountModel --------------------------------------------------

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AccountModel {
    pub account_name: String,
    #[serde(default)]
    pub engines: Vec<AccountEngineModel>,
    #[serde(default)]
    pub collections: Vec<AccountCollectionModel>,
    #[serde(default)]
    pub groups: Vec<AccountGroupModel>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AccountEngineModel {
    pub name: String,
    pub cloud: String,
    pub adders: String,
    pub modifiers: String,
    pub modified: i64,
    pub source: String,
    pub published: String,
    pub published_location: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AccountCollectionModel {
    pub name: String,
    pub source: String,
    pub readers: String,
    pub adders: String,
    pub modifiers: String,
    pub modified: i64,
    pub distributed: i64,
    pub distributed_date: String,
    pub keyspace: String,
    pub account: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AccountGroupModel {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub account: String,
    pub engine: String,
    pub projection: String,
}

impl From<AccountEngine> for AccountEngineModel {
    fn from(e: AccountEngine) -> Self {
        AccountEngineModel {
            name: e.name,
            cloud: e.cloud,
            adders: e.adders,
            modifiers: e.modifiers,
            modified: e.modified,
            source: e.source,
            published: e.published,
            published_location: e.published_location,
        }
    }
}

impl From<AccountCollection> for AccountCollectionModel {
    fn from(c: AccountCollection) -> Self {
        AccountCollectionModel {
            name: c.name,
            source: c.source,
            readers: c.readers,
            adders: c.adders,
            modifiers: c.modifiers,
            modified: c.modified,
            distributed: c.distributed,
            distributed_date: c.distributed_date,
            keyspace: c.keyspace,
            account: c.account,
        }
    }
}

impl From<AccountGroup> for AccountGroupModel {
    fn from(g: AccountGroup) -> Self {
        AccountGroupModel {
            name: g.name,
            kind: g.kind,
            source: g.source,
            account: g.account,
            engine: g.engine,
            projection: g.projection,
        }
    }
}

impl AccountModel {
    fn from_details(account_name: String, details: AccountDetails) -> Self {
        AccountModel {
            account_name,
            engines: details.engines.into_iter().map(Into::into).collect(),
            collections: details.collections.into_iter().map(Into::into).collect(),
            groups: details.groups.into_iter().map(Into::into).collect(),
        }
    }
}

//------------ AccountDataSource ---------------------------------------------

/// The engines, collections and groups of an account.
pub struct AccountDataSource {
    client: KmiClient,
}

impl DataSource for AccountDataSource {
    const TYPE_NAME: &'static str = "kmi_account";

    type Model = AccountModel;

    fn new(data: &ProviderData) -> Self {
        AccountDataSource {
            client: data.client.clone(),
        }
    }

    fn schema() -> Schema {
        Schema::new(
            "Lists the direct children of a KMI account.",
            vec![
                Attribute::string("account_name")
                    .required()
                    .description("The name of the account that KMI has been enabled for."),
                Attribute::object_list(
                    "engines",
                    vec![
                        Attribute::string("name").computed(),
                        Attribute::string("cloud").computed(),
                        Attribute::string("adders").computed(),
                        Attribute::string("modifiers").computed(),
                        Attribute::number("modified").computed(),
                        Attribute::string("source").computed(),
                        Attribute::string("published").computed(),
                        Attribute::string("published_location").computed(),
                    ],
                )
                .computed(),
                Attribute::object_list(
                    "collections",
                    vec![
                        Attribute::string("name").computed(),
                        Attribute::string("source").computed(),
                        Attribute::string("readers").computed(),
                        Attribute::string("adders").computed(),
                        Attribute::string("modifiers").computed(),
                        Attribute::number("modified").computed(),
                        Attribute::number("distributed").computed(),
                        Attribute::string("distributed_date").computed(),
                        Attribute::string("keyspace").computed(),
                        Attribute::string("account").computed(),
                    ],
                )
                .computed(),
                Attribute::object_list(
                    "groups",
                    vec![
                        Attribute::string("name").computed(),
                        Attribute::string("type").computed(),
                        Attribute::string("source").computed(),
                        Attribute::string("account").computed(),
                        Attribute::string("engine").computed(),
                        Attribute::string("projection").computed(),
                    ],
                )
                .computed(),
            ],
        )
    }

    async fn read(&self, config: AccountModel) -> Result<AccountModel, Diagnostics> {
        let details = self.client.account(&config.account_name).await.map_err(|e| {
            Diagnostics::error(
                "Unable to read KMI account",
                format!("Could not read account '{}': {}", config.account_name, e),
            )
        })?;
        Ok(AccountModel::from_details(config.account_name, details))
    }
}
