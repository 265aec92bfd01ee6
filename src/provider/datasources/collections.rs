use serde::{Deserialize, Serialize};

use crate::kmi::KmiClient;
use crate::provider::diagnostics::Diagnostics;
use crate::provider::resource::{DataSource, ProviderData};
use crate::provider::schema::{Attribute, Schema};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CollectionDataModel {
    pub name: String,
    pub account_name: Option<String>,
    pub adders: Option<String>,
    pub modifiers: Option<String>,
    pub readers: Option<String>,
    pub distributed_date: Option<String>,
    #[serde(default)]
    pub definitions: Vec<String>,
}

/// Looks up an existing collection by name.
pub struct CollectionDataSource {
    client: KmiClient,
}

impl DataSource for CollectionDataSource {
    const TYPE_NAME: &'static str = "kmi_collections";

    type Model = CollectionDataModel;

    fn new(data: &ProviderData) -> Self {
        CollectionDataSource {
            client: data.client.clone(),
        }
    }

    fn schema() -> Schema {
        Schema::new(
            "Reads an existing KMI collection.",
            vec![
                Attribute::string("name").required().description("The name of the collection."),
                Attribute::string("account_name")
                    .optional()
                    .computed()
                    .description("The account owning the collection."),
                Attribute::string("adders").computed(),
                Attribute::string("modifiers").computed(),
                Attribute::string("readers").computed(),
                Attribute::string("distributed_date").computed(),
                Attribute::string_list("definitions")
                    .computed()
                    .description("The names of the definitions in the collection."),
            ],
        )
    }

    async fn read(&self, config: CollectionDataModel) -> Result<CollectionDataModel, Diagnostics> {
        let collection = self.client.collection(&config.name).await.map_err(|e| {
            Diagnostics::error(
                "Error reading collection",
                format!("Could not read collection '{}': {}", config.name, e),
            )
        })?;

        Ok(CollectionDataModel {
            name: collection.name,
            account_name: Some(collection.account),
            adders: Some(collection.adders),
            modifiers: Some(collection.modifiers),
            readers: Some(collection.readers),
            distributed_date: Some(collection.distributed_date),
            definitions: collection.definitions,
        })
    }
}
