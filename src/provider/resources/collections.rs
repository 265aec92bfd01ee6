use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::kmi::{Collection, CollectionRequest, DistributionRetry, KmiClient};
use crate::provider::diagnostics::Diagnostics;
use crate::provider::resource::{ProviderData, Resource, found, non_empty, timestamp};
use crate::provider::schema::{Attribute, Schema};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CollectionModel {
    pub name: String,
    pub account_name: String,
    pub adders: String,
    pub modifiers: String,
    pub readers: String,
    pub last_updated: Option<String>,
    pub distributed_date: Option<String>,
}

impl CollectionModel {
    fn request(&self) -> CollectionRequest {
        CollectionRequest {
            adders: self.adders.clone(),
            modifiers: self.modifiers.clone(),
            readers: self.readers.clone(),
        }
    }

    fn apply(&mut self, collection: Collection) {
        self.name = collection.name;
        self.account_name = collection.account;
        self.adders = collection.adders;
        self.modifiers = collection.modifiers;
        self.readers = collection.readers;
        self.distributed_date = non_empty(collection.distributed_date);
    }
}

/// A collection of secret definitions.
///
/// KMI distributes new collections asynchronously. Creating one only
/// completes once the collection has been distributed.
pub struct CollectionResource {
    client: KmiClient,
    retry: DistributionRetry,
}

impl CollectionResource {
    async fn post(&self, plan: &CollectionModel) -> Result<(), Diagnostics> {
        self.client
            .save_collection(&plan.account_name, &plan.name, &plan.request())
            .await
            .map_err(|e| Diagnostics::error("Error creating collection", e))
    }
}

impl Resource for CollectionResource {
    const TYPE_NAME: &'static str = "kmi_collections";

    type Model = CollectionModel;

    fn new(data: &ProviderData) -> Self {
        CollectionResource {
            client: data.client.clone(),
            retry: data.retry.clone(),
        }
    }

    fn schema() -> Schema {
        Schema::new(
            "A KMI collection.",
            vec![
                Attribute::string("name").required().description("The name of the collection."),
                Attribute::string("account_name").required(),
                Attribute::string("adders").required().description("The group allowed to add definitions."),
                Attribute::string("modifiers")
                    .required()
                    .description("The group allowed to modify the collection."),
                Attribute::string("readers")
                    .required()
                    .description("The group allowed to read secrets. It must exist."),
                Attribute::string("last_updated").computed(),
                Attribute::string("distributed_date").computed(),
            ],
        )
    }

    async fn create(&self, mut plan: CollectionModel) -> Result<CollectionModel, Diagnostics> {
        self.client.group(&plan.readers).await.map_err(|e| {
            Diagnostics::error(
                "Error reading reader group",
                format!("Could not find reader group '{}': {}", plan.readers, e),
            )
        })?;

        self.post(&plan).await?;
        debug!("Waiting for collection '{}' to be distributed", plan.name);

        let collection = self
            .client
            .wait_for_distribution(&plan.name, &self.retry)
            .await
            .map_err(|e| Diagnostics::error("Error waiting for collection distribution", e))?;

        plan.apply(collection);
        plan.last_updated = Some(timestamp());
        info!("Created collection '{}' in account '{}'", plan.name, plan.account_name);
        Ok(plan)
    }

    async fn read(&self, mut state: CollectionModel) -> Result<Option<CollectionModel>, Diagnostics> {
        let collection = found(self.client.collection(&state.name).await)
            .map_err(|e| Diagnostics::error("Error reading collection", e))?;
        Ok(collection.map(|collection| {
            state.apply(collection);
            state
        }))
    }

    async fn update(&self, _prior: CollectionModel, mut plan: CollectionModel) -> Result<CollectionModel, Diagnostics> {
        self.post(&plan).await?;
        let collection = self
            .client
            .collection(&plan.name)
            .await
            .map_err(|e| Diagnostics::error("Error reading collection", e))?;
        plan.apply(collection);
        plan.last_updated = Some(timestamp());
        Ok(plan)
    }

    async fn delete(&self, state: CollectionModel) -> Result<(), Diagnostics> {
        self.client
            .delete_collection(&state.name)
            .await
            .map_err(|e| Diagnostics::error("Error deleting collection", e))
    }
}
