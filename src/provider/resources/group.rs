use log::info;
use serde::{Deserialize, Serialize};

use crate::kmi::{Group, GroupRequest, KmiClient};
use crate::provider::diagnostics::Diagnostics;
use crate::provider::resource::{ProviderData, Resource, found, timestamp};
use crate::provider::schema::{Attribute, Schema};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GroupModel {
    pub group_name: String,
    pub account_name: String,
    pub adders: Option<String>,
    pub modifiers: Option<String>,
    pub last_updated: Option<String>,
}

impl GroupModel {
    fn apply(&mut self, group: Group) {
        if !group.account.is_empty() {
            self.account_name = group.account;
        }
        self.adders = Some(group.adders);
        self.modifiers = Some(group.modifiers);
    }
}

/// A union group in an account.
pub struct GroupResource {
    client: KmiClient,
}

impl GroupResource {
    async fn save(&self, mut plan: GroupModel) -> Result<GroupModel, Diagnostics> {
        let request = GroupRequest {
            account: plan.account_name.clone(),
        };
        self.client
            .save_group(&plan.group_name, &request)
            .await
            .map_err(|e| Diagnostics::error("Error creating group", e))?;

        let group = self
            .client
            .group(&plan.group_name)
            .await
            .map_err(|e| Diagnostics::error("Error reading group", e))?;
        plan.apply(group);
        plan.last_updated = Some(timestamp());
        Ok(plan)
    }
}

impl Resource for GroupResource {
    const TYPE_NAME: &'static str = "kmi_group";

    type Model = GroupModel;

    fn new(data: &ProviderData) -> Self {
        GroupResource {
            client: data.client.clone(),
        }
    }

    fn schema() -> Schema {
        Schema::new(
            "A union group in a KMI account.",
            vec![
                Attribute::string("group_name").required().description("The name of the group."),
                Attribute::string("account_name").required(),
                Attribute::string("adders").computed(),
                Attribute::string("modifiers").computed(),
                Attribute::string("last_updated")
                    .computed()
                    .description("The last time the group was updated."),
            ],
        )
    }

    async fn create(&self, plan: GroupModel) -> Result<GroupModel, Diagnostics> {
        let created = self.save(plan).await?;
        info!("Created group '{}' in account '{}'", created.group_name, created.account_name);
        Ok(created)
    }

    async fn read(&self, mut state: GroupModel) -> Result<Option<GroupModel>, Diagnostics> {
        let group = found(self.client.group(&state.group_name).await)
            .map_err(|e| Diagnostics::error("Error reading group", e))?;
        Ok(group.map(|group| {
            state.apply(group);
            state
        }))
    }

    async fn update(&self, _prior: GroupModel, plan: GroupModel) -> Result<GroupModel, Diagnostics> {
        self.save(plan).await
    }

    async fn delete(&self, state: GroupModel) -> Result<(), Diagnostics> {
        self.client
            .delete_group(&state.group_name)
            .await
            .map_err(|e| Diagnostics::error("Error deleting group", e))
    }
}
