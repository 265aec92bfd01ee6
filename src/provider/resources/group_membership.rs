use std::collections::BTreeSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::kmi::KmiClient;
use crate::provider::diagnostics::Diagnostics;
use crate::provider::resource::{ProviderData, Resource, found, timestamp};
use crate::provider::schema::{Attribute, Schema};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GroupMembershipModel {
    pub group_name: String,
    pub members: BTreeSet<String>,
    pub last_updated: Option<String>,
}

/// The members of an existing group.
///
/// Only the listed memberships are managed, the group itself is not.
pub struct GroupMembershipResource {
    client: KmiClient,
}

impl GroupMembershipResource {
    /// Adds all members, reporting every failure at once.
    async fn add_members<'a>(&self, group: &str, members: impl Iterator<Item = &'a String>) -> Result<(), Diagnostics> {
        let mut errors = vec![];
        for member in members {
            if let Err(e) = self.client.add_group_member(group, member).await {
                errors.push(format!("{}: {}", member, e));
            }
        }
        Self::report("Error adding group members", errors)
    }

    async fn remove_members<'a>(
        &self,
        group: &str,
        members: impl Iterator<Item = &'a String>,
    ) -> Result<(), Diagnostics> {
        let mut errors = vec![];
        for member in members {
            if let Err(e) = self.client.remove_group_member(group, member).await {
                errors.push(format!("{}: {}", member, e));
            }
        }
        Self::report("Error removing group members", errors)
    }

    fn report(summary: &str, errors: Vec<String>) -> Result<(), Diagnostics> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Diagnostics::error(summary, errors.join("\n")))
        }
    }
}

impl Resource for GroupMembershipResource {
    const TYPE_NAME: &'static str = "kmi_group_membership";

    type Model = GroupMembershipModel;

    fn new(data: &ProviderData) -> Self {
        GroupMembershipResource {
            client: data.client.clone(),
        }
    }

    fn schema() -> Schema {
        Schema::new(
            "Members of a KMI group.",
            vec![
                Attribute::string("group_name").required().description("The name of the parent group."),
                Attribute::string_set("members")
                    .required()
                    .description("The groups or hosts that are members of the group."),
                Attribute::string("last_updated").computed(),
            ],
        )
    }

    async fn create(&self, mut plan: GroupMembershipModel) -> Result<GroupMembershipModel, Diagnostics> {
        self.add_members(&plan.group_name, plan.members.iter()).await?;
        info!("Added {} member(s) to group '{}'", plan.members.len(), plan.group_name);
        plan.last_updated = Some(timestamp());
        Ok(plan)
    }

    async fn read(&self, state: GroupMembershipModel) -> Result<Option<GroupMembershipModel>, Diagnostics> {
        let group = found(self.client.group(&state.group_name).await)
            .map_err(|e| Diagnostics::error("Error reading group", e))?;
        Ok(group.map(|_| state))
    }

    async fn update(
        &self,
        prior: GroupMembershipModel,
        mut plan: GroupMembershipModel,
    ) -> Result<GroupMembershipModel, Diagnostics> {
        self.add_members(&plan.group_name, plan.members.iter()).await?;

        let dropped: Vec<&String> = prior.members.difference(&plan.members).collect();
        if !dropped.is_empty() {
            debug!("Removing {} member(s) from group '{}'", dropped.len(), plan.group_name);
            self.remove_members(&plan.group_name, dropped.into_iter()).await?;
        }

        plan.last_updated = Some(timestamp());
        Ok(plan)
    }

    async fn delete(&self, state: GroupMembershipModel) -> Result<(), Diagnostics> {
        self.remove_members(&state.group_name, state.members.iter()).await
    }
}
