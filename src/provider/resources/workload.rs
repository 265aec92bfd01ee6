use log::info;
use serde::{Deserialize, Serialize};

use crate::kmi::{KmiClient, Workload, WorkloadRequest};
use crate::provider::diagnostics::Diagnostics;
use crate::provider::resource::{ProviderData, Resource, found, non_empty, timestamp};
use crate::provider::schema::{Attribute, Schema};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct WorkloadModel {
    pub name: String,
    pub account: String,
    pub engine: String,
    pub region: String,
    pub linode_label: Option<String>,
    pub last_updated: Option<String>,
}

impl WorkloadModel {
    fn request(&self) -> WorkloadRequest {
        WorkloadRequest {
            projection: self.name.clone(),
            service_account: None,
            region: Some(self.region.clone()),
            linode_label: self.linode_label.clone(),
        }
    }

    fn apply(&mut self, workload: Workload) {
        self.region = workload.region.value;
        self.linode_label = non_empty(workload.linode_label.value);
    }
}

/// A single workload of an existing identity engine.
pub struct WorkloadResource {
    client: KmiClient,
}

impl WorkloadResource {
    async fn save(&self, mut plan: WorkloadModel) -> Result<WorkloadModel, Diagnostics> {
        self.client
            .save_workload(&plan.account, &plan.engine, &plan.request())
            .await
            .map_err(|e| Diagnostics::error("Error creating workload", e))?;

        let workload = self
            .client
            .workload(&plan.account, &plan.engine, &plan.name)
            .await
            .map_err(|e| Diagnostics::error("Error reading workload", e))?;
        plan.apply(workload);
        plan.last_updated = Some(timestamp());
        Ok(plan)
    }
}

impl Resource for WorkloadResource {
    const TYPE_NAME: &'static str = "kmi_workload";

    type Model = WorkloadModel;

    fn new(data: &ProviderData) -> Self {
        WorkloadResource {
            client: data.client.clone(),
        }
    }

    fn schema() -> Schema {
        Schema::new(
            "A workload (projection) of an identity engine.",
            vec![
                Attribute::string("name").required().description("The name of the workload."),
                Attribute::string("account").required().description("The KMI account owning the engine."),
                Attribute::string("engine").required().description("The identity engine."),
                Attribute::string("region").required(),
                Attribute::string("linode_label").optional(),
                Attribute::string("last_updated").computed(),
            ],
        )
    }

    async fn create(&self, plan: WorkloadModel) -> Result<WorkloadModel, Diagnostics> {
        let created = self.save(plan).await?;
        info!("Created workload '{}' of engine '{}'", created.name, created.engine);
        Ok(created)
    }

    async fn read(&self, mut state: WorkloadModel) -> Result<Option<WorkloadModel>, Diagnostics> {
        let workload = found(self.client.workload(&state.account, &state.engine, &state.name).await)
            .map_err(|e| Diagnostics::error("Error reading workload", e))?;
        Ok(workload.map(|workload| {
            state.apply(workload);
            state
        }))
    }

    async fn update(&self, _prior: WorkloadModel, plan: WorkloadModel) -> Result<WorkloadModel, Diagnostics> {
        self.save(plan).await
    }

    async fn delete(&self, state: WorkloadModel) -> Result<(), Diagnostics> {
        self.client
            .delete_workload(&state.account, &state.engine, &state.name)
            .await
            .map_err(|e| Diagnostics::error("Error deleting workload", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmi::SourcedValue;

    #[test]
    fn clear_label_when_kmi_reports_none() {
        let mut model = WorkloadModel {
            name: "wl".to_string(),
            region: "us-east".to_string(),
            linode_label: Some("*".to_string()),
            ..Default::default()
        };
        model.apply(Workload {
            region: SourcedValue {
                value: "eu-west".to_string(),
                source: "kmi".to_string(),
            },
            ..Default::default()
        });
        assert_eq!(model.region, "eu-west");
        assert_eq!(model.linode_label, None);
    }
}
