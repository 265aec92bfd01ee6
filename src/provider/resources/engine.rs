use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::constants::ENGINE_DEFAULT_CLOUD;
use crate::kmi::{
    ENGINE_OPTION_CAS_BASE64, ENGINE_OPTION_ENDPOINT_URL, EngineRequest, KmiClient, ServiceAccount, WorkloadRequest,
};
use crate::provider::diagnostics::{Diagnostic, Diagnostics};
use crate::provider::resource::{ProviderData, Resource, found, non_empty, timestamp};
use crate::provider::schema::{Attribute, Schema};

//------------ EngineModel ---------------------------------------------------

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EngineModel {
    pub engine: String,
    pub account_name: String,
    pub cloud: Option<String>,
    pub api_endpoint: String,
    pub cas_base64: String,
    pub source: Option<String>,
    pub workloads: Vec<EngineWorkloadModel>,
    pub last_updated: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EngineWorkloadModel {
    pub name: String,
    pub serviceaccount: String,
    pub namespace: String,
    pub region: String,
}

impl EngineModel {
    fn request(&self) -> EngineRequest {
        let cloud = self
            .cloud
            .clone()
            .and_then(non_empty)
            .unwrap_or_else(|| ENGINE_DEFAULT_CLOUD.to_string());

        EngineRequest {
            cloud,
            cas_base64: self.cas_base64.clone(),
            endpoint_url: self.api_endpoint.clone(),
            workloads: self
                .workloads
                .iter()
                .map(|w| WorkloadRequest {
                    projection: w.name.clone(),
                    service_account: Some(ServiceAccount::new(&w.namespace, &w.serviceaccount)),
                    region: Some(w.region.clone()),
                    linode_label: None,
                })
                .collect(),
        }
    }
}

//------------ EngineResource ------------------------------------------------

/// A Kubernetes identity engine together with its workloads.
pub struct EngineResource {
    client: KmiClient,
}

impl EngineResource {
    /// Refreshes the model from KMI.
    ///
    /// Only the named workloads are looked up. Without names, the
    /// workloads the engine itself lists are used.
    async fn refresh(
        &self,
        mut model: EngineModel,
        names: Option<Vec<String>>,
    ) -> Result<Option<EngineModel>, Diagnostics> {
        let engine = match found(self.client.engine(&model.account_name, &model.engine).await) {
            Ok(Some(engine)) => engine,
            Ok(None) => return Ok(None),
            Err(e) => return Err(Diagnostics::error("Error reading identity engine", e)),
        };

        let names = names.unwrap_or_else(|| engine.workloads.clone());
        let mut workloads = Vec::with_capacity(names.len());
        for name in &names {
            let workload = self.client.workload(&model.account_name, &model.engine, name).await;
            let workload = match found(workload) {
                Ok(Some(workload)) => workload,
                Ok(None) => {
                    debug!("Workload '{}' of engine '{}' is gone", name, model.engine);
                    continue;
                }
                Err(e) => return Err(Diagnostics::error("Error reading workload", e)),
            };
            let account = workload.service_account().map_err(|e| {
                Diagnostics::from(Diagnostic::attribute_error(
                    "workloads",
                    "Invalid service account format",
                    e.to_string(),
                ))
            })?;
            workloads.push(EngineWorkloadModel {
                name: workload.projection,
                serviceaccount: account.name,
                namespace: account.namespace,
                region: workload.region.value,
            });
        }
        model.workloads = workloads;

        if let Some(cloud) = non_empty(engine.cloud.clone()) {
            model.cloud = Some(cloud);
        }
        if let Some(cas) = engine.option(ENGINE_OPTION_CAS_BASE64) {
            model.cas_base64 = cas.to_string();
        }
        if let Some(endpoint) = engine.option(ENGINE_OPTION_ENDPOINT_URL) {
            model.api_endpoint = endpoint.to_string();
        }

        Ok(Some(model))
    }

    async fn save(&self, model: &EngineModel) -> Result<(), Diagnostics> {
        self.client
            .save_engine(&model.account_name, &model.engine, &model.request())
            .await
            .map_err(|e| Diagnostics::error("Error creating identity engine", e))
    }
}

impl Resource for EngineResource {
    const TYPE_NAME: &'static str = "kmi_engine";

    type Model = EngineModel;

    fn new(data: &ProviderData) -> Self {
        EngineResource {
            client: data.client.clone(),
        }
    }

    fn schema() -> Schema {
        Schema::new(
            "A Kubernetes identity engine and the workloads that may authenticate through it.",
            vec![
                Attribute::string("engine").required().description("The name of the engine."),
                Attribute::string("account_name").required().description("The KMI account owning the engine."),
                Attribute::string("cloud")
                    .optional()
                    .description("The cloud the cluster runs in. Defaults to 'linode'."),
                Attribute::string("api_endpoint")
                    .required()
                    .description("The URL of the Kubernetes API server."),
                Attribute::string("cas_base64")
                    .required()
                    .description("The base64 encoded CA certificates of the cluster."),
                Attribute::string("source").optional(),
                Attribute::object_list(
                    "workloads",
                    vec![
                        Attribute::string("name").required().description("The name of the workload."),
                        Attribute::string("serviceaccount").required(),
                        Attribute::string("namespace").required(),
                        Attribute::string("region").required(),
                    ],
                )
                .required(),
                Attribute::string("last_updated").computed(),
            ],
        )
    }

    async fn create(&self, mut plan: EngineModel) -> Result<EngineModel, Diagnostics> {
        self.save(&plan).await?;
        info!("Created identity engine '{}' in account '{}'", plan.engine, plan.account_name);
        plan.last_updated = Some(timestamp());
        Ok(plan)
    }

    async fn read(&self, state: EngineModel) -> Result<Option<EngineModel>, Diagnostics> {
        self.refresh(state, None).await
    }

    async fn update(&self, _prior: EngineModel, plan: EngineModel) -> Result<EngineModel, Diagnostics> {
        self.save(&plan).await?;
        let name = plan.engine.clone();
        let planned = plan.workloads.iter().map(|w| w.name.clone()).collect();
        let mut updated = self.refresh(plan, Some(planned)).await?.ok_or_else(|| {
            Diagnostics::error(
                "Error reading identity engine",
                format!("engine '{}' disappeared after update", name),
            )
        })?;
        updated.last_updated = Some(timestamp());
        Ok(updated)
    }

    async fn delete(&self, state: EngineModel) -> Result<(), Diagnostics> {
        let engine = match found(self.client.engine(&state.account_name, &state.engine).await) {
            Ok(Some(engine)) => engine,
            Ok(None) => return Ok(()),
            Err(e) => return Err(Diagnostics::error("Error reading identity engine", e)),
        };

        for workload in &engine.workloads {
            self.client
                .delete_workload(&state.account_name, &state.engine, workload)
                .await
                .map_err(|e| Diagnostics::error("Error deleting workload", e))?;
        }

        self.client
            .delete_engine(&state.account_name, &state.engine)
            .await
            .map_err(|e| Diagnostics::error("Error deleting identity engine", e))
    }
}
