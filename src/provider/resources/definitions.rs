use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::kmi::{BlockSecret, Definition, DefinitionOption, DefinitionRequest, KmiClient};
use crate::provider::diagnostics::{Diagnostic, Diagnostics};
use crate::provider::resource::{ProviderData, Resource, found, timestamp};
use crate::provider::schema::{Attribute, Schema};

//------------ DefinitionModel -----------------------------------------------

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DefinitionModel {
    pub name: String,
    pub collection_name: String,
    pub adders: Option<String>,
    pub modifiers: Option<String>,
    pub ssl_cert: Option<SslCertModel>,
    pub azure_sp: Option<AzureSpModel>,
    pub symmetric_key: Option<SymmetricKeyModel>,
    pub opaque: Option<String>,
    #[serde(default)]
    pub option: Vec<OptionModel>,
    pub secret_indexes: Option<String>,
    pub last_updated: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SslCertModel {
    pub auto_generate: bool,
    pub is_ca: Option<bool>,
    pub subject: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AzureSpModel {
    pub auto_generate: bool,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SymmetricKeyModel {
    pub auto_generate: bool,
    pub expire_period: String,
    pub refresh_period: String,
    pub key_size_bytes: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OptionModel {
    pub name: String,
    pub value: String,
}

/// The kind of a definition, as chosen through one of the nested
/// attributes.
#[derive(Debug, Eq, PartialEq)]
enum DefinitionKind<'a> {
    SslCert(&'a SslCertModel),
    AzureSp(&'a AzureSpModel),
    SymmetricKey(&'a SymmetricKeyModel),
    Opaque(&'a str),
}

impl DefinitionModel {
    /// Returns the single kind configured for this definition.
    fn kind(&self) -> Result<DefinitionKind<'_>, Diagnostics> {
        let mut kinds = vec![];
        if let Some(ssl_cert) = &self.ssl_cert {
            kinds.push(DefinitionKind::SslCert(ssl_cert));
        }
        if let Some(azure_sp) = &self.azure_sp {
            kinds.push(DefinitionKind::AzureSp(azure_sp));
        }
        if let Some(symmetric_key) = &self.symmetric_key {
            kinds.push(DefinitionKind::SymmetricKey(symmetric_key));
        }
        if let Some(opaque) = &self.opaque {
            kinds.push(DefinitionKind::Opaque(opaque));
        }

        match kinds.len() {
            1 => Ok(kinds.remove(0)),
            0 => Err(Diagnostic::error(
                "Missing definition type",
                "Exactly one of ssl_cert, azure_sp, symmetric_key or opaque must be set.",
            )
            .into()),
            _ => Err(Diagnostic::error(
                "Conflicting definition types",
                "Only one of ssl_cert, azure_sp, symmetric_key or opaque may be set.",
            )
            .into()),
        }
    }

    fn request(&self, kind: &DefinitionKind<'_>) -> DefinitionRequest {
        let mut request = DefinitionRequest {
            adders: self.adders.clone(),
            modifiers: self.modifiers.clone(),
            ..Default::default()
        };

        match kind {
            DefinitionKind::SslCert(ssl_cert) => {
                request.kind = "ssl_cert".to_string();
                request.auto_generate = Some(ssl_cert.auto_generate);
                if let Some(is_ca) = ssl_cert.is_ca {
                    request
                        .options
                        .push(DefinitionOption::new("is_ca", if is_ca { "1" } else { "0" }));
                }
                if let Some(subject) = &ssl_cert.subject {
                    request.options.push(DefinitionOption::new("subject", subject));
                }
            }
            DefinitionKind::AzureSp(azure_sp) => {
                request.kind = "azure_sp".to_string();
                request.auto_generate = Some(azure_sp.auto_generate);
            }
            DefinitionKind::SymmetricKey(key) => {
                request.kind = "symmetric_key".to_string();
                request.auto_generate = Some(key.auto_generate);
                request.expire_period = Some(key.expire_period.clone());
                request.refresh_period = Some(key.refresh_period.clone());
                if let Some(size) = key.key_size_bytes {
                    request
                        .options
                        .push(DefinitionOption::new("key_size_bytes", size.to_string()));
                }
            }
            DefinitionKind::Opaque(_) => {
                request.kind = "opaque".to_string();
            }
        }

        request
    }

    fn apply(&mut self, definition: &Definition) {
        self.option = definition
            .options
            .iter()
            .map(|o| OptionModel {
                name: o.name.clone(),
                value: o.value.clone(),
            })
            .collect();
        self.secret_indexes = Some(definition.secret_indexes());
    }
}

//------------ DefinitionResource --------------------------------------------

/// A secret definition inside a collection.
pub struct DefinitionResource {
    client: KmiClient,
}

impl DefinitionResource {
    async fn save(&self, mut plan: DefinitionModel) -> Result<DefinitionModel, Diagnostics> {
        let kind = plan.kind()?;
        let request = plan.request(&kind);

        self.client
            .save_definition(&plan.collection_name, &plan.name, &request)
            .await
            .map_err(|e| Diagnostics::error("Error creating definition", e))?;

        if let DefinitionKind::Opaque(value) = kind {
            debug!("Uploading opaque secret for definition '{}'", plan.name);
            self.client
                .add_block_secret(&plan.collection_name, &plan.name, &BlockSecret::opaque(value))
                .await
                .map_err(|e| Diagnostics::error("Error adding opaque secret", e))?;
        }

        let definition = self
            .client
            .definition(&plan.collection_name, &plan.name)
            .await
            .map_err(|e| Diagnostics::error("Error reading definition", e))?;
        plan.apply(&definition);
        plan.last_updated = Some(timestamp());
        Ok(plan)
    }
}

impl Resource for DefinitionResource {
    const TYPE_NAME: &'static str = "kmi_definitions";

    type Model = DefinitionModel;

    fn new(data: &ProviderData) -> Self {
        DefinitionResource {
            client: data.client.clone(),
        }
    }

    fn schema() -> Schema {
        Schema::new(
            "A secret definition. Exactly one of ssl_cert, azure_sp, symmetric_key and opaque must be set.",
            vec![
                Attribute::string("name").required().description("The name of the definition."),
                Attribute::string("collection_name").required(),
                Attribute::string("adders").optional(),
                Attribute::string("modifiers").optional(),
                Attribute::object(
                    "ssl_cert",
                    vec![
                        Attribute::bool("auto_generate").required(),
                        Attribute::bool("is_ca").optional(),
                        Attribute::string("subject").optional(),
                    ],
                )
                .optional(),
                Attribute::object("azure_sp", vec![Attribute::bool("auto_generate").required()]).optional(),
                Attribute::object(
                    "symmetric_key",
                    vec![
                        Attribute::bool("auto_generate").required(),
                        Attribute::string("expire_period").required(),
                        Attribute::string("refresh_period").required(),
                        Attribute::number("key_size_bytes").optional(),
                    ],
                )
                .optional(),
                Attribute::string("opaque")
                    .optional()
                    .sensitive()
                    .description("The value of an opaque secret."),
                Attribute::object_list(
                    "option",
                    vec![
                        Attribute::string("name").computed(),
                        Attribute::string("value").computed(),
                    ],
                )
                .computed(),
                Attribute::string("secret_indexes").computed(),
                Attribute::string("last_updated").computed(),
            ],
        )
    }

    async fn create(&self, plan: DefinitionModel) -> Result<DefinitionModel, Diagnostics> {
        let created = self.save(plan).await?;
        info!(
            "Created definition '{}' in collection '{}'",
            created.name, created.collection_name
        );
        Ok(created)
    }

    async fn read(&self, mut state: DefinitionModel) -> Result<Option<DefinitionModel>, Diagnostics> {
        let definition = found(self.client.definition(&state.collection_name, &state.name).await)
            .map_err(|e| Diagnostics::error("Error reading definition", e))?;
        Ok(definition.map(|definition| {
            state.apply(&definition);
            state
        }))
    }

    async fn update(&self, _prior: DefinitionModel, plan: DefinitionModel) -> Result<DefinitionModel, Diagnostics> {
        self.save(plan).await
    }

    async fn delete(&self, state: DefinitionModel) -> Result<(), Diagnostics> {
        self.client
            .delete_definition(&state.collection_name, &state.name)
            .await
            .map_err(|e| Diagnostics::error("Error deleting definition", e))
    }
}

//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmi::ToXml;

    fn model() -> DefinitionModel {
        DefinitionModel {
            name: "pim_test_def".to_string(),
            collection_name: "pim_test_col".to_string(),
            ..Default::default()
        }
    }

    fn request_xml(model: &DefinitionModel) -> String {
        let kind = model.kind().unwrap();
        model.request(&kind).to_xml().unwrap()
    }

    #[test]
    fn ssl_cert_with_ca_flag() {
        let model = DefinitionModel {
            ssl_cert: Some(SslCertModel {
                auto_generate: true,
                is_ca: Some(true),
                subject: None,
            }),
            ..model()
        };
        assert_eq!(
            request_xml(&model),
            r#"<definition type="ssl_cert"><auto_generate>True</auto_generate><option name="is_ca">1</option></definition>"#
        );
    }

    #[test]
    fn ssl_cert_with_subject() {
        let model = DefinitionModel {
            ssl_cert: Some(SslCertModel {
                auto_generate: true,
                is_ca: None,
                subject: Some("/CN=test-user".to_string()),
            }),
            ..model()
        };
        assert_eq!(
            request_xml(&model),
            r#"<definition type="ssl_cert"><auto_generate>True</auto_generate><option name="subject">/CN=test-user</option></definition>"#
        );
    }

    #[test]
    fn symmetric_key_with_adders() {
        let model = DefinitionModel {
            adders: Some("test_adder".to_string()),
            symmetric_key: Some(SymmetricKeyModel {
                auto_generate: true,
                expire_period: "3 months".to_string(),
                refresh_period: "1 months".to_string(),
                key_size_bytes: Some(16),
            }),
            ..model()
        };
        assert_eq!(
            request_xml(&model),
            concat!(
                r#"<definition type="symmetric_key"><adders>test_adder</adders>"#,
                r#"<expire_period>3 months</expire_period><refresh_period>1 months</refresh_period>"#,
                r#"<auto_generate>True</auto_generate><option name="key_size_bytes">16</option></definition>"#
            )
        );
    }

    #[test]
    fn azure_sp_and_opaque() {
        let azure = DefinitionModel {
            azure_sp: Some(AzureSpModel { auto_generate: false }),
            ..model()
        };
        assert_eq!(
            request_xml(&azure),
            r#"<definition type="azure_sp"><auto_generate>False</auto_generate></definition>"#
        );

        let opaque = DefinitionModel {
            opaque: Some("test".to_string()),
            ..model()
        };
        assert_eq!(opaque.kind().unwrap(), DefinitionKind::Opaque("test"));
        assert_eq!(request_xml(&opaque), r#"<definition type="opaque"></definition>"#);
    }

    #[test]
    fn require_exactly_one_kind() {
        let none = model();
        let err = none.kind().unwrap_err();
        assert_eq!(err.iter().next().unwrap().summary, "Missing definition type");

        let both = DefinitionModel {
            azure_sp: Some(AzureSpModel { auto_generate: true }),
            opaque: Some("test".to_string()),
            ..model()
        };
        let err = both.kind().unwrap_err();
        assert_eq!(err.iter().next().unwrap().summary, "Conflicting definition types");
    }
}
