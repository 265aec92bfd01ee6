use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::kmi::{Constraint, KmiClient, Template, TemplateRequest};
use crate::provider::diagnostics::Diagnostics;
use crate::provider::resource::{ProviderData, Resource, found, timestamp};
use crate::provider::schema::{Attribute, Schema};

/// The common name constraint value that allows any name.
const ANY_COMMON_NAME: &str = "*";

//------------ TemplateModel -------------------------------------------------

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TemplateModel {
    pub ca_collection: String,
    pub ca_definition: String,
    pub template_name: String,
    pub client_collection: String,
    pub options: TemplateOptions,
    pub last_updated: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TemplateOptions {
    pub min_ttl: Option<String>,
    pub max_ttl: Option<String>,
    pub leaf_exceeds_ca_ttl: Option<String>,
    pub allow_ca: Option<String>,
    pub common_name: Option<String>,
    pub dns_san: Option<String>,
    pub uri_san: Option<String>,
    pub ip_san: Option<String>,
    pub key_type: Option<String>,
    pub hash_type: Option<String>,
}

impl TemplateOptions {
    /// The constraints for all set options, in the order KMI expects.
    fn constraints(&self) -> Vec<Constraint> {
        let options = [
            ("common_name", &self.common_name),
            ("dns_san", &self.dns_san),
            ("uri_san", &self.uri_san),
            ("ip_san", &self.ip_san),
            ("key_type", &self.key_type),
            ("hash_type", &self.hash_type),
            ("allow_ca", &self.allow_ca),
            ("leaf_exceeds_ca_ttl", &self.leaf_exceeds_ca_ttl),
            ("max_ttl", &self.max_ttl),
            ("min_ttl", &self.min_ttl),
        ];
        options
            .into_iter()
            .filter_map(|(kind, value)| value.as_ref().map(|value| Constraint::new(kind, value)))
            .collect()
    }

    fn from_template(template: &Template) -> Self {
        let mut options = TemplateOptions::default();
        for constraint in &template.constraints {
            let value = Some(constraint.value.clone());
            match constraint.kind.as_str() {
                "common_name" if constraint.value != ANY_COMMON_NAME => options.common_name = value,
                "dns_san" => options.dns_san = value,
                "uri_san" => options.uri_san = value,
                "ip_san" => options.ip_san = value,
                "key_type" => options.key_type = value,
                "hash_type" => options.hash_type = value,
                "allow_ca" => options.allow_ca = value,
                "leaf_exceeds_ca_ttl" => options.leaf_exceeds_ca_ttl = value,
                "max_ttl" => options.max_ttl = value,
                "min_ttl" => options.min_ttl = value,
                _ => {}
            }
        }
        options
    }
}

//------------ TemplateResource ----------------------------------------------

/// Certificate signing constraints for a CA definition, and the client
/// collection allowed to have certificates signed.
pub struct TemplateResource {
    client: KmiClient,
}

impl TemplateResource {
    async fn save(&self, mut plan: TemplateModel) -> Result<TemplateModel, Diagnostics> {
        let constraints = TemplateRequest::constraints(plan.options.constraints());
        debug!(
            "Posting {} constraint(s) to template '{}'",
            constraints.constraints.len(),
            plan.template_name
        );
        self.client
            .save_template(&plan.ca_collection, &plan.ca_definition, &plan.template_name, &constraints)
            .await
            .map_err(|e| Diagnostics::error("Error creating template", e))?;

        let signer = TemplateRequest::signer(plan.client_collection.clone());
        self.client
            .save_template(&plan.ca_collection, &plan.ca_definition, &plan.template_name, &signer)
            .await
            .map_err(|e| Diagnostics::error("Error signing the request", e))?;

        plan.last_updated = Some(timestamp());
        Ok(plan)
    }
}

impl Resource for TemplateResource {
    const TYPE_NAME: &'static str = "kmi_template";

    type Model = TemplateModel;

    fn new(data: &ProviderData) -> Self {
        TemplateResource {
            client: data.client.clone(),
        }
    }

    fn schema() -> Schema {
        Schema::new(
            "A certificate signing template of a CA definition.",
            vec![
                Attribute::string("ca_collection")
                    .required()
                    .description("The collection holding the CA definition."),
                Attribute::string("ca_definition").required().description("The CA definition."),
                Attribute::string("template_name")
                    .required()
                    .description("The name of the certificate signing request template."),
                Attribute::string("client_collection")
                    .required()
                    .description("The collection allowed to sign with the template."),
                Attribute::object(
                    "options",
                    vec![
                        Attribute::string("min_ttl")
                            .optional()
                            .description("The minimum validity of signed secrets. Default is 7 days."),
                        Attribute::string("max_ttl")
                            .optional()
                            .description("The maximum validity of signed secrets. Default is 90 days."),
                        Attribute::string("leaf_exceeds_ca_ttl")
                            .optional()
                            .description("Whether a signed secret may expire after the CA certificate."),
                        Attribute::string("allow_ca")
                            .optional()
                            .description("Whether a signed secret may have the CA basic constraint set."),
                        Attribute::string("common_name")
                            .optional()
                            .description("The allowed common name, with '*' as a glob character."),
                        Attribute::string("dns_san")
                            .optional()
                            .description("Comma separated list of allowed DNS names."),
                        Attribute::string("uri_san")
                            .optional()
                            .description("Comma separated list of allowed URIs."),
                        Attribute::string("ip_san")
                            .optional()
                            .description("Comma separated list of allowed IP addresses or prefixes."),
                        Attribute::string("key_type")
                            .optional()
                            .description("Comma separated list of allowed key types."),
                        Attribute::string("hash_type")
                            .optional()
                            .description("Comma separated list of allowed hash types."),
                    ],
                )
                .required(),
                Attribute::string("last_updated").computed(),
            ],
        )
    }

    async fn create(&self, plan: TemplateModel) -> Result<TemplateModel, Diagnostics> {
        let created = self.save(plan).await?;
        info!(
            "Created template '{}' for definition '{}'",
            created.template_name, created.ca_definition
        );
        Ok(created)
    }

    async fn read(&self, mut state: TemplateModel) -> Result<Option<TemplateModel>, Diagnostics> {
        let template = found(
            self.client
                .template(&state.ca_collection, &state.ca_definition, &state.template_name)
                .await,
        )
        .map_err(|e| Diagnostics::error("Error reading template", e))?;

        Ok(template.map(|template| {
            state.options = TemplateOptions::from_template(&template);
            if let Some(acl) = template.collection_acls.first() {
                state.client_collection = acl.target.clone();
            }
            state
        }))
    }

    async fn update(&self, _prior: TemplateModel, plan: TemplateModel) -> Result<TemplateModel, Diagnostics> {
        self.save(plan).await
    }

    async fn delete(&self, state: TemplateModel) -> Result<(), Diagnostics> {
        self.client
            .delete_template(&state.ca_collection, &state.ca_definition, &state.template_name)
            .await
            .map_err(|e| Diagnostics::error("Error deleting template", e))
    }
}

//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmi::{FromXml, ToXml};

    #[test]
    fn emit_set_options_in_order() {
        let options = TemplateOptions {
            min_ttl: Some("7d".to_string()),
            common_name: Some("*.example.net".to_string()),
            key_type: Some("ec:secp256r1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            TemplateRequest::constraints(options.constraints()).to_xml().unwrap(),
            concat!(
                r#"<template><constraint type="common_name">*.example.net</constraint>"#,
                r#"<constraint type="key_type">ec:secp256r1</constraint>"#,
                r#"<constraint type="min_ttl">7d</constraint></template>"#
            )
        );
    }

    #[test]
    fn map_constraints_to_options() {
        let template = Template::from_xml(
            r#"<template name="t">
                 <constraint type="common_name">*</constraint>
                 <constraint type="max_ttl">90d</constraint>
                 <constraint type="allow_ca">0</constraint>
                 <constraint type="unknown">x</constraint>
               </template>"#,
        )
        .unwrap();

        let options = TemplateOptions::from_template(&template);
        assert_eq!(
            options,
            TemplateOptions {
                max_ttl: Some("90d".to_string()),
                allow_ca: Some("0".to_string()),
                ..Default::default()
            }
        );
    }
}
