use std::io;

use crate::commons::util::xml::{XmlReader, XmlReaderErr, XmlWriter};

use super::{Error, FromXml, KmiClient, ToXml};

//------------ TemplateRequest -----------------------------------------------

/// A document posted to a certificate signing template.
///
/// KMI takes the constraints and the collections allowed to sign with the
/// template in separate requests, so either list may be empty.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TemplateRequest {
    pub constraints: Vec<Constraint>,
    pub collection_acls: Vec<String>,
}

/// A single signing constraint, e.g. `max_ttl` or `dns_san`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Constraint {
    pub kind: String,
    pub value: String,
}

impl Constraint {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Constraint {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

impl TemplateRequest {
    pub fn constraints(constraints: Vec<Constraint>) -> Self {
        TemplateRequest {
            constraints,
            collection_acls: vec![],
        }
    }

    /// Allows the given collection to sign with the template.
    pub fn signer(collection: impl Into<String>) -> Self {
        TemplateRequest {
            constraints: vec![],
            collection_acls: vec![collection.into()],
        }
    }
}

impl ToXml for TemplateRequest {
    fn to_xml(&self) -> Result<String, io::Error> {
        XmlWriter::encode_string(|w| {
            w.put_element("template", None, |w| {
                for constraint in &self.constraints {
                    w.put_text_element(
                        "constraint",
                        Some(&[("type", constraint.kind.as_str())]),
                        &constraint.value,
                    )?;
                }
                for target in &self.collection_acls {
                    w.put_element("collectionacl", Some(&[("target", target.as_str())]), |w| w.empty())?;
                }
                Ok(())
            })
        })
    }
}

//------------ Template ------------------------------------------------------

/// A template as reported by KMI.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Template {
    pub name: String,
    pub source: String,
    pub add_date: String,
    pub modified: String,
    pub constraints: Vec<TemplateConstraint>,
    pub collection_acls: Vec<CollectionAcl>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TemplateConstraint {
    pub kind: String,
    pub warn: String,
    pub source: String,
    pub add_date: String,
    pub modified: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CollectionAcl {
    pub target: String,
    pub source: String,
    pub add_date: String,
    pub modified: String,
}

impl FromXml for Template {
    fn from_xml(xml: &str) -> Result<Self, XmlReaderErr> {
        XmlReader::decode(xml.as_bytes(), |r| {
            r.take_named_element("template", |mut a, r| {
                let mut template = Template {
                    name: a.take_or_default("name"),
                    source: a.take_or_default("source"),
                    add_date: a.take_or_default("add_date"),
                    modified: a.take_or_default("modified"),
                    ..Default::default()
                };
                r.take_children(|t, mut a, r| match t.name.as_str() {
                    "constraint" => {
                        template.constraints.push(TemplateConstraint {
                            kind: a.take_or_default("type"),
                            warn: a.take_or_default("warn"),
                            source: a.take_or_default("source"),
                            add_date: a.take_or_default("add_date"),
                            modified: a.take_or_default("modified"),
                            value: r.take_opt_chars()?,
                        });
                        Ok(())
                    }
                    "collectionacl" => {
                        template.collection_acls.push(CollectionAcl {
                            target: a.take_or_default("target"),
                            source: a.take_or_default("source"),
                            add_date: a.take_or_default("add_date"),
                            modified: a.take_or_default("modified"),
                        });
                        r.skip()
                    }
                    _ => r.skip(),
                })?;
                Ok(template)
            })
        })
    }
}

impl KmiClient {
    fn template_uri(&self, collection: &str, definition: &str, template: &str) -> String {
        self.uri(
            "template",
            &[("Col", collection), ("Def", definition), ("Tmpl", template)],
        )
    }

    /// Posts constraints or signer ACLs to a template of a CA definition.
    pub async fn save_template(
        &self,
        collection: &str,
        definition: &str,
        template: &str,
        request: &TemplateRequest,
    ) -> Result<(), Error> {
        self.post(&self.template_uri(collection, definition, template), request)
            .await
    }

    pub async fn template(&self, collection: &str, definition: &str, template: &str) -> Result<Template, Error> {
        self.get(&self.template_uri(collection, definition, template)).await
    }

    pub async fn delete_template(&self, collection: &str, definition: &str, template: &str) -> Result<(), Error> {
        self.delete(&self.template_uri(collection, definition, template)).await
    }
}

//------------ Tests ---------------------------------------------------------
