use std::io;

use crate::commons::util::xml::{XmlReader, XmlReaderErr, XmlWriter};
use crate::constants::SECRET_AUTOINDEX;

use super::{Error, FromXml, KmiClient, ToXml};

//------------ DefinitionRequest ---------------------------------------------

/// The desired state of a secret definition.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DefinitionRequest {
    pub kind: String,
    pub adders: Option<String>,
    pub modifiers: Option<String>,
    pub expire_period: Option<String>,
    pub refresh_period: Option<String>,
    pub auto_generate: Option<bool>,
    pub options: Vec<DefinitionOption>,
}

/// A type specific option of a definition.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DefinitionOption {
    pub name: String,
    pub source: String,
    pub value: String,
}

impl DefinitionOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        DefinitionOption {
            name: name.into(),
            source: String::new(),
            value: value.into(),
        }
    }
}

impl ToXml for DefinitionRequest {
    fn to_xml(&self) -> Result<String, io::Error> {
        XmlWriter::encode_string(|w| {
            w.put_element("definition", Some(&[("type", self.kind.as_str())]), |w| {
                let elements = [
                    ("adders", &self.adders),
                    ("modifiers", &self.modifiers),
                    ("expire_period", &self.expire_period),
                    ("refresh_period", &self.refresh_period),
                ];
                for (name, value) in elements {
                    if let Some(value) = value {
                        w.put_text_element(name, None, value)?;
                    }
                }
                if let Some(auto_generate) = self.auto_generate {
                    w.put_text_element("auto_generate", None, if auto_generate { "True" } else { "False" })?;
                }
                for option in &self.options {
                    w.put_text_element("option", Some(&[("name", option.name.as_str())]), &option.value)?;
                }
                Ok(())
            })
        })
    }
}

//------------ BlockSecret ---------------------------------------------------

/// A secret value uploaded as a base64 encoded block.
#[derive(Clone, Eq, PartialEq)]
pub struct BlockSecret {
    pub name: String,
    pub data: Vec<u8>,
}

impl BlockSecret {
    /// Creates the block for the value of an opaque definition.
    pub fn opaque(data: impl Into<Vec<u8>>) -> Self {
        BlockSecret {
            name: "opaque".to_string(),
            data: data.into(),
        }
    }
}

impl std::fmt::Debug for BlockSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "BlockSecret {{ name: {}, data: <{} bytes> }}", self.name, self.data.len())
    }
}

impl ToXml for BlockSecret {
    fn to_xml(&self) -> Result<String, io::Error> {
        XmlWriter::encode_string(|w| {
            w.put_element("secret", None, |w| {
                w.put_element(
                    "block",
                    Some(&[("name", self.name.as_str()), ("b64encoded", "true")]),
                    |w| w.put_base64_std(&self.data),
                )
            })
        })
    }
}

//------------ Definition ----------------------------------------------------

/// A definition as reported by KMI.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Definition {
    pub name: String,
    pub source: String,
    pub kind: String,
    pub modified: String,
    pub adders: String,
    pub modifiers: String,
    pub auto_generate: String,
    pub expire_period: String,
    pub refresh_period: String,
    pub options: Vec<DefinitionOption>,
    /// The indexes of the secrets stored under this definition.
    pub secrets: Vec<String>,
}

impl Definition {
    /// Returns the indexes of all secrets, each followed by a comma.
    pub fn secret_indexes(&self) -> String {
        self.secrets.iter().map(|index| format!("{},", index)).collect()
    }
}

impl FromXml for Definition {
    fn from_xml(xml: &str) -> Result<Self, XmlReaderErr> {
        XmlReader::decode(xml.as_bytes(), |r| {
            r.take_named_element("definition", |mut a, r| {
                let mut definition = Definition {
                    name: a.take_or_default("name"),
                    source: a.take_or_default("source"),
                    kind: a.take_or_default("type"),
                    modified: a.take_or_default("modified"),
                    ..Default::default()
                };
                r.take_children(|t, mut a, r| {
                    match t.name.as_str() {
                        "adders" => definition.adders = r.take_opt_chars()?,
                        "modifiers" => definition.modifiers = r.take_opt_chars()?,
                        "auto_generate" => definition.auto_generate = r.take_opt_chars()?,
                        "expire_period" => definition.expire_period = r.take_opt_chars()?,
                        "refresh_period" => definition.refresh_period = r.take_opt_chars()?,
                        "option" => definition.options.push(DefinitionOption {
                            name: a.take_or_default("name"),
                            source: a.take_or_default("source"),
                            value: r.take_opt_chars()?,
                        }),
                        "secret" => {
                            definition.secrets.push(a.take_or_default("index"));
                            r.skip()?
                        }
                        _ => r.skip()?,
                    }
                    Ok(())
                })?;
                Ok(definition)
            })
        })
    }
}

impl KmiClient {
    fn definition_uri(&self, collection: &str, definition: &str) -> String {
        self.uri("definition", &[("Col", collection), ("Def", definition)])
    }

    /// Creates or updates a definition in a collection.
    pub async fn save_definition(
        &self,
        collection: &str,
        definition: &str,
        request: &DefinitionRequest,
    ) -> Result<(), Error> {
        self.post(&self.definition_uri(collection, definition), request).await
    }

    pub async fn definition(&self, collection: &str, definition: &str) -> Result<Definition, Error> {
        self.get(&self.definition_uri(collection, definition)).await
    }

    pub async fn delete_definition(&self, collection: &str, definition: &str) -> Result<(), Error> {
        self.delete(&self.definition_uri(collection, definition)).await
    }

    /// Adds a secret to a definition under the next free index.
    pub async fn add_block_secret(&self, collection: &str, definition: &str, secret: &BlockSecret) -> Result<(), Error> {
        let uri = self.uri(
            "secret",
            &[("Col", collection), ("Def", definition), ("Idx", SECRET_AUTOINDEX)],
        );
        self.post(&uri, secret).await
    }
}

//------------ Tests ---------------------------------------------------------
