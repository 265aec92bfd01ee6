//! Attribute schemas of the provider, its resources and data sources.
use std::collections::BTreeMap;

use serde::Serialize;

//------------ AttributeType -------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Bool,
    Number,
    /// A list of strings.
    StringList,
    /// A set of strings.
    StringSet,
    /// A single nested object.
    Object,
    /// A list of nested objects.
    ObjectList,
}

//------------ Attribute -----------------------------------------------------

/// A single attribute of a schema.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub description: &'static str,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeType) -> Self {
        Attribute {
            name,
            kind,
            description: "",
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            attributes: vec![],
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, AttributeType::String)
    }

    pub fn bool(name: &'static str) -> Self {
        Self::new(name, AttributeType::Bool)
    }

    pub fn number(name: &'static str) -> Self {
        Self::new(name, AttributeType::Number)
    }

    pub fn string_list(name: &'static str) -> Self {
        Self::new(name, AttributeType::StringList)
    }

    pub fn string_set(name: &'static str) -> Self {
        Self::new(name, AttributeType::StringSet)
    }

    pub fn object(name: &'static str, attributes: Vec<Attribute>) -> Self {
        Attribute {
            attributes,
            ..Self::new(name, AttributeType::Object)
        }
    }

    pub fn object_list(name: &'static str, attributes: Vec<Attribute>) -> Self {
        Attribute {
            attributes,
            ..Self::new(name, AttributeType::ObjectList)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

//------------ Schema --------------------------------------------------------

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Schema {
    pub description: &'static str,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(description: &'static str, attributes: Vec<Attribute>) -> Self {
        Schema {
            description,
            attributes,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

//------------ ProviderSchema ------------------------------------------------

/// Everything the host needs to know about the provider's types.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ProviderSchema {
    pub type_name: &'static str,
    pub provider: Schema,
    pub resources: BTreeMap<&'static str, Schema>,
    pub data_sources: BTreeMap<&'static str, Schema>,
}
