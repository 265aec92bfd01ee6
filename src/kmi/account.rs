use crate::commons::util::xml::{Attributes, XmlReader, XmlReaderErr};

use super::{Error, FromXml, KmiClient};

//------------ AccountDetails ------------------------------------------------

/// An account with its limits, usage counters and direct children.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccountDetails {
    pub name: String,
    pub contact: String,
    pub admin_group: String,

    pub max_cols: String,
    pub max_groups: String,
    pub max_defs: String,
    pub max_secrets: String,
    pub max_templates: String,
    pub max_engines: String,
    pub max_projections: String,
    pub max_options: String,

    pub num_collections: String,
    pub num_groups: String,
    pub num_users: String,
    pub num_workloads: String,
    pub num_machines: String,
    pub num_secrets: String,
    pub num_engines: String,

    pub collections: Vec<AccountCollection>,
    pub groups: Vec<AccountGroup>,
    pub engines: Vec<AccountEngine>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccountCollection {
    pub name: String,
    pub source: String,
    pub readers: String,
    pub adders: String,
    pub modifiers: String,
    pub modified: i64,
    pub distributed: i64,
    pub distributed_date: String,
    pub keyspace: String,
    pub account: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccountGroup {
    pub name: String,
    pub kind: String,
    pub source: String,
    pub account: String,
    pub engine: String,
    pub projection: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccountEngine {
    pub name: String,
    pub cloud: String,
    pub kind: String,
    pub adders: String,
    pub modifiers: String,
    pub modified: i64,
    pub source: String,
    pub published: String,
    pub published_location: String,
}

impl AccountCollection {
    fn from_attributes(a: &mut Attributes) -> Result<Self, XmlReaderErr> {
        Ok(AccountCollection {
            name: a.take_or_default("name"),
            source: a.take_or_default("source"),
            readers: a.take_or_default("readers"),
            adders: a.take_or_default("adders"),
            modifiers: a.take_or_default("modifiers"),
            modified: a.take_i64("modified")?,
            distributed: a.take_i64("distributed")?,
            distributed_date: a.take_or_default("distributed_date"),
            keyspace: a.take_or_default("keyspace"),
            account: a.take_or_default("account"),
        })
    }
}

impl AccountGroup {
    fn from_attributes(a: &mut Attributes) -> Self {
        AccountGroup {
            name: a.take_or_default("name"),
            kind: a.take_or_default("type"),
            source: a.take_or_default("source"),
            account: a.take_or_default("account"),
            engine: a.take_or_default("engine"),
            projection: a.take_or_default("projection"),
        }
    }
}

impl AccountEngine {
    fn from_attributes(a: &mut Attributes) -> Result<Self, XmlReaderErr> {
        Ok(AccountEngine {
            name: a.take_or_default("name"),
            cloud: a.take_or_default("cloud"),
            kind: a.take_or_default("type"),
            adders: a.take_or_default("adders"),
            modifiers: a.take_or_default("modifiers"),
            modified: a.take_i64("modified")?,
            source: a.take_or_default("source"),
            published: a.take_or_default("published"),
            published_location: a.take_or_default("published_location"),
        })
    }
}

impl FromXml for AccountDetails {
    fn from_xml(xml: &str) -> Result<Self, XmlReaderErr> {
        XmlReader::decode(xml.as_bytes(), |r| {
            r.take_named_element("account", |mut a, r| {
                let mut account = AccountDetails {
                    name: a.take_or_default("name"),
                    contact: a.take_or_default("contact"),
                    admin_group: a.take_or_default("admin_group"),
                    max_cols: a.take_or_default("max_cols"),
                    max_groups: a.take_or_default("max_groups"),
                    max_defs: a.take_or_default("max_defs"),
                    max_secrets: a.take_or_default("max_secrets"),
                    max_templates: a.take_or_default("max_templates"),
                    max_engines: a.take_or_default("max_engines"),
                    max_projections: a.take_or_default("max_projections"),
                    max_options: a.take_or_default("max_options"),
                    num_collections: a.take_or_default("num_collections"),
                    num_groups: a.take_or_default("num_groups"),
                    num_users: a.take_or_default("num_users"),
                    num_workloads: a.take_or_default("num_workloads"),
                    num_machines: a.take_or_default("num_machines"),
                    num_secrets: a.take_or_default("num_secrets"),
                    num_engines: a.take_or_default("num_engines"),
                    ..Default::default()
                };

                r.take_children(|t, mut a, r| {
                    match t.name.as_str() {
                        "collection" => account.collections.push(AccountCollection::from_attributes(&mut a)?),
                        "group" => account.groups.push(AccountGroup::from_attributes(&mut a)),
                        "engine" => account.engines.push(AccountEngine::from_attributes(&mut a)?),
                        _ => {}
                    }
                    r.skip()
                })?;

                Ok(account)
            })
        })
    }
}

impl KmiClient {
    /// Gets an account with all its collections, groups and engines.
    pub async fn account(&self, account: &str) -> Result<AccountDetails, Error> {
        let uri = format!("{}/children", self.uri("account", &[("Acct", account)]));
        self.get(&uri).await
    }
}

//------------ Tests ---------------------------------------------------------
