use std::io;

use crate::commons::util::xml::{XmlReader, XmlReaderErr, XmlWriter};
use crate::constants::GROUP_TYPE_UNION;

use super::{Error, FromXml, KmiClient, ToXml};

/// The body posted to add a member to a group.
const GROUP_MEMBERSHIP_BODY: &str = "<group_membership/>";

//------------ GroupRequest --------------------------------------------------

/// The desired state of a union group in an account.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GroupRequest {
    pub account: String,
}

impl ToXml for GroupRequest {
    fn to_xml(&self) -> Result<String, io::Error> {
        XmlWriter::encode_string(|w| {
            w.put_element(
                "group",
                Some(&[("type", GROUP_TYPE_UNION), ("account", self.account.as_str())]),
                |w| w.empty(),
            )
        })
    }
}

//------------ Group ---------------------------------------------------------

/// A group as reported by KMI.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Group {
    pub name: String,
    pub kind: String,
    pub source: String,
    pub account: String,
    pub adders: String,
    pub modifiers: String,
}

impl FromXml for Group {
    fn from_xml(xml: &str) -> Result<Self, XmlReaderErr> {
        XmlReader::decode(xml.as_bytes(), |r| {
            r.take_named_element("group", |mut a, r| {
                let mut group = Group {
                    name: a.take_or_default("name"),
                    kind: a.take_or_default("type"),
                    source: a.take_or_default("source"),
                    account: a.take_or_default("account"),
                    ..Default::default()
                };
                r.take_children(|t, _, r| {
                    match t.name.as_str() {
                        "adders" => group.adders = r.take_opt_chars()?,
                        "modifiers" => group.modifiers = r.take_opt_chars()?,
                        _ => r.skip()?,
                    }
                    Ok(())
                })?;
                Ok(group)
            })
        })
    }
}

impl KmiClient {
    fn group_uri(&self, group: &str) -> String {
        self.uri("group", &[("Name", group)])
    }

    fn group_membership_uri(&self, group: &str, member: &str) -> String {
        self.uri("group_membership", &[("Parent", group), ("Child", member)])
    }

    /// Creates or updates a union group.
    pub async fn save_group(&self, group: &str, request: &GroupRequest) -> Result<(), Error> {
        let uri = self.uri("group", &[("Acct", request.account.as_str()), ("Name", group)]);
        self.post(&uri, request).await
    }

    pub async fn group(&self, group: &str) -> Result<Group, Error> {
        self.get(&self.group_uri(group)).await
    }

    pub async fn delete_group(&self, group: &str) -> Result<(), Error> {
        self.delete(&self.group_uri(group)).await
    }

    /// Makes `member` a member of `group`.
    pub async fn add_group_member(&self, group: &str, member: &str) -> Result<(), Error> {
        let uri = self.group_membership_uri(group, member);
        self.post_raw(&uri, GROUP_MEMBERSHIP_BODY.to_string()).await
    }

    pub async fn remove_group_member(&self, group: &str, member: &str) -> Result<(), Error> {
        self.delete(&self.group_membership_uri(group, member)).await
    }
}

//------------ Tests ---------------------------------------------------------
