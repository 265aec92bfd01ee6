use std::{fmt, io};
use std::str::FromStr;

use crate::commons::util::xml::{XmlReader, XmlReaderErr, XmlWriter};

use super::{Error, FromXml, KmiClient, ToXml};

//------------ ServiceAccount ------------------------------------------------

/// A Kubernetes service account as KMI refers to it.
///
/// The textual form is `system:serviceaccount:<namespace>:<name>`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceAccount {
    pub namespace: String,
    pub name: String,
}

impl ServiceAccount {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        ServiceAccount {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "system:serviceaccount:{}:{}", self.namespace, self.name)
    }
}

impl FromStr for ServiceAccount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [_, _, namespace, name] => Ok(ServiceAccount::new(*namespace, *name)),
            _ => Err(Error::InvalidServiceAccount(s.to_string())),
        }
    }
}

//------------ WorkloadRequest -----------------------------------------------

/// The desired state of a workload (a projection of an identity engine).
///
/// This is posted on its own, and is also embedded in identity engine
/// requests.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkloadRequest {
    pub projection: String,
    pub service_account: Option<ServiceAccount>,
    pub region: Option<String>,
    pub linode_label: Option<String>,
}

impl WorkloadRequest {
    pub(super) fn write<W: io::Write>(&self, w: &mut XmlWriter<W>) -> Result<(), io::Error> {
        w.put_element("workload", Some(&[("projection", self.projection.as_str())]), |w| {
            if let Some(account) = &self.service_account {
                w.put_text_element("kubernetes_service_account", None, &account.to_string())?;
            }
            if let Some(region) = &self.region {
                w.put_text_element("region", None, region)?;
            }
            if let Some(label) = &self.linode_label {
                w.put_text_element("linode_label", None, label)?;
            }
            Ok(())
        })
    }
}

impl ToXml for WorkloadRequest {
    fn to_xml(&self) -> Result<String, io::Error> {
        XmlWriter::encode_string(|w| self.write(w))
    }
}

//------------ Workload ------------------------------------------------------

/// A value reported by KMI together with where it came from.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SourcedValue {
    pub value: String,
    pub source: String,
}

/// A workload as reported by KMI.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Workload {
    pub projection: String,
    pub source: String,
    pub region: SourcedValue,
    pub kubernetes_service_account: SourcedValue,
    pub linode_label: SourcedValue,
}

impl Workload {
    /// Parses the Kubernetes service account of this workload.
    pub fn service_account(&self) -> Result<ServiceAccount, Error> {
        ServiceAccount::from_str(&self.kubernetes_service_account.value)
    }
}

impl FromXml for Workload {
    fn from_xml(xml: &str) -> Result<Self, XmlReaderErr> {
        XmlReader::decode(xml.as_bytes(), |r| {
            r.take_named_element("workload", |mut a, r| {
                let mut workload = Workload {
                    projection: a.take_or_default("projection"),
                    source: a.take_or_default("source"),
                    ..Default::default()
                };
                r.take_children(|t, mut a, r| {
                    let target = match t.name.as_str() {
                        "region" => &mut workload.region,
                        "kubernetes_service_account" => &mut workload.kubernetes_service_account,
                        "linode_label" => &mut workload.linode_label,
                        _ => return r.skip(),
                    };
                    target.source = a.take_or_default("source");
                    target.value = r.take_opt_chars()?;
                    Ok(())
                })?;
                Ok(workload)
            })
        })
    }
}

impl KmiClient {
    fn workload_uri(&self, account: &str, engine: &str, workload: &str) -> String {
        self.uri("workload", &[("Acct", account), ("Eng", engine), ("Proj", workload)])
    }

    /// Creates or updates a workload of an identity engine.
    pub async fn save_workload(&self, account: &str, engine: &str, workload: &WorkloadRequest) -> Result<(), Error> {
        let uri = self.workload_uri(account, engine, &workload.projection);
        self.post(&uri, workload).await
    }

    pub async fn workload(&self, account: &str, engine: &str, workload: &str) -> Result<Workload, Error> {
        self.get(&self.workload_uri(account, engine, workload)).await
    }

    pub async fn delete_workload(&self, account: &str, engine: &str, workload: &str) -> Result<(), Error> {
        self.delete(&self.workload_uri(account, engine, workload)).await
    }
}

//------------ Tests ---------------------------------------------------------
