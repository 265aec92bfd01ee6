use std::io;
use std::time::Duration;

use backoff::ExponentialBackoff;
use log::{debug, info};

use crate::commons::util::xml::{XmlReader, XmlReaderErr, XmlWriter};
use crate::constants::{COLLECTION_RETRY_INITIAL_SECS, COLLECTION_RETRY_MAX_ELAPSED_SECS, COLLECTION_RETRY_MULTIPLIER};

use super::{Error, FromXml, KmiClient, ToXml};

//------------ CollectionRequest ---------------------------------------------

/// The desired access groups of a collection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CollectionRequest {
    pub adders: String,
    pub modifiers: String,
    pub readers: String,
}

impl ToXml for CollectionRequest {
    fn to_xml(&self) -> Result<String, io::Error> {
        XmlWriter::encode_string(|w| {
            w.put_element("collection", None, |w| {
                w.put_text_element("adders", None, &self.adders)?;
                w.put_text_element("modifiers", None, &self.modifiers)?;
                w.put_text_element("readers", None, &self.readers)
            })
        })
    }
}

//------------ Collection ----------------------------------------------------

/// A collection as reported by KMI.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Collection {
    pub name: String,
    pub source: String,
    pub readers: String,
    pub adders: String,
    pub modifiers: String,
    pub modified: String,
    pub distributed: String,
    pub distributed_date: String,
    pub keyspace: String,
    pub account: String,
    pub definitions: Vec<String>,
}

impl Collection {
    /// Returns whether KMI finished distributing this collection.
    pub fn is_distributed(&self) -> bool {
        !self.distributed_date.is_empty()
    }
}

impl FromXml for Collection {
    fn from_xml(xml: &str) -> Result<Self, XmlReaderErr> {
        XmlReader::decode(xml.as_bytes(), |r| {
            r.take_named_element("collection", |mut a, r| {
                let mut collection = Collection {
                    name: a.take_or_default("name"),
                    source: a.take_or_default("source"),
                    readers: a.take_or_default("readers"),
                    adders: a.take_or_default("adders"),
                    modifiers: a.take_or_default("modifiers"),
                    modified: a.take_or_default("modified"),
                    distributed: a.take_or_default("distributed"),
                    distributed_date: a.take_or_default("distributed_date"),
                    keyspace: a.take_or_default("keyspace"),
                    account: a.take_or_default("account"),
                    definitions: vec![],
                };
                r.take_children(|t, mut a, r| {
                    if t.name == "definition" {
                        collection.definitions.push(a.take_or_default("name"));
                    }
                    r.skip()
                })?;
                Ok(collection)
            })
        })
    }
}

//------------ DistributionRetry ---------------------------------------------

/// How long and how often to re-read a collection until it is distributed.
#[derive(Clone, Debug, PartialEq)]
pub struct DistributionRetry {
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub max_elapsed: Duration,
}

impl Default for DistributionRetry {
    fn default() -> Self {
        DistributionRetry {
            initial_interval: Duration::from_secs(COLLECTION_RETRY_INITIAL_SECS),
            multiplier: COLLECTION_RETRY_MULTIPLIER,
            max_elapsed: Duration::from_secs(COLLECTION_RETRY_MAX_ELAPSED_SECS),
        }
    }
}

impl DistributionRetry {
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_interval,
            initial_interval: self.initial_interval,
            randomization_factor: 0.0,
            multiplier: self.multiplier,
            max_interval: self.max_elapsed,
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        }
    }
}

impl KmiClient {
    fn collection_uri(&self, collection: &str) -> String {
        self.uri("collection", &[("Col", collection)])
    }

    /// Creates or updates a collection in an account.
    pub async fn save_collection(
        &self,
        account: &str,
        collection: &str,
        request: &CollectionRequest,
    ) -> Result<(), Error> {
        let uri = self.uri("collection", &[("Acct", account), ("Col", collection)]);
        self.post(&uri, request).await
    }

    pub async fn collection(&self, collection: &str) -> Result<Collection, Error> {
        self.get(&self.collection_uri(collection)).await
    }

    pub async fn delete_collection(&self, collection: &str) -> Result<(), Error> {
        self.delete(&self.collection_uri(collection)).await
    }

    /// Reads a collection until KMI reports it as distributed.
    ///
    /// Read failures other than unparsable responses are retried as well,
    /// as a new collection may not be visible right away.
    pub async fn wait_for_distribution(&self, collection: &str, retry: &DistributionRetry) -> Result<Collection, Error> {
        let notify = |err: Error, next: Duration| {
            info!("{}, checking again in {} seconds", err, next.as_secs());
        };

        let op = move || async move {
            match self.collection(collection).await {
                Ok(found) if found.is_distributed() => Ok(found),
                Ok(_) => Err(backoff::Error::transient(Error::NotDistributed(collection.to_string()))),
                Err(e @ Error::Xml(_, _)) => Err(backoff::Error::permanent(e)),
                Err(e) => Err(backoff::Error::transient(e)),
            }
        };

        let found = backoff::future::retry_notify(retry.backoff(), op, notify).await?;
        debug!("Collection '{}' distributed at {}", collection, found.distributed_date);
        Ok(found)
    }
}

//------------ Tests ---------------------------------------------------------
