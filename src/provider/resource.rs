//! The lifecycle contract between the host and the KMI adapters.
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::kmi::{self, DistributionRetry, KmiClient};

use super::diagnostics::Diagnostics;
use super::schema::Schema;

//------------ ProviderData --------------------------------------------------

/// What a configured provider hands to its resources and data sources.
#[derive(Clone, Debug)]
pub struct ProviderData {
    pub client: KmiClient,
    pub retry: DistributionRetry,
}

//------------ Resource ------------------------------------------------------

/// A managed KMI object.
///
/// The host owns the state. Every call receives the relevant state or
/// plan as a typed model and returns the new state.
#[allow(async_fn_in_trait)]
pub trait Resource: Sized {
    /// The name of the resource type, e.g. `kmi_engine`.
    const TYPE_NAME: &'static str;

    type Model: Serialize + DeserializeOwned;

    fn new(data: &ProviderData) -> Self;

    fn schema() -> Schema;

    async fn create(&self, plan: Self::Model) -> Result<Self::Model, Diagnostics>;

    /// Refreshes the state. Returns `None` if the object no longer exists
    /// and should be removed from the state.
    async fn read(&self, state: Self::Model) -> Result<Option<Self::Model>, Diagnostics>;

    async fn update(&self, prior: Self::Model, plan: Self::Model) -> Result<Self::Model, Diagnostics>;

    async fn delete(&self, state: Self::Model) -> Result<(), Diagnostics>;
}

//------------ DataSource ----------------------------------------------------

/// A read-only view on KMI objects.
#[allow(async_fn_in_trait)]
pub trait DataSource: Sized {
    const TYPE_NAME: &'static str;

    type Model: Serialize + DeserializeOwned;

    fn new(data: &ProviderData) -> Self;

    fn schema() -> Schema;

    async fn read(&self, config: Self::Model) -> Result<Self::Model, Diagnostics>;
}

//------------ Helpers -------------------------------------------------------

/// The value for `last_updated` attributes.
pub fn timestamp() -> String {
    Utc::now().format("%A, %d-%b-%y %H:%M:%S UTC").to_string()
}

/// Maps the result of a GET to `None` if KMI does not know the object.
pub fn found<T>(res: Result<T, kmi::Error>) -> Result<Option<T>, kmi::Error> {
    match res {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Returns the value, unless it is empty.
pub fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_uses_rfc850_layout() {
        let stamp = timestamp();
        // e.g. "Monday, 02-Jan-06 15:04:05 UTC"
        let (day, rest) = stamp.split_once(", ").unwrap();
        assert!(day.ends_with("day"));
        assert_eq!(rest.len(), "02-Jan-06 15:04:05 UTC".len());
        assert!(rest.ends_with(" UTC"));
    }

    #[test]
    fn empty_values_are_none() {
        assert_eq!(non_empty(String::new()), None);
        assert_eq!(non_empty("x".to_string()), Some("x".to_string()));
    }
}
