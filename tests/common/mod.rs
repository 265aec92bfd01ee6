#![allow(dead_code)] // Different tests use different parts.

use std::time::Duration;

use httpmock::MockServer;
use kmi_provider::kmi::{DistributionRetry, KmiClient};
use kmi_provider::provider::KmiProvider;
use kmi_provider::provider::diagnostics::Diagnostics;

//------------ Provider setup ------------------------------------------------

/// Returns a provider talking plain HTTP to the mock server.
pub fn provider_for(server: &MockServer) -> KmiProvider {
    provider_with_retry(server, quick_retry())
}

pub fn provider_with_retry(server: &MockServer, retry: DistributionRetry) -> KmiProvider {
    let client = KmiClient::with_http_client(&server.base_url(), reqwest::Client::new()).unwrap();
    KmiProvider::with_client(client, retry)
}

/// A distribution retry that gives up within a second.
pub fn quick_retry() -> DistributionRetry {
    DistributionRetry {
        initial_interval: Duration::from_millis(10),
        multiplier: 2.0,
        max_elapsed: Duration::from_secs(1),
    }
}

pub fn summaries(diagnostics: &Diagnostics) -> Vec<String> {
    diagnostics.iter().map(|d| d.summary.clone()).collect()
}

//------------ KMI documents -------------------------------------------------

pub const GROUP_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<group name="pim_readers" type="union" source="kmi" account="PIM_TEST">
  <adders>PIM_TEST_ADMIN</adders>
  <modifiers>PIM_TEST_ADMIN</modifiers>
</group>"#;

pub const DISTRIBUTED_COLLECTION_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<collection name="pim_test_col" source="kmi" readers="pim_readers" adders="pim_adders" modifiers="pim_modifiers" modified="1683032101" distributed="1683032222" distributed_date="Tue May  2 13:57:02 2023" keyspace="default" account="PIM_TEST">
  <definition name="pim_test_def"/>
</collection>"#;

pub const PENDING_COLLECTION_XML: &str = r#"<collection name="pim_test_col" source="kmi" readers="pim_readers" adders="pim_adders" modifiers="pim_modifiers" modified="1683032101" distributed="" distributed_date="" keyspace="default" account="PIM_TEST"></collection>"#;
