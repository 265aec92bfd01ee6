use std::io;

use crate::commons::util::xml::{XmlReader, XmlReaderErr, XmlWriter};
use crate::constants::ENGINE_TYPE_KUBERNETES;

use super::{Error, FromXml, KmiClient, ToXml, WorkloadRequest};

/// The engine option holding the cluster CA certificates.
pub const ENGINE_OPTION_CAS_BASE64: &str = "cas_base64";

/// The engine option holding the cluster API endpoint.
pub const ENGINE_OPTION_ENDPOINT_URL: &str = "endpoint_url";

//------------ EngineRequest -------------------------------------------------

/// The desired state of a Kubernetes identity engine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineRequest {
    pub cloud: String,
    pub cas_base64: String,
    pub endpoint_url: String,
    pub workloads: Vec<WorkloadRequest>,
}

impl ToXml for EngineRequest {
    fn to_xml(&self) -> Result<String, io::Error> {
        XmlWriter::encode_string(|w| {
            w.put_element(
                "engine",
                Some(&[("cloud", self.cloud.as_str()), ("type", ENGINE_TYPE_KUBERNETES)]),
                |w| {
                    w.put_text_element("option", Some(&[("name", ENGINE_OPTION_CAS_BASE64)]), &self.cas_base64)?;
                    w.put_text_element("option", Some(&[("name", ENGINE_OPTION_ENDPOINT_URL)]), &self.endpoint_url)?;
                    for workload in &self.workloads {
                        workload.write(w)?;
                    }
                    Ok(())
                },
            )
        })
    }
}

//------------ IdentityEngine ------------------------------------------------

/// An identity engine as reported by KMI.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IdentityEngine {
    pub name: String,
    pub cloud: String,
    pub kind: String,
    pub adders: String,
    pub modifiers: String,
    pub modified: String,
    pub source: String,
    pub published: String,
    pub published_location: String,
    pub options: Vec<EngineOption>,
    pub workloads: Vec<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EngineOption {
    pub name: String,
    pub source: String,
    pub value: String,
}

impl IdentityEngine {
    /// Returns the value of the named option, if KMI reported one.
    ///
    /// KMI redacts some option values, so an empty value counts as absent.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.value.as_str())
            .filter(|v| !v.is_empty())
    }
}

impl FromXml for IdentityEngine {
    fn from_xml(xml: &str) -> Result<Self, XmlReaderErr> {
        XmlReader::decode(xml.as_bytes(), |r| {
            r.take_named_element("engine", |mut a, r| {
                let mut engine = IdentityEngine {
                    name: a.take_or_default("name"),
                    cloud: a.take_or_default("cloud"),
                    kind: a.take_or_default("type"),
                    adders: a.take_or_default("adders"),
                    modifiers: a.take_or_default("modifiers"),
                    modified: a.take_or_default("modified"),
                    source: a.take_or_default("source"),
                    published: a.take_or_default("published"),
                    published_location: a.take_or_default("published_location"),
                    ..Default::default()
                };
                r.take_children(|t, mut a, r| match t.name.as_str() {
                    "option" => {
                        engine.options.push(EngineOption {
                            name: a.take_or_default("name"),
                            source: a.take_or_default("source"),
                            value: r.take_opt_chars()?,
                        });
                        Ok(())
                    }
                    "workload" => {
                        engine.workloads.push(a.take_or_default("projection"));
                        r.skip()
                    }
                    _ => r.skip(),
                })?;
                Ok(engine)
            })
        })
    }
}

impl KmiClient {
    fn engine_uri(&self, account: &str, engine: &str) -> String {
        self.uri("engine", &[("Acct", account), ("Eng", engine)])
    }

    /// Creates or updates an identity engine, including its workloads.
    pub async fn save_engine(&self, account: &str, engine: &str, request: &EngineRequest) -> Result<(), Error> {
        self.post(&self.engine_uri(account, engine), request).await
    }

    pub async fn engine(&self, account: &str, engine: &str) -> Result<IdentityEngine, Error> {
        self.get(&self.engine_uri(account, engine)).await
    }

    pub async fn delete_engine(&self, account: &str, engine: &str) -> Result<(), Error> {
        self.delete(&self.engine_uri(account, engine)).await
    }
}

//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;
    use crate::kmi::ServiceAccount;
    use crate::kmi::tests::client_for;

    const ENGINE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<engine name="lke-test" cloud="linode" type="kubernetes" adders="PIM_TEST_ADMIN" modifiers="PIM_TEST_ADMIN" modified="1683030000" source="kmi" published="1" published_location="/published/lke-test">
  <option name="cas_base64" source="kmi"></option>
  <option name="endpoint_url" source="kmi">https://lke.example.net:443</option>
  <workload projection="pim-test-wl"/>
  <workload projection="pim-other-wl"/>
</engine>"#;

    fn request() -> EngineRequest {
        EngineRequest {
            cloud: "linode".to_string(),
            cas_base64: "Q0E=".to_string(),
            endpoint_url: "https://lke.example.net:443".to_string(),
            workloads: vec![WorkloadRequest {
                projection: "pim-test-wl".to_string(),
                service_account: Some(ServiceAccount::new("pim", "pim-sa")),
                region: Some("us-east".to_string()),
                linode_label: None,
            }],
        }
    }

    #[test]
    fn encode_engine_request() {
        assert_eq!(
            request().to_xml().unwrap(),
            concat!(
                r#"<engine cloud="linode" type="kubernetes">"#,
                r#"<option name="cas_base64">Q0E=</option>"#,
                r#"<option name="endpoint_url">https://lke.example.net:443</option>"#,
                r#"<workload projection="pim-test-wl">"#,
                r#"<kubernetes_service_account>system:serviceaccount:pim:pim-sa</kubernetes_service_account>"#,
                r#"<region>us-east</region>"#,
                r#"</workload></engine>"#
            )
        );
    }

    #[test]
    fn decode_engine() {
        let engine = IdentityEngine::from_xml(ENGINE_XML).unwrap();
        assert_eq!(engine.name, "lke-test");
        assert_eq!(engine.kind, "kubernetes");
        assert_eq!(engine.options.len(), 2);
        assert_eq!(engine.option(ENGINE_OPTION_CAS_BASE64), None);
        assert_eq!(engine.option(ENGINE_OPTION_ENDPOINT_URL), Some("https://lke.example.net:443"));
        assert_eq!(engine.workloads, vec!["pim-test-wl", "pim-other-wl"]);
    }

    #[tokio::test]
    async fn save_and_get_engine() {
        let server = MockServer::start_async().await;
        let post = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/engine/Acct=PIM_TEST/Eng=lke-test")
                    .body(request().to_xml().unwrap());
                then.status(204);
            })
            .await;
        let get = server
            .mock_async(|when, then| {
                when.method(GET).path("/engine/Acct=PIM_TEST/Eng=lke-test");
                then.status(200).body(ENGINE_XML);
            })
            .await;

        let client = client_for(&server);
        client.save_engine("PIM_TEST", "lke-test", &request()).await.unwrap();
        let engine = client.engine("PIM_TEST", "lke-test").await.unwrap();

        post.assert_async().await;
        get.assert_async().await;
        assert_eq!(engine.cloud, "linode");
    }

    #[tokio::test]
    async fn reject_engine_save_without_no_content() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/engine/Acct=PIM_TEST/Eng=lke-test");
                then.status(500).body("engine limit reached");
            })
            .await;

        let err = client_for(&server)
            .save_engine("PIM_TEST", "lke-test", &request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("engine limit reached"));
    }
}
