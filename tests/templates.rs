//! Certificate templates and the account data source through the provider.

mod common;

use httpmock::prelude::*;
use serde_json::json;

use common::{provider_for, summaries};

const TEMPLATE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<template name="pim_tmpl" source="kmi" add_date="1683032101" modified="1683032101">
  <constraint type="common_name" warn="0" source="kmi" add_date="1683032101" modified="1683032101">*</constraint>
  <constraint type="dns_san" warn="0" source="kmi" add_date="1683032101" modified="1683032101">a.example.net,b.example.net</constraint>
  <constraint type="max_ttl" warn="0" source="kmi" add_date="1683032101" modified="1683032101">90d</constraint>
  <collectionacl target="pim_client_col" source="kmi" add_date="1683032101" modified="1683032101"/>
</template>"#;

const ACCOUNT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<account name="PIM_TEST" contact="pim-team@example.com" admin_group="PIM_TEST_ADMIN">
  <collection name="pim_test_col" source="kmi" readers="pim_readers" adders="pim_adders" modifiers="pim_modifiers" modified="1683032101" distributed="1683032222" distributed_date="Tue May  2 13:57:02 2023" keyspace="default" account="PIM_TEST"/>
  <group name="pim_readers" type="union" source="kmi" account="PIM_TEST" engine="" projection=""/>
  <engine name="lke-test" cloud="linode" type="kubernetes" adders="PIM_TEST_ADMIN" modifiers="PIM_TEST_ADMIN" modified="1683030000" source="kmi" published="1" published_location="/published/lke-test"/>
</account>"#;

#[tokio::test]
async fn create_template_posts_constraints_then_signer() {
    let server = MockServer::start_async().await;
    let constraints = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/template/Col=pim_ca_col/Def=pim_ca/Tmpl=pim_tmpl")
                .body(concat!(
                    r#"<template><constraint type="common_name">*.example.net</constraint>"#,
                    r#"<constraint type="max_ttl">90d</constraint>"#,
                    r#"<constraint type="min_ttl">7d</constraint></template>"#
                ));
            then.status(204);
        })
        .await;
    let signer = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/template/Col=pim_ca_col/Def=pim_ca/Tmpl=pim_tmpl")
                .body(r#"<template><collectionacl target="pim_client_col"></collectionacl></template>"#);
            then.status(204);
        })
        .await;

    let plan = json!({
        "ca_collection": "pim_ca_col",
        "ca_definition": "pim_ca",
        "template_name": "pim_tmpl",
        "client_collection": "pim_client_col",
        "options": { "min_ttl": "7d", "max_ttl": "90d", "common_name": "*.example.net" }
    });
    let state = provider_for(&server).create("kmi_template", plan).await.unwrap();

    constraints.assert_async().await;
    signer.assert_async().await;
    assert!(state["last_updated"].is_string());
}

#[tokio::test]
async fn read_template_options() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/template/Col=pim_ca_col/Def=pim_ca/Tmpl=pim_tmpl");
            then.status(200).body(TEMPLATE_XML);
        })
        .await;

    let state = json!({
        "ca_collection": "pim_ca_col",
        "ca_definition": "pim_ca",
        "template_name": "pim_tmpl",
        "client_collection": "old_col",
        "options": { "min_ttl": "7d" }
    });
    let state = provider_for(&server).read("kmi_template", state).await.unwrap().unwrap();

    assert_eq!(state["client_collection"], "pim_client_col");
    assert_eq!(state["options"]["common_name"], serde_json::Value::Null);
    assert_eq!(state["options"]["dns_san"], "a.example.net,b.example.net");
    assert_eq!(state["options"]["max_ttl"], "90d");
    assert_eq!(state["options"]["min_ttl"], serde_json::Value::Null);
}

#[tokio::test]
async fn read_account_children() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/account/Acct=PIM_TEST/children");
            then.status(200).body(ACCOUNT_XML);
        })
        .await;

    let account = provider_for(&server)
        .read_data_source("kmi_account", json!({ "account_name": "PIM_TEST" }))
        .await
        .unwrap();

    assert_eq!(account["account_name"], "PIM_TEST");
    assert_eq!(account["collections"][0]["distributed"], 1683032222);
    assert_eq!(account["groups"][0]["type"], "union");
    assert_eq!(account["engines"][0]["published_location"], "/published/lke-test");
}

#[tokio::test]
async fn report_unreadable_account() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/account/Acct=PIM_TEST/children");
            then.status(403);
        })
        .await;

    let err = provider_for(&server)
        .read_data_source("kmi_account", json!({ "account_name": "PIM_TEST" }))
        .await
        .unwrap_err();
    assert_eq!(summaries(&err), vec!["Unable to read KMI account"]);
}

#[tokio::test]
async fn delete_template() {
    let server = MockServer::start_async().await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/template/Col=pim_ca_col/Def=pim_ca/Tmpl=pim_tmpl");
            then.status(204);
        })
        .await;

    let state = json!({
        "ca_collection": "pim_ca_col",
        "ca_definition": "pim_ca",
        "template_name": "pim_tmpl",
        "client_collection": "pim_client_col",
        "options": { "max_ttl": "90d" },
        "last_updated": "Monday, 01-May-23 10:00:00 UTC"
    });
    provider_for(&server).delete("kmi_template", state).await.unwrap();

    delete.assert_async().await;
}
