//! Collections, their definitions and data sources through the provider.

mod common;

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use common::{DISTRIBUTED_COLLECTION_XML, GROUP_XML, PENDING_COLLECTION_XML, provider_for, summaries};

fn collection_plan() -> serde_json::Value {
    json!({
        "name": "pim_test_col",
        "account_name": "PIM_TEST",
        "adders": "pim_adders",
        "modifiers": "pim_modifiers",
        "readers": "pim_readers"
    })
}

#[tokio::test]
async fn create_waits_for_distribution() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/group/Name=pim_readers");
            then.status(200).body(GROUP_XML);
        })
        .await;
    let post = server
        .mock_async(|when, then| {
            when.method(POST).path("/collection/Acct=PIM_TEST/Col=pim_test_col").body(
                "<collection><adders>pim_adders</adders><modifiers>pim_modifiers</modifiers><readers>pim_readers</readers></collection>",
            );
            then.status(204);
        })
        .await;
    let mut pending = server
        .mock_async(|when, then| {
            when.method(GET).path("/collection/Col=pim_test_col");
            then.status(200).body(PENDING_COLLECTION_XML);
        })
        .await;

    let provider = provider_for(&server);
    let distribute = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        pending.delete_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/collection/Col=pim_test_col");
                then.status(200).body(DISTRIBUTED_COLLECTION_XML);
            })
            .await;
    };
    let (created, _) = tokio::join!(provider.create("kmi_collections", collection_plan()), distribute);

    let state = created.unwrap();
    post.assert_async().await;
    assert_eq!(state["distributed_date"], "Tue May  2 13:57:02 2023");
    assert!(state["last_updated"].is_string());
}

#[tokio::test]
async fn create_requires_reader_group() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/group/Name=pim_readers");
            then.status(404);
        })
        .await;
    let post = server
        .mock_async(|when, then| {
            when.method(POST).path("/collection/Acct=PIM_TEST/Col=pim_test_col");
            then.status(204);
        })
        .await;

    let err = provider_for(&server)
        .create("kmi_collections", collection_plan())
        .await
        .unwrap_err();

    assert_eq!(summaries(&err), vec!["Error reading reader group"]);
    assert_eq!(post.hits_async().await, 0);
}

#[tokio::test]
async fn create_gives_up_on_undistributed_collection() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/group/Name=pim_readers");
            then.status(200).body(GROUP_XML);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/collection/Acct=PIM_TEST/Col=pim_test_col");
            then.status(204);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/collection/Col=pim_test_col");
            then.status(200).body(PENDING_COLLECTION_XML);
        })
        .await;

    let err = provider_for(&server)
        .create("kmi_collections", collection_plan())
        .await
        .unwrap_err();
    assert_eq!(summaries(&err), vec!["Error waiting for collection distribution"]);
}

#[tokio::test]
async fn read_collection_data_source() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/collection/Col=pim_test_col");
            then.status(200).body(DISTRIBUTED_COLLECTION_XML);
        })
        .await;

    let data = provider_for(&server)
        .read_data_source("kmi_collections", json!({ "name": "pim_test_col" }))
        .await
        .unwrap();

    assert_eq!(data["account_name"], "PIM_TEST");
    assert_eq!(data["readers"], "pim_readers");
    assert_eq!(data["definitions"], json!(["pim_test_def"]));
}

#[tokio::test]
async fn opaque_definition_lifecycle() {
    let server = MockServer::start_async().await;
    let save = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/definition/Col=pim_test_col/Def=pim_opaque")
                .body(r#"<definition type="opaque"></definition>"#);
            then.status(204);
        })
        .await;
    let secret = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/secret/Col=pim_test_col/Def=pim_opaque/Idx=AUTOINDEX")
                .body(r#"<secret><block name="opaque" b64encoded="true">dGVzdA==</block></secret>"#);
            then.status(204);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/definition/Col=pim_test_col/Def=pim_opaque");
            then.status(200).body(
                r#"<definition name="pim_opaque" source="kmi" type="opaque" modified="1683032101"><secret index="1" source="kmi"><block name="opaque"/></secret></definition>"#,
            );
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/definition/Col=pim_test_col/Def=pim_opaque");
            then.status(204);
        })
        .await;

    let provider = provider_for(&server);
    let plan = json!({ "name": "pim_opaque", "collection_name": "pim_test_col", "opaque": "test" });

    let state = provider.create("kmi_definitions", plan).await.unwrap();
    assert_eq!(state["secret_indexes"], "1,");
    assert_eq!(state["opaque"], "test");

    provider.delete("kmi_definitions", state).await.unwrap();

    save.assert_async().await;
    secret.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn definition_needs_exactly_one_kind() {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);

    let err = provider
        .create("kmi_definitions", json!({ "name": "d", "collection_name": "c" }))
        .await
        .unwrap_err();
    assert_eq!(summaries(&err), vec!["Missing definition type"]);

    let err = provider
        .create(
            "kmi_definitions",
            json!({
                "name": "d",
                "collection_name": "c",
                "opaque": "x",
                "azure_sp": { "auto_generate": true }
            }),
        )
        .await
        .unwrap_err();
    assert_eq!(summaries(&err), vec!["Conflicting definition types"]);
}

#[tokio::test]
async fn collection_lifecycle() {
    let server = MockServer::start_async().await;
    let post = server
        .mock_async(|when, then| {
            when.method(POST).path("/collection/Acct=PIM_TEST/Col=pim_test_col").body(
                "<collection><adders>pim_adders</adders><modifiers>pim_modifiers</modifiers><readers>pim_readers</readers></collection>",
            );
            then.status(204);
        })
        .await;
    let get = server
        .mock_async(|when, then| {
            when.method(GET).path("/collection/Col=pim_test_col");
            then.status(200).body(DISTRIBUTED_COLLECTION_XML);
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/collection/Col=pim_test_col");
            then.status(204);
        })
        .await;

    let provider = provider_for(&server);
    let mut prior = collection_plan();
    prior["adders"] = json!("old_adders");
    prior["distributed_date"] = serde_json::Value::Null;
    prior["last_updated"] = json!("Monday, 01-May-23 10:00:00 UTC");

    let state = provider.read("kmi_collections", prior.clone()).await.unwrap().unwrap();
    assert_eq!(state["adders"], "pim_adders");
    assert_eq!(state["distributed_date"], "Tue May  2 13:57:02 2023");
    assert_eq!(state["last_updated"], "Monday, 01-May-23 10:00:00 UTC");

    let updated = provider.update("kmi_collections", prior, collection_plan()).await.unwrap();
    assert_eq!(updated["readers"], "pim_readers");
    assert_eq!(updated["distributed_date"], "Tue May  2 13:57:02 2023");
    assert!(updated["last_updated"].is_string());

    provider.delete("kmi_collections", updated).await.unwrap();

    post.assert_async().await;
    assert_eq!(get.hits_async().await, 2);
    delete.assert_async().await;
}

#[tokio::test]
async fn read_vanished_collection() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/collection/Col=pim_test_col");
            then.status(404);
        })
        .await;

    let state = provider_for(&server).read("kmi_collections", collection_plan()).await.unwrap();
    assert!(state.is_none());
}
