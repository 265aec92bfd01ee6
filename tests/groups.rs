//! Group and group membership lifecycles through the provider.

mod common;

use httpmock::prelude::*;
use serde_json::json;

use common::{GROUP_XML, provider_for, summaries};

#[tokio::test]
async fn group_lifecycle() {
    let server = MockServer::start_async().await;
    let save = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/group/Acct=PIM_TEST/Name=pim_readers")
                .body(r#"<group type="union" account="PIM_TEST"></group>"#);
            then.status(204);
        })
        .await;
    let get = server
        .mock_async(|when, then| {
            when.method(GET).path("/group/Name=pim_readers");
            then.status(200).body(GROUP_XML);
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/group/Name=pim_readers");
            then.status(204);
        })
        .await;

    let provider = provider_for(&server);
    let plan = json!({ "group_name": "pim_readers", "account_name": "PIM_TEST" });

    let state = provider.create("kmi_group", plan).await.unwrap();
    assert_eq!(state["adders"], "PIM_TEST_ADMIN");
    assert_eq!(state["modifiers"], "PIM_TEST_ADMIN");
    assert!(state["last_updated"].is_string());

    let refreshed = provider.read("kmi_group", state.clone()).await.unwrap().unwrap();
    assert_eq!(refreshed, state);

    provider.delete("kmi_group", state).await.unwrap();

    save.assert_async().await;
    assert_eq!(get.hits_async().await, 2);
    delete.assert_async().await;
}

#[tokio::test]
async fn vanished_group_leaves_state() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/group/Name=pim_readers");
            then.status(404);
        })
        .await;

    let state = json!({
        "group_name": "pim_readers",
        "account_name": "PIM_TEST",
        "adders": "PIM_TEST_ADMIN",
        "modifiers": "PIM_TEST_ADMIN",
        "last_updated": "Monday, 01-May-23 10:00:00 UTC"
    });
    let refreshed = provider_for(&server).read("kmi_group", state).await.unwrap();
    assert_eq!(refreshed, None);
}

#[tokio::test]
async fn report_failed_group_creation() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/group/Acct=PIM_TEST/Name=pim_readers");
            then.status(403).body("not an admin of PIM_TEST");
        })
        .await;

    let err = provider_for(&server)
        .create("kmi_group", json!({ "group_name": "pim_readers", "account_name": "PIM_TEST" }))
        .await
        .unwrap_err();
    assert_eq!(summaries(&err), vec!["Error creating group"]);
    assert!(err.to_string().contains("not an admin of PIM_TEST"));
}

#[tokio::test]
async fn membership_update_adds_and_removes() {
    let server = MockServer::start_async().await;
    let add_a = server
        .mock_async(|when, then| {
            when.method(POST).path("/group_membership/Parent=pim_readers/Child=host-a");
            then.status(204);
        })
        .await;
    let add_c = server
        .mock_async(|when, then| {
            when.method(POST).path("/group_membership/Parent=pim_readers/Child=host-c");
            then.status(204);
        })
        .await;
    let remove_b = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/group_membership/Parent=pim_readers/Child=host-b");
            then.status(204);
        })
        .await;
    let remove_a = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/group_membership/Parent=pim_readers/Child=host-a");
            then.status(204);
        })
        .await;
    let group = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/group/Name=pim_readers");
            then.status(204);
        })
        .await;

    let provider = provider_for(&server);
    let prior = json!({ "group_name": "pim_readers", "members": ["host-a", "host-b"] });
    let plan = json!({ "group_name": "pim_readers", "members": ["host-a", "host-c"] });

    let state = provider.update("kmi_group_membership", prior, plan).await.unwrap();
    assert_eq!(state["members"], json!(["host-a", "host-c"]));

    provider
        .delete("kmi_group_membership", json!({ "group_name": "pim_readers", "members": ["host-a"] }))
        .await
        .unwrap();

    add_a.assert_async().await;
    add_c.assert_async().await;
    remove_b.assert_async().await;
    remove_a.assert_async().await;
    assert_eq!(group.hits_async().await, 0);
}

#[tokio::test]
async fn membership_reports_all_failed_members() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/group_membership/Parent=pim_readers/Child=host-a");
            then.status(204);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/group_membership/Parent=pim_readers/Child=host-b");
            then.status(400).body("no such host");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/group_membership/Parent=pim_readers/Child=host-c");
            then.status(400).body("no such host");
        })
        .await;

    let err = provider_for(&server)
        .create(
            "kmi_group_membership",
            json!({ "group_name": "pim_readers", "members": ["host-a", "host-b", "host-c"] }),
        )
        .await
        .unwrap_err();

    assert_eq!(summaries(&err), vec!["Error adding group members"]);
    let detail = &err.iter().next().unwrap().detail;
    assert!(detail.starts_with("host-b: "));
    assert!(detail.contains("\nhost-c: "));
}
