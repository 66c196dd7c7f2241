//! 公開 API を通した SDK 全体の動作テスト

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use googletest::prelude::*;
use rstest::rstest;
use tempfile::TempDir;
use tolgee_sync::codec::strip_markers;
use tolgee_sync::config::{
    SdkConfigBuilder,
    SdkMode,
};
use tolgee_sync::preferences::MemoryPreferences;
use tolgee_sync::storage::{
    MemoryStorage,
    Statement,
    Storage,
};
use tolgee_sync::sync::{
    BootstrapOutcome,
    ReadyState,
};
use tolgee_sync::types::{
    Language,
    Rect,
    Translation,
};
use tolgee_sync::{
    Sdk,
    SyncError,
};

use crate::common::{
    Backend,
    config,
    key,
    language,
};

fn backend() -> Arc<Backend> {
    Arc::new(Backend::new(
        20,
        vec![language(1, "en", true), language(2, "cs", false)],
        vec![
            key(10, "home.title", &[("en", 100, "Home"), ("cs", 101, "Domů")]),
            key(11, "home.subtitle", &[("en", 102, "Welcome")]),
        ],
    ))
}

fn sdk_with(backend: Arc<Backend>, preferences: MemoryPreferences) -> Sdk {
    Sdk::builder(config()).backend(backend).preferences(Arc::new(preferences)).build().unwrap()
}

fn texts(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(tag, text)| ((*tag).to_string(), (*text).to_string())).collect()
}

#[tokio::test]
async fn test_all_pages_are_merged_before_ready() {
    let keys = (0..45).map(|i| key(i + 1, &format!("key.{i}"), &[("en", 1000 + i, "x")])).collect();
    let backend = Arc::new(Backend::new(20, vec![language(1, "en", true)], keys));
    let sdk = sdk_with(backend.clone(), MemoryPreferences::new());

    let outcome = sdk.bootstrap().await.unwrap();

    assert_that!(outcome, eq(BootstrapOutcome::Network));
    assert_that!(backend.requested_pages(), elements_are![eq(&0), eq(&1), eq(&2)]);
    assert_that!(sdk.translations().await.unwrap(), len(eq(45)));
}

#[tokio::test]
async fn test_preload_is_used_once_then_network() {
    let dir = TempDir::new().unwrap();
    let preload_path = dir.path().join("preload.json");
    std::fs::write(
        &preload_path,
        r#"[
            {"upsertLanguage": {"id": 1, "name": "English", "originalName": "English",
                                "tag": "en", "flagGlyph": "", "isBase": true}},
            {"upsertKey": {"id": 10, "name": "home.title"}},
            {"putTranslation": {"id": 100, "keyId": 10, "languageId": 1, "text": "Home (bundled)"}}
        ]"#,
    )
    .unwrap();
    let config = SdkConfigBuilder::new()
        .base_url("https://app.tolgee.io")
        .api_key("test-key")
        .mode(SdkMode::Release)
        .preload_path(&preload_path)
        .preferences_path(dir.path().join("preferences.json"))
        .build()
        .unwrap();

    let first = Sdk::builder(config.clone()).backend(backend()).build().unwrap();
    assert_that!(first.bootstrap().await.unwrap(), eq(BootstrapOutcome::Preloaded));
    assert_that!(strip_markers(&first.translate("home.title").await.unwrap()), eq("Home (bundled)"));
    first.release();

    let second = Sdk::builder(config).backend(backend()).build().unwrap();
    assert_that!(second.bootstrap().await.unwrap(), eq(BootstrapOutcome::Network));
    assert_that!(strip_markers(&second.translate("home.title").await.unwrap()), eq("Home"));
}

#[rstest]
#[case::persisted_wins(MemoryPreferences::new().with_system_language("cs").with_selected_language("de"), "de")]
#[case::system_language(MemoryPreferences::new().with_system_language("CS"), "cs")]
#[case::unsupported_system_uses_base(MemoryPreferences::new().with_system_language("fr"), "en")]
#[case::no_system_uses_base(MemoryPreferences::new(), "en")]
#[tokio::test]
async fn test_language_selection_on_first_start(
    #[case] preferences: MemoryPreferences,
    #[case] expected: &str,
) {
    let sdk = sdk_with(backend(), preferences);

    sdk.bootstrap().await.unwrap();

    assert_that!(sdk.current_language(), eq(expected));
}

#[gtest]
#[tokio::test]
async fn test_update_keeps_translation_identity() {
    let sdk = sdk_with(backend(), MemoryPreferences::new());
    sdk.bootstrap().await.unwrap();

    let saved = sdk.update_translation("home.title", texts(&[("en", "Start")])).await.unwrap();

    assert_that!(saved.translations["en"].id, eq(100));
    let cached = sdk.translation_store().key_by_name("home.title").unwrap();
    expect_that!(cached.translations["en"].id, eq(100));
    expect_that!(cached.translations["en"].text.as_deref(), some(eq("Start")));
    expect_that!(cached.translations["cs"].id, eq(101));
    assert_that!(strip_markers(&sdk.translate("home.title").await.unwrap()), eq("Start"));
}

#[gtest]
#[tokio::test]
async fn test_refresh_is_idempotent_and_picks_up_changes() {
    let backend = backend();
    let sdk = sdk_with(backend.clone(), MemoryPreferences::new());
    sdk.bootstrap().await.unwrap();
    let before = sdk.translations().await.unwrap();

    let unchanged = sdk.refresh().await.unwrap();
    assert_eq!(unchanged, before);

    backend.set_text(11, "en", "Welcome back");
    sdk.refresh().await.unwrap();

    let subtitle = sdk.translation_store().key_by_name("home.subtitle").unwrap();
    expect_that!(subtitle.translations["en"].id, eq(102));
    expect_that!(subtitle.translations["en"].text.as_deref(), some(eq("Welcome back")));
}

#[tokio::test]
async fn test_failed_refresh_keeps_cache() {
    let backend = backend();
    let sdk = sdk_with(backend.clone(), MemoryPreferences::new());
    sdk.bootstrap().await.unwrap();

    backend.set_offline(true);
    let result = sdk.refresh().await;

    assert!(matches!(result, Err(SyncError::Network { .. })));
    assert_that!(strip_markers(&sdk.translate("home.subtitle").await.unwrap()), eq("Welcome"));
}

#[tokio::test]
async fn test_failed_bootstrap_can_be_retried() {
    let backend = backend();
    backend.set_offline(true);
    let sdk = sdk_with(backend.clone(), MemoryPreferences::new());

    assert!(sdk.bootstrap().await.is_err());
    assert!(matches!(sdk.ready_state(), ReadyState::Error(_)));
    assert!(sdk.wait_until_ready().await.is_err());

    backend.set_offline(false);
    assert_that!(sdk.bootstrap().await.unwrap(), eq(BootstrapOutcome::Network));
    assert!(sdk.ready_state().is_initialized());
    assert_that!(strip_markers(&sdk.translate("home.title").await.unwrap()), eq("Home"));
}

#[tokio::test]
async fn test_new_key_is_created_with_neighbors_as_context() {
    let backend = backend();
    let sdk = sdk_with(backend.clone(), MemoryPreferences::new());
    sdk.bootstrap().await.unwrap();
    sdk.set_screen_provider(|| Some("home".to_string()));

    let cta = sdk.translate("home.cta").await.unwrap();
    let title = sdk.translate("home.title").await.unwrap();
    let subtitle = sdk.translate("home.subtitle").await.unwrap();
    assert_that!(strip_markers(&cta), eq("home.cta"));
    sdk.report_rendered(&cta, Rect::new(0.0, 100.0, 80.0, 20.0));
    sdk.report_rendered(&title, Rect::new(0.0, 0.0, 80.0, 20.0));
    sdk.report_rendered(&subtitle, Rect::new(0.0, 60.0, 80.0, 20.0));

    let created = sdk
        .update_translation_with_context("home.cta", texts(&[("en", "Get started")]))
        .await
        .unwrap();

    let requests = backend.context_requests();
    assert_that!(requests, len(eq(1)));
    let related: Vec<&str> =
        requests[0].related_keys_in_order.iter().map(|r| r.key_name.as_str()).collect();
    assert_eq!(related, vec!["home.subtitle", "home.title"]);
    assert_that!(created.id, ge(5000));
    assert_that!(strip_markers(&sdk.translate("home.cta").await.unwrap()), eq("Get started"));
}

#[tokio::test]
async fn test_release_rejects_later_calls() {
    let sdk = sdk_with(backend(), MemoryPreferences::new());
    sdk.bootstrap().await.unwrap();

    sdk.release();

    assert!(matches!(sdk.bootstrap().await, Err(SyncError::Shutdown)));
    assert!(matches!(sdk.set_language("cs").await, Err(SyncError::Shutdown)));
}

#[gtest]
#[tokio::test]
async fn test_recreated_language_does_not_block_bootstrap() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .transaction(vec![
            Statement::UpsertLanguage(Language {
                id: 1,
                name: "English".to_string(),
                original_name: "English".to_string(),
                tag: "en".to_string(),
                flag_glyph: String::new(),
                is_base: true,
            }),
            Statement::UpsertKey { id: 10, name: "home.title".to_string() },
            Statement::PutTranslation(Translation {
                id: 100,
                key_id: 10,
                language_id: 1,
                text: Some("Home (cached)".to_string()),
            }),
        ])
        .unwrap();
    let backend = Arc::new(Backend::new(
        20,
        vec![language(7, "en", true)],
        vec![key(10, "home.title", &[("en", 100, "Home")])],
    ));
    let sdk = Sdk::builder(config())
        .backend(backend)
        .storage(storage)
        .preferences(Arc::new(MemoryPreferences::new()))
        .build()
        .unwrap();

    sdk.bootstrap().await.unwrap();

    let languages = sdk.languages().await.unwrap();
    assert_that!(languages, len(eq(1)));
    expect_that!(languages[0].id, eq(7));
    let text = sdk.translate("home.title").await.unwrap();
    expect_that!(strip_markers(&text), eq("Home"));
}
