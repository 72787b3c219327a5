// tests/ai_fallback.rs
//
// Provider chain behaviour with scripted in-process providers (no network):
// rotation on auth/quota failures, early abandon on other failures, secondary
// fallback (also for unparseable primary replies), and total failure degrading
// to keyword-only output.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use budget_extractor::ai::{
    AiExtractor, ChatProvider, Credential, ExtractionPrompt, ModelReply, ProviderError,
    ProviderPool,
};
use budget_extractor::config::ExtractionConfig;
use budget_extractor::{Pipeline, Sector};

struct Scripted {
    name: &'static str,
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    keys_seen: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(name: &'static str, script: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            script: Mutex::new(script.into()),
            keys_seen: Mutex::new(Vec::new()),
        })
    }

    fn keys_seen(&self) -> Vec<String> {
        self.keys_seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatProvider for Scripted {
    async fn complete(
        &self,
        credential: &Credential,
        _prompt: &ExtractionPrompt,
    ) -> Result<String, ProviderError> {
        self.keys_seen
            .lock()
            .unwrap()
            .push(credential.key().to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Transport("script exhausted".into())))
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

const YEARS: [u16; 3] = [2022, 2023, 2024];

fn pool(keys: &[&str]) -> Arc<ProviderPool> {
    Arc::new(ProviderPool::new(keys.iter().copied()))
}

fn ok(json: &str) -> Result<String, ProviderError> {
    Ok(json.to_string())
}

#[tokio::test]
async fn rotates_past_auth_and_quota_failures() {
    let primary = Scripted::new(
        "primary",
        vec![
            Err(ProviderError::Auth(401)),
            Err(ProviderError::RateLimited),
            ok(r#"{"Total Budget": 42}"#),
        ],
    );
    let keys = pool(&["k1", "k2", "k3"]);
    let ai = AiExtractor::new(1_000, &YEARS).with_primary(primary.clone(), keys.clone());

    let reply = ai.extract("Total 1").await;
    match reply {
        ModelReply::Structured(m) => assert_eq!(m["Total Budget"], 42),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(primary.keys_seen(), vec!["k1", "k2", "k3"]);
    // Index stays on the slot that worked.
    assert_eq!(keys.current_slot(), 2);
}

#[tokio::test]
async fn non_auth_failure_skips_remaining_slots() {
    let primary = Scripted::new(
        "primary",
        vec![Err(ProviderError::Malformed("bad body".into())), ok("{}")],
    );
    let secondary = Scripted::new("secondary", vec![ok(r#"{"Adaptation": "7"}"#)]);
    let ai = AiExtractor::new(1_000, &YEARS)
        .with_primary(primary.clone(), pool(&["k1", "k2"]))
        .with_secondary(secondary.clone(), "s1");

    let reply = ai.extract("text").await;
    assert!(matches!(reply, ModelReply::Structured(_)));
    assert_eq!(primary.keys_seen(), vec!["k1"]);
    assert_eq!(secondary.keys_seen(), vec!["s1"]);
}

#[tokio::test]
async fn exhausted_slots_fall_through_to_secondary() {
    let primary = Scripted::new(
        "primary",
        vec![Err(ProviderError::Auth(401)), Err(ProviderError::Auth(403))],
    );
    let secondary = Scripted::new("secondary", vec![ok("not json at all")]);
    let keys = pool(&["k1", "k2"]);
    let ai = AiExtractor::new(1_000, &YEARS)
        .with_primary(primary.clone(), keys.clone())
        .with_secondary(secondary, "s1");

    let reply = ai.extract("text").await;
    assert_eq!(reply, ModelReply::Degraded("not json at all".into()));
    assert_eq!(primary.keys_seen(), vec!["k1", "k2"]);
    assert_eq!(keys.current_slot(), 0);
}

#[tokio::test]
async fn both_providers_down_yields_keyword_fields_only() {
    let primary = Scripted::new(
        "primary",
        vec![Err(ProviderError::Transport("connection refused".into()))],
    );
    let secondary = Scripted::new(
        "secondary",
        vec![Err(ProviderError::Transport("timed out".into()))],
    );
    let ai = AiExtractor::new(1_000, &YEARS)
        .with_primary(primary, pool(&["k1"]))
        .with_secondary(secondary, "s1");
    assert_eq!(ai.extract("x").await, ModelReply::Empty);

    let primary = Scripted::new("primary", vec![Err(ProviderError::Transport("down".into()))]);
    let secondary = Scripted::new("secondary", vec![Err(ProviderError::Transport("down".into()))]);
    let ai = AiExtractor::new(1_000, &YEARS)
        .with_primary(primary, pool(&["k1"]))
        .with_secondary(secondary, "s1");
    let pipeline = Pipeline::new(ExtractionConfig::default(), Some(ai));

    let rec = pipeline
        .extract_budget_info("Total Budget: 5,000,000 Energy 17 Mitigation 3.5")
        .await;
    assert_eq!(rec.total_budget, Some(5_000_000.0));
    assert_eq!(rec.sectors.get(Sector::Energy), Some(17.0));
    assert_eq!(rec.indicator("Mitigation"), Some(3.5));
    assert!(rec.raw_reply.is_none());
    assert!(rec.climate_projects.is_empty());
}

#[tokio::test]
async fn model_output_takes_precedence_in_pipeline() {
    let primary = Scripted::new(
        "primary",
        vec![ok(
            "```json\n{\"Total Budget\": \"9,999\", \"Sectors\": {\"Energy\": null, \"Health\": \"12\"},\n \"Climate Projects\": [{\"Programme\": \"17 - Irrigation\", \"2024\": \"300\",},],}\n```",
        )],
    );
    let ai = AiExtractor::new(1_000, &YEARS).with_primary(primary, pool(&["k1"]));
    let pipeline = Pipeline::new(ExtractionConfig::default(), Some(ai));

    let rec = pipeline
        .extract_budget_info("Total Budget 5,000 Energy 40 Health 99")
        .await;
    assert_eq!(rec.total_budget, Some(9_999.0));
    assert_eq!(rec.sectors.get(Sector::Energy), Some(40.0));
    assert_eq!(rec.sectors.get(Sector::Health), Some(12.0));
    assert_eq!(rec.climate_projects.len(), 1);
    assert_eq!(rec.climate_projects[0].year(2024), Some(300.0));
}

#[tokio::test]
async fn degraded_reply_is_preserved_on_record() {
    let primary = Scripted::new("primary", vec![ok("I could not find a budget table.")]);
    let ai = AiExtractor::new(1_000, &YEARS).with_primary(primary, pool(&["k1"]));
    let pipeline = Pipeline::new(ExtractionConfig::default(), Some(ai));

    let rec = pipeline.extract_budget_info("Public 10").await;
    assert_eq!(
        rec.raw_reply.as_deref(),
        Some("I could not find a budget table.")
    );
    assert_eq!(rec.indicator("Public"), Some(10.0));
}

#[tokio::test]
async fn rotation_index_persists_across_requests() {
    let primary = Scripted::new(
        "primary",
        vec![
            Err(ProviderError::RateLimited),
            ok("{}"),
            ok("{}"),
        ],
    );
    let keys = pool(&["k1", "k2"]);
    let ai = AiExtractor::new(1_000, &YEARS).with_primary(primary.clone(), keys);

    ai.extract("first").await;
    ai.extract("second").await;
    assert_eq!(primary.keys_seen(), vec!["k1", "k2", "k2"]);
}

#[tokio::test]
async fn request_starting_on_last_slot_wraps_to_first() {
    let primary = Scripted::new(
        "primary",
        vec![
            Err(ProviderError::RateLimited),
            Err(ProviderError::RateLimited),
            ok(r#"{"Total Budget": 1}"#),
            Err(ProviderError::Auth(401)),
            ok(r#"{"Total Budget": 2}"#),
        ],
    );
    let keys = pool(&["k1", "k2", "k3"]);
    let ai = AiExtractor::new(1_000, &YEARS).with_primary(primary.clone(), keys.clone());

    assert!(matches!(ai.extract("first").await, ModelReply::Structured(_)));
    assert_eq!(keys.current_slot(), 2);

    match ai.extract("second").await {
        ModelReply::Structured(m) => assert_eq!(m["Total Budget"], 2),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(primary.keys_seen(), vec!["k1", "k2", "k3", "k3", "k1"]);
    assert_eq!(keys.current_slot(), 0);
}

#[tokio::test]
async fn attempts_per_request_are_bounded_by_slot_count() {
    let primary = Scripted::new(
        "primary",
        vec![
            Err(ProviderError::Auth(401)),
            Err(ProviderError::Auth(401)),
            ok("{}"),
        ],
    );
    let ai = AiExtractor::new(1_000, &YEARS).with_primary(primary.clone(), pool(&["k1", "k2"]));

    assert_eq!(ai.extract("x").await, ModelReply::Empty);
    assert_eq!(primary.keys_seen(), vec!["k1", "k2"]);
}

#[tokio::test]
async fn unparseable_primary_reply_falls_through_to_secondary() {
    let primary = Scripted::new("primary", vec![ok("sorry, no")]);
    let secondary = Scripted::new("secondary", vec![ok(r#"{"Total Budget": 7}"#)]);
    let ai = AiExtractor::new(1_000, &YEARS)
        .with_primary(primary, pool(&["k1"]))
        .with_secondary(secondary.clone(), "s1");

    match ai.extract("text").await {
        ModelReply::Structured(m) => assert_eq!(m["Total Budget"], 7),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(secondary.keys_seen(), vec!["s1"]);
}

#[tokio::test]
async fn unparseable_primary_reply_kept_when_secondary_fails() {
    let primary = Scripted::new("primary", vec![ok("sorry, no")]);
    let secondary = Scripted::new(
        "secondary",
        vec![Err(ProviderError::Transport("timed out".into()))],
    );
    let ai = AiExtractor::new(1_000, &YEARS)
        .with_primary(primary, pool(&["k1"]))
        .with_secondary(secondary.clone(), "s1");

    assert_eq!(ai.extract("text").await, ModelReply::Degraded("sorry, no".into()));
    assert_eq!(secondary.keys_seen(), vec!["s1"]);

    // A second degraded reply does not replace the first.
    let primary = Scripted::new("primary", vec![ok("sorry, no")]);
    let secondary = Scripted::new("secondary", vec![ok("also not json")]);
    let ai = AiExtractor::new(1_000, &YEARS)
        .with_primary(primary, pool(&["k1"]))
        .with_secondary(secondary, "s1");
    assert_eq!(ai.extract("text").await, ModelReply::Degraded("sorry, no".into()));
}
