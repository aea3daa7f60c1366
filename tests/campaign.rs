//! Campaign Orchestrator Integration Tests
//!
//! Drives full campaign runs against mock collaborators and asserts the
//! terminal envelope, the log stream, and which collaborators ran.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use promogen::core::MemorySink;
use promogen::domain::{LogTag, RenderOutcome, Selection};
use promogen::Orchestrator;

use common::{happy_mocks, MockImages, RankBehavior};

/// Index of the first log entry carrying the given tag.
fn first_index(log: &[promogen::LogEntry], tag: LogTag) -> Option<usize> {
    log.iter().position(|e| e.tag == tag)
}

#[tokio::test]
async fn happy_path_produces_full_bundle_and_ordered_log() {
    let mocks = happy_mocks();
    let orchestrator = Orchestrator::new(mocks.services());

    let campaign = orchestrator
        .run("https://example.com/product", false, None)
        .await;

    assert!(campaign.succeeded(), "expected success: {:?}", campaign.error());
    let bundle = campaign.result().unwrap();

    // ranking picked index 1 and validation passed
    assert_eq!(
        bundle.selected_image,
        Selection::Selected("https://shop.example.com/img/1.jpg".to_string())
    );
    assert_eq!(bundle.product.product_name, "Acme Buds");
    assert!(!bundle.research_prompt.is_empty());
    assert!(bundle.script.starts_with("[Scene 1]"));
    assert!(matches!(bundle.render, RenderOutcome::Completed { .. }));

    // INTEL → TREND → SCRIPT → RENDER relative order, with at least two
    // RENDER entries
    let intel = first_index(&campaign.log, LogTag::Intel).expect("INTEL entry");
    let trend = first_index(&campaign.log, LogTag::Trend).expect("TREND entry");
    let script = first_index(&campaign.log, LogTag::Script).expect("SCRIPT entry");
    let render = first_index(&campaign.log, LogTag::Render).expect("RENDER entry");
    assert!(intel < trend && trend < script && script < render);

    let render_count = campaign
        .log
        .iter()
        .filter(|e| e.tag == LogTag::Render)
        .count();
    assert!(render_count >= 2, "expected >= 2 RENDER entries, got {render_count}");

    // the renderer ran exactly once
    assert_eq!(mocks.video.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn log_timestamps_are_monotonic_and_log_is_nonempty() {
    let mocks = happy_mocks();
    let orchestrator = Orchestrator::new(mocks.services());

    let campaign = orchestrator
        .run("https://example.com/product", false, None)
        .await;

    assert!(!campaign.log.is_empty());
    for pair in campaign.log.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
}

#[tokio::test]
async fn no_qualifying_image_still_succeeds_with_generated_reference() {
    let mut mocks = happy_mocks();
    mocks.images = Arc::new(MockImages {
        rank: RankBehavior::NoneQualify,
        ..Default::default()
    });
    let orchestrator = Orchestrator::new(mocks.services());

    let campaign = orchestrator
        .run("https://example.com/product", false, None)
        .await;

    assert!(campaign.succeeded());
    let bundle = campaign.result().unwrap();
    assert!(bundle.selected_image.is_generated());
    // the generated reference is not any original candidate
    assert!(!bundle
        .selected_image
        .reference()
        .starts_with("https://shop.example.com/img/"));
    assert_eq!(mocks.images.synthesis_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalid_url_fails_before_any_collaborator_runs() {
    let mocks = happy_mocks();
    let orchestrator = Orchestrator::new(mocks.services());

    let campaign = orchestrator.run("not-a-url", false, None).await;

    assert!(!campaign.succeeded());
    let error = campaign.error().unwrap();
    assert!(error.contains("not-a-url"), "validation message names the input: {error}");

    // the only log output is the validation rejection
    assert_eq!(campaign.log.len(), 1);
    assert_eq!(campaign.log[0].tag, LogTag::Error);
    assert_eq!(mocks.scraper.calls.load(Ordering::SeqCst), 0);
    assert_eq!(mocks.video.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn skip_render_packages_inputs_without_calling_renderer() {
    let mocks = happy_mocks();
    let orchestrator = Orchestrator::new(mocks.services());

    let campaign = orchestrator
        .run("https://example.com/product", true, None)
        .await;

    assert!(campaign.succeeded());
    let bundle = campaign.result().unwrap();

    match &bundle.render {
        RenderOutcome::Skipped { video_prompt, image } => {
            assert_eq!(video_prompt, &bundle.video_prompt);
            assert_eq!(image, bundle.selected_image.reference());
            assert!(video_prompt.contains("Audio"));
        }
        RenderOutcome::Completed { .. } => panic!("expected skipped render"),
    }

    assert_eq!(mocks.video.calls.load(Ordering::SeqCst), 0);
    assert!(campaign
        .log
        .iter()
        .any(|e| e.tag == LogTag::System && e.message.to_lowercase().contains("skipped")));
}

#[tokio::test]
async fn collaborator_failure_short_circuits_and_logs_error() {
    let mut mocks = happy_mocks();
    mocks.insights = Arc::new(common::MockInsights {
        fail: true,
        ..Default::default()
    });
    let orchestrator = Orchestrator::new(mocks.services());

    let campaign = orchestrator
        .run("https://example.com/product", false, None)
        .await;

    assert!(!campaign.succeeded());
    let error = campaign.error().unwrap();
    assert!(error.contains("trend"), "failure names the stage: {error}");

    // the failing campaign logged an ERROR entry and retained everything
    // up to the failure point
    assert!(campaign.log.iter().any(|e| e.tag == LogTag::Error));
    assert!(campaign.log.iter().any(|e| e.tag == LogTag::Intel));

    // nothing after the failing stage ran
    assert!(!campaign.log.iter().any(|e| e.tag == LogTag::Script));
    assert_eq!(mocks.images.rank_calls.load(Ordering::SeqCst), 0);
    assert_eq!(mocks.video.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn live_sink_receives_every_entry_as_recorded() {
    let mocks = happy_mocks();
    let orchestrator = Orchestrator::new(mocks.services());
    let sink = MemorySink::new();

    let campaign = orchestrator
        .run(
            "https://example.com/product",
            true,
            Some(Arc::new(sink.clone())),
        )
        .await;

    let streamed = sink.entries();
    assert_eq!(streamed.len(), campaign.log.len());
    for (streamed, recorded) in streamed.iter().zip(campaign.log.iter()) {
        assert_eq!(streamed.message, recorded.message);
        assert_eq!(streamed.tag, recorded.tag);
    }
}

#[tokio::test]
async fn dropped_subscriber_does_not_change_the_outcome() {
    let mocks = happy_mocks();
    let orchestrator = Orchestrator::new(mocks.services());

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    drop(rx);

    let campaign = orchestrator
        .run("https://example.com/product", true, Some(Arc::new(tx)))
        .await;

    assert!(campaign.succeeded());
    assert!(!campaign.log.is_empty());
}

#[tokio::test]
async fn insights_session_id_is_fresh_per_campaign() {
    let mocks = happy_mocks();
    let orchestrator = Orchestrator::new(mocks.services());

    for _ in 0..5 {
        let campaign = orchestrator
            .run("https://example.com/product", true, None)
            .await;
        assert!(campaign.succeeded());
    }

    let ids = mocks.insights.session_ids.lock().unwrap().clone();
    assert_eq!(ids.len(), 5);
    // five identical draws from 0..1_000_000 would be astonishing
    let distinct: std::collections::HashSet<_> = ids.iter().collect();
    assert!(distinct.len() > 1, "session ids never varied: {ids:?}");
}
