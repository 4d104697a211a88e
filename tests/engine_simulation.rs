//! End-to-end simulation of a full assessment session.
//!
//! Drives the real handler stack (create session, get batch, submit
//! answers) against in-memory adapters and a realistic question bank,
//! then checks the engine's core guarantees:
//!
//! 1. Exact completion: the session lands on exactly the target total
//! 2. No duplicate presented item ids
//! 3. Monotonic stage history ending at the terminal stage
//! 4. Confidence bounds on every dimension at all times
//! 5. Big-Five average confidence above 50 after 70 neutral answers

use std::collections::HashSet;
use std::sync::Arc;

use trait_compass::adapters::catalog::InMemoryItemRepository;
use trait_compass::adapters::storage::InMemorySessionStore;
use trait_compass::application::handlers::{
    AnswerSubmission, CreateSessionCommand, CreateSessionHandler, NextQuestionsCommand,
    NextQuestionsHandler, SubmitResponsesCommand, SubmitResponsesHandler,
};
use trait_compass::config::AppConfig;
use trait_compass::domain::catalog::{Item, ItemCategory};
use trait_compass::domain::confidence::ConfidenceTracker;
use trait_compass::domain::dimension::BigFiveTrait;
use trait_compass::domain::foundation::{ItemId, UserId};
use trait_compass::ports::{ItemRepository, SessionStore};

// =============================================================================
// Test bank
// =============================================================================

fn item(id: String, category: ItemCategory) -> Item {
    Item::new(ItemId::new(id).unwrap(), "Simulated question text", category)
}

/// A bank shaped like a production question pool: facet-complete
/// personality items with anchors, short and full clinical instruments,
/// neurodiversity flags, the satellite categories, and validity items.
fn realistic_bank() -> Vec<Item> {
    let mut items = Vec::new();

    for t in BigFiveTrait::all() {
        for (f, facet) in t.facets().iter().enumerate() {
            for n in 0..3 {
                let mut it = item(
                    format!("{}_{}_{}", t.key(), facet, n),
                    ItemCategory::Personality,
                )
                .with_trait(*t)
                .with_facet(*facet)
                .with_discrimination(0.55 + 0.05 * ((n + f) % 5) as f64);
                if f == 0 && n == 0 {
                    it = it.with_tag("anchor").with_discrimination(0.85);
                }
                items.push(it);
            }
        }
    }

    for (instrument, tag, count) in [
        ("phq2", "depression", 2),
        ("gad2", "anxiety", 2),
        ("phq9", "depression", 7),
        ("gad7", "anxiety", 7),
        ("asrm", "mania", 3),
        ("msi_bpd", "borderline", 4),
        ("audit", "substance_use", 4),
    ] {
        for n in 0..count {
            items.push(
                item(format!("{}_{}", instrument, n), ItemCategory::Clinical)
                    .with_instrument(instrument)
                    .with_tag(tag)
                    .with_discrimination(0.6 + 0.02 * n as f64),
            );
        }
    }

    for kind in ["adhd", "autism", "sensory_processing", "executive_function", "masking"] {
        for n in 0..3 {
            items.push(
                item(format!("nd_{}_{}", kind, n), ItemCategory::Neurodiversity)
                    .with_tag(kind)
                    .with_discrimination(0.62 + 0.03 * n as f64),
            );
        }
    }

    for n in 0..6 {
        let style = if n % 2 == 0 { "anxious" } else { "avoidant" };
        items.push(
            item(format!("att_{}", n), ItemCategory::Attachment)
                .with_instrument("attachment")
                .with_tag(style),
        );
    }
    for n in 0..4 {
        items.push(item(format!("tra_{}", n), ItemCategory::Trauma));
        items.push(item(format!("cog_{}", n), ItemCategory::Cognitive));
        items.push(
            item(format!("res_{}", n), ItemCategory::Personality).with_instrument("resilience"),
        );
        items.push(
            item(format!("int_{}", n), ItemCategory::Personality)
                .with_instrument("interpersonal"),
        );
        items.push(
            item(format!("hh_{}", n), ItemCategory::Personality)
                .with_instrument("honesty_humility"),
        );
    }

    for pair in 0..5 {
        for half in ["a", "b"] {
            items.push(
                item(format!("vld_pair{}_{}", pair, half), ItemCategory::Validity)
                    .with_tag("inconsistency")
                    .with_tag(format!("pair_{}", pair)),
            );
        }
    }
    for n in 0..3 {
        items.push(item(format!("vld_inf_{}", n), ItemCategory::Validity).with_tag("infrequency"));
    }
    items.push(item("vld_pi_0".to_string(), ItemCategory::Validity).with_tag("positive_impression"));

    items
}

// =============================================================================
// Simulation harness
// =============================================================================

struct Harness {
    store: Arc<InMemorySessionStore>,
    create: CreateSessionHandler,
    next: NextQuestionsHandler,
    submit: SubmitResponsesHandler,
}

impl Harness {
    fn new(bank: Vec<Item>) -> Self {
        // RUST_LOG=debug surfaces stage transitions and budget decisions
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let store = Arc::new(InMemorySessionStore::new());
        let repo: Arc<dyn ItemRepository> = Arc::new(InMemoryItemRepository::new(bank));
        let config = AppConfig::default();
        Self {
            store: store.clone(),
            create: CreateSessionHandler::new(store.clone()),
            next: NextQuestionsHandler::new(store.clone(), repo.clone(), config.clone()),
            submit: SubmitResponsesHandler::new(store, repo, config),
        }
    }
}

/// One round of the simulated dialogue: the stage that served the batch
/// and the item ids it contained.
struct Round {
    stage: u8,
    item_ids: Vec<String>,
}

/// Runs a whole session answering every item with the given score.
async fn run_session(
    harness: &Harness,
    score: f64,
) -> (Vec<Round>, trait_compass::domain::session::AssessmentSession) {
    let user = UserId::new("sim-user").unwrap();
    let session = harness
        .create
        .handle(CreateSessionCommand { user_id: user.clone() })
        .await
        .unwrap();

    let mut rounds = Vec::new();
    let mut latency = 2_500u64;

    // generous upper bound; the engine should finish in well under 30
    for _round in 0..30 {
        let batch = harness
            .next
            .handle(NextQuestionsCommand {
                session_id: *session.id(),
                user_id: user.clone(),
            })
            .await
            .unwrap();

        if batch.questions.is_empty() {
            break;
        }
        rounds.push(Round {
            stage: batch.stage,
            item_ids: batch
                .questions
                .iter()
                .map(|q| q.id().as_str().to_string())
                .collect(),
        });

        let answers: Vec<AnswerSubmission> = batch
            .questions
            .iter()
            .map(|q| {
                latency += 137;
                AnswerSubmission {
                    item_id: q.id().clone(),
                    score,
                    latency_ms: Some(latency),
                }
            })
            .collect();

        let result = harness
            .submit
            .handle(SubmitResponsesCommand {
                session_id: *session.id(),
                user_id: user.clone(),
                answers,
            })
            .await
            .unwrap();

        if result.completed {
            break;
        }
    }

    let final_session = harness.store.load(session.id()).await.unwrap();
    (rounds, final_session)
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test]
async fn neutral_session_completes_exactly_at_the_target() {
    let harness = Harness::new(realistic_bank());
    let (rounds, session) = run_session(&harness, 50.0).await;

    // exact completion
    let sizes: Vec<usize> = rounds.iter().map(|r| r.item_ids.len()).collect();
    assert_eq!(session.answered_count(), 70, "batches were {:?}", sizes);
    assert_eq!(session.stage().number(), 4);
    assert_eq!(
        session.status(),
        trait_compass::domain::session::SessionStatus::Completed
    );

    // the terminal stage was reached through the selectors, not a jump
    assert_eq!(rounds.first().unwrap().stage, 1);
    assert_eq!(rounds.last().unwrap().stage, 4);
}

#[tokio::test]
async fn no_item_is_ever_presented_twice() {
    let harness = Harness::new(realistic_bank());
    let (_, session) = run_session(&harness, 50.0).await;

    let ids: HashSet<&ItemId> = session.presented().iter().collect();
    assert_eq!(ids.len(), session.presented().len());
    // every answer corresponds to a presented item
    assert_eq!(session.presented().len(), session.answered_count());
}

#[tokio::test]
async fn stage_history_is_monotonic() {
    let harness = Harness::new(realistic_bank());
    let (rounds, session) = run_session(&harness, 50.0).await;

    let stages: Vec<u8> = rounds.iter().map(|r| r.stage).collect();
    let mut sorted = stages.clone();
    sorted.sort_unstable();
    assert_eq!(stages, sorted, "stages went backwards: {:?}", stages);

    let history: Vec<u8> = session
        .stage_history()
        .iter()
        .map(|t| t.from_stage.number())
        .collect();
    let mut sorted_history = history.clone();
    sorted_history.sort_unstable();
    assert_eq!(history, sorted_history);
}

#[tokio::test]
async fn confidence_stays_in_bounds_for_every_dimension() {
    let harness = Harness::new(realistic_bank());
    let (_, session) = run_session(&harness, 50.0).await;

    let tracker = ConfidenceTracker::from_snapshot(session.confidence_snapshot().clone());
    for (key, record) in tracker.iter() {
        let c = record.confidence().value();
        assert!((0.0..=100.0).contains(&c), "{} confidence {}", key, c);
        let s = record.average().value();
        assert!((0.0..=100.0).contains(&s), "{} score {}", key, s);
    }
}

#[tokio::test]
async fn neutral_answers_build_strong_big_five_confidence() {
    let harness = Harness::new(realistic_bank());
    let (_, session) = run_session(&harness, 50.0).await;

    let tracker = ConfidenceTracker::from_snapshot(session.confidence_snapshot().clone());
    assert!(
        tracker.average_big_five_confidence() > 50.0,
        "average was {}",
        tracker.average_big_five_confidence()
    );
    assert!(tracker.is_ready_for_report());
}

#[tokio::test]
async fn high_scores_still_complete_exactly() {
    // high answers trigger clinical expansion and ND expansion paths
    let harness = Harness::new(realistic_bank());
    let (rounds, session) = run_session(&harness, 85.0).await;

    assert_eq!(session.answered_count(), 70);
    assert_eq!(session.stage().number(), 4);

    // the positive screens expanded their full instruments in stage 2
    let stage2_ids: Vec<&String> = rounds
        .iter()
        .filter(|r| r.stage == 2)
        .flat_map(|r| r.item_ids.iter())
        .collect();
    assert!(stage2_ids.iter().any(|id| id.starts_with("phq9")));
    assert!(stage2_ids.iter().any(|id| id.starts_with("gad7")));
}

#[tokio::test]
async fn low_scores_never_expand_screeners_in_stage_two() {
    // low answers keep every screener below its gate (raw 0 + 0)
    let harness = Harness::new(realistic_bank());
    let (rounds, session) = run_session(&harness, 10.0).await;

    assert_eq!(session.answered_count(), 70);
    let stage2_ids: Vec<&String> = rounds
        .iter()
        .filter(|r| r.stage == 2)
        .flat_map(|r| r.item_ids.iter())
        .collect();
    assert!(stage2_ids.iter().all(|id| !id.starts_with("phq9")));
    assert!(stage2_ids.iter().all(|id| !id.starts_with("gad7")));
}

#[tokio::test]
async fn two_simulated_sessions_are_independent() {
    let harness = Harness::new(realistic_bank());
    let (_, first) = run_session(&harness, 50.0).await;
    let (_, second) = run_session(&harness, 85.0).await;

    assert_ne!(first.id(), second.id());
    assert_eq!(first.answered_count(), 70);
    assert_eq!(second.answered_count(), 70);
}
