//! End-to-end review session tests against the in-memory backend.
//!
//! Every test runs with an inline executor and a manual clock, so remote
//! calls complete as soon as `poll()` runs and time only moves when the test
//! says so.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use vetter_core::backend::{Fixture, MemoryBackend};
use vetter_core::cache::CacheEntry;
use vetter_core::clock::ManualClock;
use vetter_core::conflict::{Candidates, ReviewMode};
use vetter_core::error::ErrorCode;
use vetter_core::executor::{Executor, InlineExecutor, Job, ThreadExecutor};
use vetter_core::model::{Classification, DecisionAction, Item};
use vetter_core::prefs::{MemoryStore, PreferenceStore, Prefs, ReviewerProfile};
use vetter_core::router::{self, Command, RouteContext};
use vetter_core::session::{
    Action, Ignored, NoticeLevel, Outcome, Phase, ReviewSession, SessionDeps, SessionSettings,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn item(id: &str, existing: Option<&str>, model: Option<&str>) -> Item {
    Item {
        id: id.to_string(),
        description: format!("Receipt line {id}"),
        metadata: BTreeMap::new(),
        existing_code: existing.map(str::to_string),
        existing_label: None,
        model_code: model.map(str::to_string),
        model_label: None,
        confidence_score: 0.9,
        status: "pending".to_string(),
        queue: "high_confidence".to_string(),
    }
}

fn class(code: &str, title: &str) -> Classification {
    Classification {
        code: code.to_string(),
        title: title.to_string(),
        intro: None,
        includes: Some("* loaves\n* rolls".to_string()),
        also_includes: None,
        excludes: None,
    }
}

fn taxonomy() -> Vec<Classification> {
    vec![
        class("01", "Food and non-alcoholic beverages"),
        class("01.1", "Food"),
        class("01.1.1", "Bread and cereals"),
        class("01.1.2", "Meat"),
        class("01.2", "Non-alcoholic beverages"),
        class("01.2.1", "Coffee, tea and cocoa"),
        class("02", "Alcoholic beverages and tobacco"),
        class("02.0", "Unspecified"),
        class("02.0.0", "Unspecified alcoholic beverages"),
    ]
}

struct Harness {
    backend: Arc<MemoryBackend>,
    clock: ManualClock,
    store: Arc<MemoryStore>,
    session: ReviewSession,
}

fn harness(items: Vec<Item>) -> Harness {
    harness_on(items, Arc::new(InlineExecutor))
}

fn harness_on(items: Vec<Item>, executor: Arc<dyn Executor>) -> Harness {
    let backend = Arc::new(MemoryBackend::new(Fixture {
        items,
        classifications: taxonomy(),
        users: Vec::new(),
    }));
    let clock = ManualClock::new();
    let store = Arc::new(MemoryStore::default());
    let profile = ReviewerProfile {
        reviewer_id: "sara".to_string(),
        daily_target: 10,
        queue: None,
    };
    let session = ReviewSession::new(
        SessionDeps {
            backend: backend.clone(),
            executor,
            clock: Arc::new(clock.clone()),
            store: store.clone(),
        },
        profile,
        SessionSettings::default(),
    );
    Harness {
        backend,
        clock,
        store,
        session,
    }
}

fn started(items: Vec<Item>) -> Harness {
    let mut h = harness(items);
    assert!(h.session.start());
    h.session.poll();
    h
}

fn current_id(session: &ReviewSession) -> Option<String> {
    session.review().map(|review| review.item().id.clone())
}

fn press(session: &mut ReviewSession, key: char) -> Option<Outcome> {
    let candidates = session.review().map(|r| Candidates::of(r.item()));
    let input_captured = session.review().is_some_and(|r| r.fix().is_some());
    let command = router::route(
        key,
        RouteContext {
            candidates,
            input_captured,
        },
    )?;
    match command {
        Command::Dispatch(action) => Some(session.dispatch(action)),
        Command::TogglePause | Command::ResetTimer | Command::Quit => None,
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn start_loads_first_item_and_prefetches_hierarchy() {
    let h = started(vec![item("i1", Some("01.1.1"), Some("01.1.2"))]);

    assert_eq!(current_id(&h.session).as_deref(), Some("i1"));
    assert_eq!(
        h.session.required_codes(),
        vec!["01", "01.1", "01.1.1", "01.1.2"]
    );
    for code in ["01", "01.1", "01.1.1", "01.1.2"] {
        assert!(
            matches!(h.session.cache().get(code), Some(CacheEntry::Hit(_))),
            "code {code} should be cached"
        );
        assert_eq!(h.backend.classification_calls(code), 1);
    }
}

#[test]
fn shared_prefixes_are_fetched_once_across_items() {
    let mut h = started(vec![
        item("i1", Some("01.1.1"), Some("01.1.1")),
        item("i2", Some("01.1.2"), Some("01.2.1")),
    ]);
    assert_eq!(h.session.dispatch(Action::Accept { code: None }), Outcome::Submitting);
    h.session.poll();

    assert_eq!(current_id(&h.session).as_deref(), Some("i2"));
    assert_eq!(h.backend.classification_calls("01"), 1);
    assert_eq!(h.backend.classification_calls("01.1"), 1);
    assert_eq!(h.backend.classification_calls("01.2.1"), 1);
}

#[test]
fn empty_queue_is_exhausted_and_restartable() {
    let mut h = started(Vec::new());
    assert!(matches!(h.session.phase(), Phase::Exhausted));
    let notice = h.session.latest_notice().expect("notice");
    assert_eq!(notice.level, NoticeLevel::Info);
    assert_eq!(notice.message, "All items validated");

    assert!(h.session.start());
    h.session.poll();
    assert!(matches!(h.session.phase(), Phase::Exhausted));
}

#[test]
fn fetch_failure_returns_to_idle_with_a_notice() {
    let mut h = harness(vec![item("i1", Some("01.1.1"), None)]);
    h.backend.fail_next_fetches(1);
    h.session.start();
    h.session.poll();

    assert!(matches!(h.session.phase(), Phase::Idle));
    let notices = h.session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);

    assert!(h.session.start());
    h.session.poll();
    assert_eq!(current_id(&h.session).as_deref(), Some("i1"));
}

#[test]
fn start_is_rejected_while_an_item_is_open() {
    let mut h = started(vec![item("i1", Some("01.1.1"), None)]);
    assert!(!h.session.start());
}

// ---------------------------------------------------------------------------
// Conflict model through the keyboard
// ---------------------------------------------------------------------------

#[test]
fn single_match_accept_submits_the_shared_code() {
    let mut h = started(vec![item("i1", Some("01.1.1"), Some("01.1.1"))]);
    assert_eq!(
        h.session.review().map(|r| r.mode()),
        Some(ReviewMode::SingleMatch)
    );
    assert_eq!(press(&mut h.session, 'a'), Some(Outcome::Submitting));
    h.session.poll();

    let decisions = h.backend.decisions();
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].action, DecisionAction::Accept);
    assert_eq!(decisions[0].final_code, "01.1.1");
    assert_eq!(decisions[0].reviewer_id, "sara");
}

#[test]
fn conflict_keys_pick_model_or_existing() {
    let mut h = started(vec![
        item("i1", Some("01.1.1"), Some("01.1.2")),
        item("i2", Some("01.1.1"), Some("01.1.2")),
    ]);

    assert_eq!(press(&mut h.session, 'a'), None);
    assert!(matches!(h.session.phase(), Phase::Presenting(_)));
    assert_eq!(
        h.session.dispatch(Action::Accept { code: None }),
        Outcome::Ignored(Ignored::Disabled)
    );

    assert_eq!(press(&mut h.session, 'm'), Some(Outcome::Submitting));
    h.session.poll();
    assert_eq!(press(&mut h.session, 'X'), Some(Outcome::Submitting));
    h.session.poll();

    let codes: Vec<_> = h
        .backend
        .decisions()
        .into_iter()
        .map(|d| (d.item_id, d.final_code))
        .collect();
    assert_eq!(
        codes,
        vec![
            ("i1".to_string(), "01.1.2".to_string()),
            ("i2".to_string(), "01.1.1".to_string()),
        ]
    );
}

#[test]
fn single_candidate_accept_uses_existing_when_model_missing() {
    let mut h = started(vec![item("i1", Some("02.0.0"), None)]);
    assert_eq!(
        h.session.review().map(|r| r.mode()),
        Some(ReviewMode::SingleCandidate)
    );
    assert_eq!(press(&mut h.session, 'm'), None);
    press(&mut h.session, 'a');
    h.session.poll();
    assert_eq!(h.backend.decisions()[0].final_code, "02.0.0");
}

#[test]
fn escalate_submits_empty_code_and_reason() {
    let mut h = started(vec![item("i1", Some("01.1.1"), Some("01.1.2"))]);
    h.session.dispatch(Action::Escalate {
        reason: Some("ambiguous receipt".to_string()),
    });
    h.session.poll();

    let decision = &h.backend.decisions()[0];
    assert_eq!(decision.action, DecisionAction::Escalate);
    assert_eq!(decision.final_code, "");
    assert_eq!(decision.escalation_reason.as_deref(), Some("ambiguous receipt"));
    assert_eq!(h.backend.status_of("i1").as_deref(), Some("escalated"));
}

// ---------------------------------------------------------------------------
// Submission guard and failure
// ---------------------------------------------------------------------------

#[test]
fn actions_while_submitting_are_ignored() {
    let mut h = started(vec![
        item("i1", Some("01.1.1"), Some("01.1.1")),
        item("i2", Some("01.1.1"), Some("01.1.1")),
    ]);
    assert_eq!(h.session.dispatch(Action::Accept { code: None }), Outcome::Submitting);
    assert!(h.session.is_processing());
    assert_eq!(
        h.session.dispatch(Action::Accept { code: None }),
        Outcome::Ignored(Ignored::Busy)
    );
    assert_eq!(
        h.session.dispatch(Action::Escalate { reason: None }),
        Outcome::Ignored(Ignored::Busy)
    );
    h.session.poll();

    assert_eq!(h.backend.decisions().len(), 1);
    assert_eq!(current_id(&h.session).as_deref(), Some("i2"));
    assert_eq!(h.session.completed(), 1);
}

#[test]
fn failed_submission_keeps_item_and_allows_immediate_retry() {
    let mut h = started(vec![
        item("i1", Some("01.1.1"), Some("01.1.2")),
        item("i2", Some("02.0.0"), None),
    ]);
    h.backend.fail_next_submissions(1);
    h.clock.advance_secs(3);

    assert_eq!(h.session.dispatch(Action::AcceptModel), Outcome::Submitting);
    h.session.poll();

    assert_eq!(current_id(&h.session).as_deref(), Some("i1"));
    assert!(!h.session.is_processing());
    assert_eq!(h.session.elapsed(), Some(Duration::from_secs(3)));
    let notice = h.session.latest_notice().expect("failure notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(h.backend.decisions().is_empty());
    assert_eq!(h.session.completed(), 0);

    assert_eq!(h.session.dispatch(Action::AcceptModel), Outcome::Submitting);
    h.session.poll();
    let decisions = h.backend.decisions();
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].item_id, "i1");
    assert_eq!(decisions[0].final_code, "01.1.2");
    assert_eq!(current_id(&h.session).as_deref(), Some("i2"));
}

/// Runs jobs inline until told to refuse them, like a worker thread that
/// cannot be spawned.
#[derive(Default)]
struct FlakyExecutor {
    refuse: AtomicBool,
}

impl Executor for FlakyExecutor {
    fn execute(&self, job: Job) -> std::io::Result<()> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("no threads left"));
        }
        job();
        Ok(())
    }
}

#[test]
fn refused_submission_returns_to_item_with_a_notice() {
    let executor = Arc::new(FlakyExecutor::default());
    let mut h = harness_on(
        vec![item("i1", Some("01.1.1"), Some("01.1.1"))],
        executor.clone(),
    );
    assert!(h.session.start());
    h.session.poll();

    executor.refuse.store(true, Ordering::SeqCst);
    assert_eq!(h.session.dispatch(Action::Accept { code: None }), Outcome::Submitting);
    assert!(h.session.settle(Duration::from_millis(200)));

    assert!(!h.session.is_processing());
    assert_eq!(current_id(&h.session).as_deref(), Some("i1"));
    let notice = h.session.latest_notice().expect("failure notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(h.backend.decisions().is_empty());

    executor.refuse.store(false, Ordering::SeqCst);
    assert_eq!(h.session.dispatch(Action::Accept { code: None }), Outcome::Submitting);
    h.session.poll();
    assert_eq!(h.backend.decisions().len(), 1);
    assert_eq!(h.session.completed(), 1);
}

#[test]
fn refused_fetch_returns_to_idle() {
    let executor = Arc::new(FlakyExecutor::default());
    executor.refuse.store(true, Ordering::SeqCst);
    let mut h = harness_on(vec![item("i1", Some("01.1.1"), None)], executor.clone());

    assert!(h.session.start());
    assert!(h.session.settle(Duration::from_millis(200)));
    assert!(matches!(h.session.phase(), Phase::Idle));
    assert!(h.session.latest_notice().is_some());

    executor.refuse.store(false, Ordering::SeqCst);
    assert!(h.session.start());
    h.session.poll();
    assert_eq!(current_id(&h.session).as_deref(), Some("i1"));
}

#[test]
fn actions_without_an_item_are_ignored() {
    let mut h = harness(Vec::new());
    assert_eq!(
        h.session.dispatch(Action::Escalate { reason: None }),
        Outcome::Ignored(Ignored::NoItem)
    );
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

#[test]
fn decision_time_excludes_paused_interval() {
    let mut h = started(vec![item("i1", Some("01.1.1"), None)]);
    h.clock.advance_secs(4);
    assert_eq!(h.session.toggle_pause(), Some(true));

    h.clock.advance_secs(5);
    assert_eq!(h.session.elapsed(), Some(Duration::from_secs(4)));

    assert_eq!(h.session.toggle_pause(), Some(false));
    h.clock.advance_secs(2);
    assert_eq!(h.session.elapsed(), Some(Duration::from_secs(6)));

    h.session.dispatch(Action::Accept { code: None });
    h.session.poll();
    assert_eq!(h.backend.decisions()[0].time_spent_ms, 6_000);
}

#[test]
fn reset_timer_reads_zero_and_keeps_phase() {
    let mut h = started(vec![item("i1", Some("01.1.1"), None)]);
    h.clock.advance_secs(30);
    assert!(h.session.reset_timer());
    assert_eq!(h.session.elapsed(), Some(Duration::ZERO));
    assert!(matches!(h.session.phase(), Phase::Presenting(_)));

    h.clock.advance_secs(1);
    assert_eq!(h.session.elapsed(), Some(Duration::from_secs(1)));
}

#[test]
fn next_item_starts_a_fresh_timer() {
    let mut h = started(vec![
        item("i1", Some("01.1.1"), None),
        item("i2", Some("01.1.1"), None),
    ]);
    h.clock.advance_secs(10);
    h.session.toggle_pause();
    h.session.dispatch(Action::Accept { code: None });
    h.session.poll();

    let review = h.session.review().expect("second item");
    assert!(!review.timer().is_paused());
    assert_eq!(h.session.elapsed(), Some(Duration::ZERO));
}

// ---------------------------------------------------------------------------
// Fix search
// ---------------------------------------------------------------------------

#[test]
fn fix_search_is_debounced_ranked_and_selectable() {
    let mut h = started(vec![item("i1", Some("01.1.1"), Some("01.1.2"))]);
    assert_eq!(press(&mut h.session, 'f'), Some(Outcome::FixOpened));
    h.session.poll();
    let opening_searches = h.backend.search_calls();
    assert_eq!(opening_searches, 1);

    // While the panel is open the router is disabled.
    assert_eq!(press(&mut h.session, 'e'), None);

    h.session.set_fix_query("c");
    h.session.poll();
    assert_eq!(h.backend.search_calls(), opening_searches);

    h.session.set_fix_query("co");
    h.clock.advance(Duration::from_millis(199));
    h.session.poll();
    assert_eq!(h.backend.search_calls(), opening_searches);

    h.clock.advance(Duration::from_millis(1));
    h.session.poll();
    assert_eq!(h.backend.search_calls(), opening_searches + 1);

    let fix = h.session.review().and_then(|r| r.fix()).expect("fix open");
    let visible: Vec<_> = fix.results().visible().iter().map(|e| e.code()).collect();
    assert_eq!(visible, vec!["01.2.1", "02.0.0"]);
    assert_eq!(fix.results().hidden(), 3);

    h.session.fix_next();
    assert_eq!(h.session.select_fix(), Outcome::Submitting);
    h.session.poll();

    let decision = &h.backend.decisions()[0];
    assert_eq!(decision.action, DecisionAction::Fix);
    assert_eq!(decision.final_code, "02.0.0");
}

#[test]
fn informational_rows_cannot_be_selected() {
    let mut h = started(vec![item("i1", Some("01.1.1"), None)]);
    h.session.dispatch(Action::Fix { code: None });
    h.session.set_fix_query("food");
    h.clock.advance_secs(1);
    h.session.poll();

    assert_eq!(h.session.toggle_fix_context(), Some(true));
    let fix = h.session.review().and_then(|r| r.fix()).expect("fix open");
    let visible: Vec<_> = fix.results().visible().iter().map(|e| e.code()).collect();
    assert_eq!(visible, vec!["01.1", "01"]);

    assert_eq!(h.session.select_fix_at(0), Outcome::Ignored(Ignored::NoSelection));
    assert_eq!(h.session.select_fix(), Outcome::Ignored(Ignored::NoSelection));
    assert!(h.backend.decisions().is_empty());
}

#[test]
fn search_results_extend_required_codes() {
    let mut h = started(vec![item("i1", Some("01.1.1"), None)]);
    h.session.dispatch(Action::Fix { code: None });
    h.session.set_fix_query("coffee");
    h.clock.advance_secs(1);
    h.session.poll();

    assert!(h.session.required_codes().contains(&"01.2.1".to_string()));
    assert!(matches!(
        h.session.cache().get("01.2"),
        Some(CacheEntry::Hit(_))
    ));
}

#[test]
fn cancel_fix_discards_search_state() {
    let mut h = started(vec![item("i1", Some("01.1.1"), None)]);
    h.session.dispatch(Action::Fix { code: None });
    h.session.set_fix_query("meat");
    assert!(h.session.cancel_fix());
    assert!(h.session.review().and_then(|r| r.fix()).is_none());

    h.clock.advance_secs(1);
    h.session.poll();
    assert_eq!(h.backend.search_calls(), 1);

    h.session.dispatch(Action::Fix { code: None });
    h.session.poll();
    let fix = h.session.review().and_then(|r| r.fix()).expect("fix open");
    assert_eq!(fix.query(), "");
}

#[test]
fn fix_with_explicit_code_skips_search() {
    let mut h = started(vec![item("i1", Some("01.1.1"), None)]);
    assert_eq!(
        h.session.dispatch(Action::Fix {
            code: Some("01.1.2".to_string())
        }),
        Outcome::Submitting
    );
    h.session.poll();
    assert_eq!(h.backend.search_calls(), 0);
    assert_eq!(h.backend.decisions()[0].final_code, "01.1.2");
}

// ---------------------------------------------------------------------------
// Reviewer profile
// ---------------------------------------------------------------------------

#[test]
fn reviewer_and_target_changes_are_persisted() {
    let mut h = harness(Vec::new());
    h.session.set_daily_target(120).expect("target");
    h.session.set_reviewer("omar").expect("reviewer");

    let prefs: Prefs = h.store.load().expect("load");
    assert_eq!(prefs.last_reviewer.as_deref(), Some("omar"));
    assert_eq!(prefs.targets.get("sara"), Some(&120));
    assert_eq!(h.session.profile().reviewer_id, "omar");
}

#[test]
fn reviewer_cannot_change_mid_item() {
    let mut h = started(vec![item("i1", Some("01.1.1"), None)]);
    let err = h.session.set_reviewer("omar").expect_err("item is presenting");
    assert_eq!(err.code(), ErrorCode::ItemInProgress);
    assert_eq!(err.code().code(), "E3002");
    assert_eq!(h.session.profile().reviewer_id, "sara");
}

// ---------------------------------------------------------------------------
// Threaded executor
// ---------------------------------------------------------------------------

#[test]
fn threaded_session_settles_and_submits() {
    let backend = Arc::new(MemoryBackend::new(Fixture {
        items: vec![item("i1", Some("01.1.1"), Some("01.1.2"))],
        classifications: taxonomy(),
        users: Vec::new(),
    }));
    let mut session = ReviewSession::new(
        SessionDeps {
            backend: backend.clone(),
            executor: Arc::new(ThreadExecutor),
            clock: Arc::new(ManualClock::new()),
            store: Arc::new(MemoryStore::default()),
        },
        ReviewerProfile {
            reviewer_id: "sara".to_string(),
            daily_target: 5,
            queue: None,
        },
        SessionSettings::default(),
    );

    session.start();
    assert!(session.settle(Duration::from_secs(5)));
    assert!(session.cache().classification("01.1.2").is_some());

    assert_eq!(session.dispatch(Action::AcceptExisting), Outcome::Submitting);
    assert!(session.settle(Duration::from_secs(5)));
    assert!(matches!(session.phase(), Phase::Exhausted));
    assert_eq!(backend.decisions()[0].final_code, "01.1.1");
}
