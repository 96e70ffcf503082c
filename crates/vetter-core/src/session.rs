//! The review session state machine.
//!
//! ```text
//!            start()                 item                 accept/fix/escalate
//!   Idle ─────────────▶ Loading ─────────────▶ Presenting ─────────────────▶ Submitting
//!    ▲  ▲                 │  │                   │    ▲                        │    │
//!    │  └── fetch failed ─┘  └─ none ─▶ Exhausted│    └──── submit failed ─────┘    │
//!    │                                   │       └─ fix ─▶ (fix search) ─ select ──▶│
//!    └──────────── start() ──────────────┘                                          │
//!                            Loading ◀──────────────── submitted ───────────────────┘
//! ```
//!
//! All remote calls run on the injected [`Executor`]; their completions are
//! applied by [`ReviewSession::poll`] on the owning thread. `Submitting` is the
//! only guard against double submission: any action dispatched while it is
//! active is ignored.

use crate::backend::{BackendError, ReviewBackend};
use crate::cache::ClassificationCache;
use crate::clock::Clock;
use crate::config::SearchConfig;
use crate::conflict::{Candidates, ReviewMode};
use crate::error::ErrorCode;
use crate::executor::{Executor, Inbox};
use crate::hierarchy::{self, HierarchyEntry};
use crate::model::{Classification, Decision, DecisionAction, Item};
use crate::prefs::{PreferenceStore, PrefsError, ReviewerProfile};
use crate::search::SearchResults;
use crate::timer::DecisionTimer;
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

const MAX_POLL_ROUNDS: usize = 16;
const SETTLE_STEP: Duration = Duration::from_millis(5);
const MAX_NOTICES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Prefs(#[from] PrefsError),

    #[error("cannot change reviewer while an item is {0}")]
    ItemInProgress(&'static str),
}

impl SessionError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Prefs(err) => err.code(),
            Self::ItemInProgress(_) => ErrorCode::ItemInProgress,
        }
    }
}

/// Something the operator asked the session to do with the current item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Accept `code`, or the conflict model's default when `None`.
    Accept { code: Option<String> },
    /// Accept the model's prediction (conflict mode only).
    AcceptModel,
    /// Keep the existing label (conflict mode only).
    AcceptExisting,
    /// Submit `code` as a correction, or open the fix search when `None`.
    Fix { code: Option<String> },
    Escalate { reason: Option<String> },
}

impl Action {
    /// Whether this action may be taken for an item with `candidates`.
    #[must_use]
    pub fn is_enabled(&self, candidates: &Candidates<'_>) -> bool {
        match self {
            Self::Accept { code: None } => !candidates.has_conflict(),
            Self::AcceptModel | Self::AcceptExisting => candidates.has_conflict(),
            Self::Accept { code: Some(_) } | Self::Fix { .. } | Self::Escalate { .. } => true,
        }
    }
}

/// Result of [`ReviewSession::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Submitting,
    FixOpened,
    Ignored(Ignored),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    /// A submission is already outstanding.
    Busy,
    /// No item is being presented.
    NoItem,
    /// The action is not legal for the item's review mode.
    Disabled,
    /// Nothing selectable under the fix-search cursor.
    NoSelection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Transient operator-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub code: Option<ErrorCode>,
}

/// Live taxonomy search shown while fixing a code.
#[derive(Debug, Clone)]
pub struct FixSearch {
    query: String,
    results: SearchResults,
    edited_at: Option<Instant>,
    generation: u64,
    loading: bool,
    error: Option<String>,
}

impl FixSearch {
    fn new() -> Self {
        Self {
            query: String::new(),
            results: SearchResults::default(),
            edited_at: None,
            generation: 0,
            loading: false,
            error: None,
        }
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn results(&self) -> &SearchResults {
        &self.results
    }

    /// A search is in flight or waiting out the debounce.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading || self.edited_at.is_some()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// The item in front of the reviewer.
#[derive(Debug, Clone)]
pub struct Review {
    item: Item,
    timer: DecisionTimer,
    fix: Option<FixSearch>,
}

impl Review {
    #[must_use]
    pub const fn item(&self) -> &Item {
        &self.item
    }

    #[must_use]
    pub const fn timer(&self) -> &DecisionTimer {
        &self.timer
    }

    #[must_use]
    pub const fn fix(&self) -> Option<&FixSearch> {
        self.fix.as_ref()
    }

    #[must_use]
    pub fn candidates(&self) -> Candidates<'_> {
        Candidates::of(&self.item)
    }

    #[must_use]
    pub fn mode(&self) -> ReviewMode {
        self.candidates().mode()
    }
}

#[derive(Debug, Clone)]
pub enum Phase {
    Idle,
    Loading,
    Presenting(Review),
    Submitting { review: Review, decision: Decision },
    /// The queue has nothing left for this reviewer.
    Exhausted,
}

impl Phase {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Presenting(_) => "presenting",
            Self::Submitting { .. } => "submitting",
            Self::Exhausted => "exhausted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub search_limit: usize,
    pub debounce: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SessionSettings {
    fn from(search: &SearchConfig) -> Self {
        Self {
            search_limit: search.limit,
            debounce: search.debounce(),
        }
    }
}

/// Collaborators injected into a session.
pub struct SessionDeps {
    pub backend: Arc<dyn ReviewBackend>,
    pub executor: Arc<dyn Executor>,
    pub clock: Arc<dyn Clock>,
    pub store: Arc<dyn PreferenceStore>,
}

type SearchCompletion = (u64, Result<Vec<Classification>, BackendError>);

pub struct ReviewSession {
    backend: Arc<dyn ReviewBackend>,
    executor: Arc<dyn Executor>,
    clock: Arc<dyn Clock>,
    store: Arc<dyn PreferenceStore>,
    profile: ReviewerProfile,
    settings: SessionSettings,
    cache: ClassificationCache,
    phase: Phase,
    next_inbox: Inbox<Result<Option<Item>, BackendError>>,
    submit_inbox: Inbox<Result<Item, BackendError>>,
    search_inbox: Inbox<SearchCompletion>,
    search_seq: u64,
    notices: VecDeque<Notice>,
    completed: u32,
    last_decision: Option<Decision>,
}

impl ReviewSession {
    pub fn new(deps: SessionDeps, profile: ReviewerProfile, settings: SessionSettings) -> Self {
        let cache = ClassificationCache::new(Arc::clone(&deps.backend), Arc::clone(&deps.executor));
        Self {
            backend: deps.backend,
            executor: deps.executor,
            clock: deps.clock,
            store: deps.store,
            profile,
            settings,
            cache,
            phase: Phase::Idle,
            next_inbox: Inbox::new(),
            submit_inbox: Inbox::new(),
            search_inbox: Inbox::new(),
            search_seq: 0,
            notices: VecDeque::new(),
            completed: 0,
            last_decision: None,
        }
    }

    // ----- queries --------------------------------------------------------

    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub const fn profile(&self) -> &ReviewerProfile {
        &self.profile
    }

    /// The item being presented or submitted.
    #[must_use]
    pub const fn review(&self) -> Option<&Review> {
        match &self.phase {
            Phase::Presenting(review) | Phase::Submitting { review, .. } => Some(review),
            Phase::Idle | Phase::Loading | Phase::Exhausted => None,
        }
    }

    #[must_use]
    pub const fn is_processing(&self) -> bool {
        matches!(self.phase, Phase::Submitting { .. })
    }

    /// Decisions submitted since the session (or the current reviewer) began.
    #[must_use]
    pub const fn completed(&self) -> u32 {
        self.completed
    }

    #[must_use]
    pub const fn last_decision(&self) -> Option<&Decision> {
        self.last_decision.as_ref()
    }

    /// Decision time of the current item as of now.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.review()
            .map(|review| review.timer.elapsed(self.clock.now()))
    }

    #[must_use]
    pub const fn cache(&self) -> &ClassificationCache {
        &self.cache
    }

    #[must_use]
    pub fn hierarchy(&self, code: &str) -> Vec<HierarchyEntry> {
        self.cache.hierarchy(code)
    }

    /// Every code whose classification the current view depends on: the
    /// ancestor prefixes of the item's candidate codes and of the visible
    /// fix-search results.
    #[must_use]
    pub fn required_codes(&self) -> Vec<String> {
        let mut codes = BTreeSet::new();
        if let Some(review) = self.review() {
            for code in [review.item.existing(), review.item.model()]
                .into_iter()
                .flatten()
            {
                codes.extend(hierarchy::resolve(code));
            }
            if let Some(fix) = &review.fix {
                for entry in fix.results.visible() {
                    codes.extend(hierarchy::resolve(entry.code()));
                }
            }
        }
        codes.into_iter().collect()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    #[must_use]
    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notices.back()
    }

    // ----- lifecycle ------------------------------------------------------

    /// Begin fetching an item. Only legal from `Idle` or `Exhausted`.
    pub fn start(&mut self) -> bool {
        match self.phase {
            Phase::Idle | Phase::Exhausted => {
                self.begin_loading();
                true
            }
            Phase::Loading | Phase::Presenting(_) | Phase::Submitting { .. } => false,
        }
    }

    /// Apply every completed remote call and fire a due debounced search.
    /// Returns `true` if anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        for _ in 0..MAX_POLL_ROUNDS {
            let mut progressed = self.cache.poll() > 0;
            for result in self.next_inbox.drain() {
                self.on_next_item(result);
                progressed = true;
            }
            for result in self.submit_inbox.drain() {
                self.on_submitted(result);
                progressed = true;
            }
            for (seq, result) in self.search_inbox.drain() {
                self.on_search(seq, result);
                progressed = true;
            }
            progressed |= self.tick_search();
            if !progressed {
                break;
            }
            self.cache.request_all(self.required_codes());
            changed = true;
        }
        changed
    }

    /// Poll until no remote call is outstanding or `timeout` passes.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll();
            if self.outstanding() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(SETTLE_STEP);
        }
    }

    fn outstanding(&self) -> usize {
        self.next_inbox.outstanding()
            + self.submit_inbox.outstanding()
            + self.search_inbox.outstanding()
            + self.cache.pending()
    }

    // ----- actions --------------------------------------------------------

    /// Single entry point for every decision action.
    pub fn dispatch(&mut self, action: Action) -> Outcome {
        let review = match &mut self.phase {
            Phase::Presenting(review) => review,
            Phase::Submitting { .. } => {
                tracing::debug!("action ignored while submitting");
                return Outcome::Ignored(Ignored::Busy);
            }
            Phase::Idle | Phase::Loading | Phase::Exhausted => {
                return Outcome::Ignored(Ignored::NoItem);
            }
        };

        let candidates = review.candidates();
        if !action.is_enabled(&candidates) {
            tracing::debug!(?action, mode = %candidates.mode(), "action disabled");
            return Outcome::Ignored(Ignored::Disabled);
        }

        let (kind, code, reason) = match action {
            Action::Accept { code: None } => {
                (DecisionAction::Accept, candidates.default_code().to_string(), None)
            }
            Action::Accept { code: Some(code) } => (DecisionAction::Accept, code, None),
            Action::AcceptModel => (
                DecisionAction::Accept,
                candidates.model.unwrap_or_default().to_string(),
                None,
            ),
            Action::AcceptExisting => (
                DecisionAction::Accept,
                candidates.existing.unwrap_or_default().to_string(),
                None,
            ),
            Action::Fix { code: Some(code) } => (DecisionAction::Fix, code, None),
            Action::Fix { code: None } => {
                if review.fix.is_none() {
                    review.fix = Some(FixSearch::new());
                    self.issue_search();
                }
                return Outcome::FixOpened;
            }
            Action::Escalate { reason } => (
                DecisionAction::Escalate,
                String::new(),
                reason.filter(|r| !r.trim().is_empty()),
            ),
        };

        self.submit(kind, code.trim().to_string(), reason)
    }

    fn submit(
        &mut self,
        action: DecisionAction,
        final_code: String,
        escalation_reason: Option<String>,
    ) -> Outcome {
        let mut review = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Presenting(review) => review,
            other => {
                self.phase = other;
                return Outcome::Ignored(Ignored::NoItem);
            }
        };
        review.fix = None;

        let decision = Decision {
            item_id: review.item.id.clone(),
            reviewer_id: self.profile.reviewer_id.clone(),
            action,
            final_code,
            escalation_reason,
            time_spent_ms: review.timer.elapsed_ms(self.clock.now()),
        };
        tracing::debug!(
            item = %decision.item_id,
            action = %decision.action,
            code = %decision.final_code,
            "submitting decision"
        );

        let backend = Arc::clone(&self.backend);
        let outgoing = decision.clone();
        self.submit_inbox.dispatch(
            self.executor.as_ref(),
            move || backend.submit_decision(&outgoing),
            |err| Err(BackendError::unscheduled(&err)),
        );
        self.phase = Phase::Submitting { review, decision };
        Outcome::Submitting
    }

    // ----- fix search -----------------------------------------------------

    /// Record a new query; the search fires once the debounce has elapsed.
    pub fn set_fix_query(&mut self, query: &str) -> bool {
        let now = self.clock.now();
        let Some(fix) = self.fix_mut() else {
            return false;
        };
        if fix.query != query {
            query.clone_into(&mut fix.query);
            fix.edited_at = Some(now);
        }
        true
    }

    pub fn fix_next(&mut self) {
        if let Some(fix) = self.fix_mut() {
            fix.results.select_next();
        }
    }

    pub fn fix_prev(&mut self) {
        if let Some(fix) = self.fix_mut() {
            fix.results.select_prev();
        }
    }

    /// Show or hide non-Class results. Returns the new state.
    pub fn toggle_fix_context(&mut self) -> Option<bool> {
        let toggled = self.fix_mut().map(|fix| fix.results.toggle_context());
        if toggled.is_some() {
            self.cache.request_all(self.required_codes());
        }
        toggled
    }

    /// Submit the result under the cursor as a fix.
    pub fn select_fix(&mut self) -> Outcome {
        let selected = self
            .fix_ref()
            .and_then(|fix| fix.results.selected())
            .map(|entry| entry.code().to_string());
        self.select_fix_code(selected)
    }

    /// Submit visible row `idx` as a fix. Informational rows are ignored.
    pub fn select_fix_at(&mut self, idx: usize) -> Outcome {
        let selected = self
            .fix_ref()
            .and_then(|fix| fix.results.choose(idx))
            .map(str::to_string);
        self.select_fix_code(selected)
    }

    fn select_fix_code(&mut self, code: Option<String>) -> Outcome {
        if self.is_processing() {
            return Outcome::Ignored(Ignored::Busy);
        }
        match code {
            Some(code) => self.dispatch(Action::Fix { code: Some(code) }),
            None => Outcome::Ignored(Ignored::NoSelection),
        }
    }

    /// Close the fix search, discarding its state.
    pub fn cancel_fix(&mut self) -> bool {
        match &mut self.phase {
            Phase::Presenting(review) => review.fix.take().is_some(),
            _ => false,
        }
    }

    fn fix_ref(&self) -> Option<&FixSearch> {
        match &self.phase {
            Phase::Presenting(review) => review.fix.as_ref(),
            _ => None,
        }
    }

    fn fix_mut(&mut self) -> Option<&mut FixSearch> {
        match &mut self.phase {
            Phase::Presenting(review) => review.fix.as_mut(),
            _ => None,
        }
    }

    fn tick_search(&mut self) -> bool {
        let now = self.clock.now();
        let debounce = self.settings.debounce;
        let due = self.fix_ref().and_then(|fix| fix.edited_at).is_some_and(|edited| {
            now.saturating_duration_since(edited) >= debounce
        });
        if due {
            self.issue_search();
        }
        due
    }

    fn issue_search(&mut self) {
        self.search_seq += 1;
        let seq = self.search_seq;
        let Some(fix) = self.fix_mut() else {
            return;
        };
        fix.edited_at = None;
        fix.generation = seq;
        fix.loading = true;
        let query = fix.query.clone();

        tracing::debug!(seq, query = %query, "searching classifications");
        let backend = Arc::clone(&self.backend);
        let limit = self.settings.search_limit;
        self.search_inbox.dispatch(
            self.executor.as_ref(),
            move || (seq, backend.search_classifications(&query, limit)),
            |err| (seq, Err(BackendError::unscheduled(&err))),
        );
    }

    fn on_search(&mut self, seq: u64, result: Result<Vec<Classification>, BackendError>) {
        let Some(fix) = self.fix_mut().filter(|fix| fix.generation == seq) else {
            tracing::debug!(seq, "discarding superseded search results");
            return;
        };
        fix.loading = false;
        match result {
            Ok(found) => {
                fix.results = SearchResults::new(found, fix.results.show_context());
                fix.error = None;
            }
            Err(err) => {
                tracing::warn!(error_code = %err.code(), "classification search failed: {err}");
                fix.results = SearchResults::new(Vec::new(), fix.results.show_context());
                fix.error = Some("Could not search classifications".to_string());
            }
        }
    }

    // ----- timer ----------------------------------------------------------

    /// Pause or resume the decision timer. Returns the new paused state.
    pub fn toggle_pause(&mut self) -> Option<bool> {
        let now = self.clock.now();
        match &mut self.phase {
            Phase::Presenting(review) => Some(review.timer.toggle_pause(now)),
            _ => None,
        }
    }

    /// Zero the decision timer of the current item.
    pub fn reset_timer(&mut self) -> bool {
        let now = self.clock.now();
        match &mut self.phase {
            Phase::Presenting(review) => {
                review.timer.reset(now);
                true
            }
            _ => false,
        }
    }

    // ----- reviewer profile -----------------------------------------------

    /// Switch reviewer and remember the choice. Only allowed between items.
    pub fn set_reviewer(&mut self, reviewer_id: &str) -> Result<(), SessionError> {
        if !matches!(self.phase, Phase::Idle | Phase::Exhausted) {
            return Err(SessionError::ItemInProgress(self.phase.name()));
        }
        let mut prefs = self.store.load()?;
        let profile =
            ReviewerProfile::resolve(Some(reviewer_id), self.profile.queue.as_deref(), &prefs)?;
        prefs.last_reviewer = Some(profile.reviewer_id.clone());
        self.store.save(&prefs)?;
        tracing::info!(reviewer = %profile.reviewer_id, "reviewer changed");
        self.profile = profile;
        self.completed = 0;
        Ok(())
    }

    pub fn set_daily_target(&mut self, target: u32) -> Result<(), SessionError> {
        let mut prefs = self.store.load()?;
        prefs
            .targets
            .insert(self.profile.reviewer_id.clone(), target);
        self.store.save(&prefs)?;
        self.profile.daily_target = target;
        Ok(())
    }

    // ----- completions ----------------------------------------------------

    fn begin_loading(&mut self) {
        self.phase = Phase::Loading;
        let backend = Arc::clone(&self.backend);
        let reviewer = self.profile.reviewer_id.clone();
        let queue = self.profile.queue.clone();
        tracing::debug!(reviewer = %reviewer, queue = ?queue, "fetching next item");
        self.next_inbox.dispatch(
            self.executor.as_ref(),
            move || backend.fetch_next_item(&reviewer, queue.as_deref()),
            |err| Err(BackendError::unscheduled(&err)),
        );
    }

    fn on_next_item(&mut self, result: Result<Option<Item>, BackendError>) {
        if !matches!(self.phase, Phase::Loading) {
            tracing::debug!(phase = self.phase.name(), "dropping unexpected item response");
            return;
        }
        match result {
            Ok(Some(item)) => {
                tracing::debug!(item = %item.id, "item loaded");
                let timer = DecisionTimer::start(self.clock.now());
                self.phase = Phase::Presenting(Review {
                    item,
                    timer,
                    fix: None,
                });
            }
            Ok(None) => {
                tracing::info!(reviewer = %self.profile.reviewer_id, "queue exhausted");
                self.phase = Phase::Exhausted;
                self.notify(NoticeLevel::Info, "All items validated".to_string(), None);
            }
            Err(err) => {
                tracing::warn!(error_code = %err.code(), "failed to fetch next item: {err}");
                self.phase = Phase::Idle;
                self.notify(
                    NoticeLevel::Error,
                    format!("Could not load the next item: {err}"),
                    Some(err.code()),
                );
            }
        }
    }

    fn on_submitted(&mut self, result: Result<Item, BackendError>) {
        let (review, decision) = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Submitting { review, decision } => (review, decision),
            other => {
                tracing::debug!(phase = other.name(), "dropping unexpected submit response");
                self.phase = other;
                return;
            }
        };
        match result {
            Ok(_) => {
                tracing::info!(
                    item = %decision.item_id,
                    action = %decision.action,
                    code = %decision.final_code,
                    time_spent_ms = decision.time_spent_ms,
                    "decision submitted"
                );
                self.completed += 1;
                self.last_decision = Some(decision);
                self.begin_loading();
            }
            Err(err) => {
                tracing::warn!(
                    item = %decision.item_id,
                    error_code = %err.code(),
                    "decision submission failed: {err}"
                );
                self.phase = Phase::Presenting(review);
                self.notify(
                    NoticeLevel::Error,
                    format!("{}: {err}", ErrorCode::SubmissionFailed.message()),
                    Some(ErrorCode::SubmissionFailed),
                );
            }
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: String, code: Option<ErrorCode>) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            level,
            message,
            code,
        });
    }
}

impl std::fmt::Debug for ReviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewSession")
            .field("phase", &self.phase.name())
            .field("profile", &self.profile)
            .field("completed", &self.completed)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates<'a>(existing: Option<&'a str>, model: Option<&'a str>) -> Candidates<'a> {
        Candidates::new(existing, model)
    }

    #[test]
    fn plain_accept_is_disabled_in_conflict() {
        let conflict = candidates(Some("01.1.1"), Some("01.1.2"));
        assert!(!Action::Accept { code: None }.is_enabled(&conflict));
        assert!(Action::AcceptModel.is_enabled(&conflict));
        assert!(Action::AcceptExisting.is_enabled(&conflict));
    }

    #[test]
    fn conflict_actions_are_disabled_without_conflict() {
        let single = candidates(Some("01.1.1"), Some("01.1.1"));
        assert!(Action::Accept { code: None }.is_enabled(&single));
        assert!(!Action::AcceptModel.is_enabled(&single));
        assert!(!Action::AcceptExisting.is_enabled(&single));
    }

    #[test]
    fn fix_escalate_and_explicit_accept_are_always_enabled() {
        for c in [
            candidates(None, None),
            candidates(Some("01.1.1"), Some("01.1.2")),
        ] {
            assert!(Action::Fix { code: None }.is_enabled(&c));
            assert!(Action::Escalate { reason: None }.is_enabled(&c));
            assert!(
                Action::Accept {
                    code: Some("02.1.1".into())
                }
                .is_enabled(&c)
            );
        }
    }

    #[test]
    fn settings_follow_search_config() {
        let settings = SessionSettings::from(&SearchConfig {
            limit: 25,
            debounce_ms: 50,
        });
        assert_eq!(settings.search_limit, 25);
        assert_eq!(settings.debounce, Duration::from_millis(50));
    }
}
