//! `vt review`: the interactive review screen.

use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;
use std::io::IsTerminal;
use std::sync::Arc;
use vetter_core::clock::SystemClock;
use vetter_core::executor::ThreadExecutor;
use vetter_core::prefs::{PreferenceStore, ReviewerProfile};
use vetter_core::session::{ReviewSession, SessionDeps, SessionSettings};

use super::Context;
use crate::output::{pretty_kv, pretty_section, render};
use crate::tui::{self, review::ReviewView};

#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Review as this reviewer (remembered for next time).
    #[arg(long, short = 'r')]
    pub reviewer: Option<String>,

    /// Only take items from this queue.
    #[arg(long)]
    pub queue: Option<String>,

    /// Open the screen without fetching the first item.
    #[arg(long)]
    pub no_start: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    reviewer: String,
    completed: u32,
    daily_target: u32,
    last_item: Option<String>,
}

pub fn run_review(args: &ReviewArgs, ctx: &Context) -> Result<()> {
    if !std::io::stdout().is_terminal() {
        bail!("vt review needs an interactive terminal");
    }

    let store = Arc::new(ctx.prefs_store()?);
    let prefs = store.load()?;
    let queue = args
        .queue
        .as_deref()
        .or(ctx.config.config.review.queue.as_deref());
    let profile = ReviewerProfile::resolve(args.reviewer.as_deref(), queue, &prefs)?;
    let remote = ctx.remote()?;
    tracing::info!(
        reviewer = %profile.reviewer_id,
        queue = ?profile.queue,
        server = %remote.label,
        "review session opened"
    );

    let reviewer = profile.reviewer_id.clone();
    let mut session = ReviewSession::new(
        SessionDeps {
            backend: remote.review,
            executor: Arc::new(ThreadExecutor),
            clock: Arc::new(SystemClock),
            store,
        },
        profile,
        SessionSettings::from(&ctx.config.config.search),
    );
    if args.reviewer.is_some() {
        session.set_reviewer(&reviewer)?;
    }
    if !args.no_start {
        session.start();
    }

    let mut view = ReviewView::new(session);
    tui::run(&mut view)?;
    let session = view.into_session();

    let summary = Summary {
        reviewer: session.profile().reviewer_id.clone(),
        completed: session.completed(),
        daily_target: session.profile().daily_target,
        last_item: session.last_decision().map(|d| d.item_id.clone()),
    };
    tracing::info!(
        reviewer = %summary.reviewer,
        completed = summary.completed,
        "review session closed"
    );
    render(ctx.output, &summary, |s, w| {
        pretty_section(w, "Session summary")?;
        pretty_kv(w, "reviewer", &s.reviewer)?;
        pretty_kv(w, "completed", format!("{}/{}", s.completed, s.daily_target))?;
        if let Some(item) = &s.last_item {
            pretty_kv(w, "last item", item)?;
        }
        Ok(())
    })
}
