//! `vt reviewer`: show or change the locally remembered reviewer.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::Write;
use vetter_core::prefs::{PreferenceStore, Prefs, PrefsError, ReviewerProfile};

use super::Context;
use crate::output::{pretty_kv, pretty_section, render, render_success};

#[derive(Args, Debug)]
pub struct ReviewerArgs {
    #[command(subcommand)]
    pub command: Option<ReviewerCommand>,
}

#[derive(Subcommand, Debug)]
pub enum ReviewerCommand {
    /// Show the remembered reviewer and their daily target (default).
    Show,

    /// Remember NAME as the reviewer for future sessions.
    Set {
        /// Reviewer name as known to the server.
        name: String,
    },

    /// Set the daily target for the remembered reviewer.
    Target {
        /// Decisions per day.
        count: u32,

        /// Set the target for this reviewer instead.
        #[arg(long)]
        reviewer: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct ReviewerView {
    reviewer: Option<String>,
    daily_target: Option<u32>,
    prefs_path: String,
}

pub fn run_reviewer(args: &ReviewerArgs, ctx: &Context) -> Result<()> {
    let store = ctx.prefs_store()?;
    match args.command.as_ref().unwrap_or(&ReviewerCommand::Show) {
        ReviewerCommand::Show => {
            let prefs = store.load()?;
            let view = ReviewerView {
                daily_target: prefs.last_reviewer.as_deref().map(|r| prefs.target_for(r)),
                reviewer: prefs.last_reviewer,
                prefs_path: store.path().display().to_string(),
            };
            render(ctx.output, &view, render_view)
        }
        ReviewerCommand::Set { name } => {
            let mut prefs = store.load()?;
            let profile = ReviewerProfile::resolve(Some(name), None, &prefs)?;
            prefs.last_reviewer = Some(profile.reviewer_id.clone());
            store.save(&prefs)?;
            tracing::info!(reviewer = %profile.reviewer_id, "reviewer remembered");
            render_success(
                ctx.output,
                &format!(
                    "reviewer set to {} (daily target {})",
                    profile.reviewer_id, profile.daily_target
                ),
            )
        }
        ReviewerCommand::Target { count, reviewer } => {
            if *count == 0 {
                bail!("daily target must be at least 1");
            }
            let mut prefs = store.load()?;
            let name = target_owner(reviewer.as_deref(), &prefs)?;
            prefs.targets.insert(name.clone(), *count);
            store.save(&prefs)?;
            tracing::info!(reviewer = %name, target = count, "daily target changed");
            render_success(ctx.output, &format!("daily target for {name} set to {count}"))
        }
    }
}

fn target_owner(explicit: Option<&str>, prefs: &Prefs) -> Result<String, PrefsError> {
    ReviewerProfile::resolve(explicit, None, prefs).map(|p| p.reviewer_id)
}

fn render_view(view: &ReviewerView, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Reviewer")?;
    pretty_kv(w, "reviewer", view.reviewer.as_deref().unwrap_or("(not set)"))?;
    if let Some(target) = view.daily_target {
        pretty_kv(w, "target", target.to_string())?;
    }
    pretty_kv(w, "prefs", &view.prefs_path)
}
