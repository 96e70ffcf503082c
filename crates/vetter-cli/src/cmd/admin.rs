//! `vt admin`: queue maintenance passthroughs.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::Write;

use super::Context;
use crate::output::{pretty_kv, pretty_section, render, render_success};

#[derive(Args, Debug)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Show queue statistics.
    Stats {
        /// Restrict per-reviewer figures to this reviewer.
        #[arg(long)]
        reviewer: Option<String>,
    },

    /// Release the lock on one item.
    Unlock {
        /// Item ID.
        item: String,
    },

    /// Release every lock.
    UnlockAll,

    /// Move all escalated items back to pending.
    RequeueEscalated,

    /// Release locks older than the given age.
    ResetStaleLocks {
        #[arg(long, default_value_t = 30)]
        max_age_minutes: u32,
    },
}

#[derive(Debug, Serialize)]
struct CountReply {
    message: String,
    count: u64,
}

pub fn run_admin(args: &AdminArgs, ctx: &Context) -> Result<()> {
    let remote = ctx.remote()?;
    let admin = remote.admin.as_ref();
    tracing::debug!(target_server = %remote.label, command = ?args.command, "admin request");

    let (message, count) = match &args.command {
        AdminCommand::Stats { reviewer } => {
            let stats = admin
                .stats(reviewer.as_deref())
                .context("failed to fetch stats")?;
            return render(ctx.output, &stats, |stats, w| render_stats(stats, w));
        }
        AdminCommand::Unlock { item } => {
            let message = admin
                .unlock_item(item)
                .with_context(|| format!("failed to unlock '{item}'"))?;
            return render_success(ctx.output, &message);
        }
        AdminCommand::UnlockAll => admin.unlock_all().context("failed to unlock items")?,
        AdminCommand::RequeueEscalated => admin
            .requeue_escalated()
            .context("failed to requeue escalated items")?,
        AdminCommand::ResetStaleLocks { max_age_minutes } => admin
            .reset_stale_locks(*max_age_minutes)
            .context("failed to reset stale locks")?,
    };
    tracing::info!(count, "{message}");

    let reply = CountReply { message, count };
    render(ctx.output, &reply, |reply, w| writeln!(w, "✓ {}", reply.message))
}

fn render_stats(stats: &serde_json::Value, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Queue statistics")?;
    match stats.as_object() {
        Some(map) => {
            for (key, value) in map {
                let shown = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                pretty_kv(w, key, shown)?;
            }
            Ok(())
        }
        None => writeln!(w, "{stats}"),
    }
}
