//! `vt search`: ranked taxonomy search, as the fix panel shows it.

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use vetter_core::search::SearchResults;

use super::Context;
use crate::output::{pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to search for. Empty lists the start of the taxonomy.
    #[arg(default_value = "")]
    pub query: String,

    /// Also show Division and Group rows as context.
    #[arg(long)]
    pub context: bool,

    /// Maximum results to request (defaults to `search.limit` in config).
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct SearchRow {
    code: String,
    title: String,
    level: &'static str,
    selectable: bool,
}

pub fn run_search(args: &SearchArgs, ctx: &Context) -> Result<()> {
    let limit = args.limit.unwrap_or(ctx.config.config.search.limit);
    let remote = ctx.remote()?;
    let raw = remote
        .review
        .search_classifications(&args.query, limit)
        .with_context(|| format!("search for '{}' failed", args.query))?;
    tracing::debug!(query = %args.query, limit, results = raw.len(), "search complete");

    let results = SearchResults::new(raw, args.context);
    let hidden = results.hidden();
    let rows: Vec<SearchRow> = results
        .visible()
        .into_iter()
        .map(|entry| SearchRow {
            code: entry.code().to_string(),
            title: entry.classification.title.clone(),
            level: entry.level.map_or("Unknown", |l| l.label()),
            selectable: entry.is_selectable(),
        })
        .collect();

    render_mode(
        ctx.output,
        &rows,
        |rows, w| {
            for row in rows {
                writeln!(w, "{}\t{}\t{}", row.code, row.level, row.title)?;
            }
            Ok(())
        },
        |rows, w| render_pretty(&args.query, rows, hidden, w),
    )
}

fn render_pretty(
    query: &str,
    rows: &[SearchRow],
    hidden: usize,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    pretty_section(w, &format!("Search: \"{query}\" ({} results)", rows.len()))?;
    if rows.is_empty() {
        writeln!(w, "No matches")?;
    }
    for row in rows {
        let marker = if row.selectable { "" } else { "  [info]" };
        writeln!(w, "{:<10} {:<9} {}{marker}", row.code, row.level, row.title)?;
    }
    if hidden > 0 {
        writeln!(w, "\n{hidden} broader entries hidden; use --context to show them")?;
    }
    Ok(())
}
