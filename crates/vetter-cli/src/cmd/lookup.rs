//! `vt lookup`: print a code's hierarchy chain with titles.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use vetter_core::cache::ClassificationCache;
use vetter_core::executor::ThreadExecutor;

use super::Context;
use crate::output::{OutputMode, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Dotted classification code, e.g. `01.1.1`.
    pub code: String,

    /// Bullet lines of includes/excludes to show per level.
    #[arg(long, default_value_t = 2)]
    pub lines: usize,
}

#[derive(Debug, Serialize)]
struct LevelRow {
    level: &'static str,
    code: String,
    title: Option<String>,
    includes: Vec<String>,
    excludes: Vec<String>,
}

pub fn run_lookup(args: &LookupArgs, ctx: &Context) -> Result<()> {
    let remote = ctx.remote()?;
    let mut cache = ClassificationCache::new(remote.review, Arc::new(ThreadExecutor));
    cache.request_chain(&args.code);
    if !cache.settle(ctx.settle_timeout()) {
        tracing::warn!(pending = cache.pending(), "lookup timed out; showing partial chain");
    }

    let rows: Vec<LevelRow> = cache
        .hierarchy(&args.code)
        .into_iter()
        .map(|entry| LevelRow {
            level: entry.level.label(),
            includes: entry
                .classification
                .as_ref()
                .map(|c| c.include_lines(args.lines))
                .unwrap_or_default(),
            excludes: entry
                .classification
                .as_ref()
                .map(|c| c.exclude_lines(args.lines))
                .unwrap_or_default(),
            title: entry.classification.map(|c| c.title),
            code: entry.code,
        })
        .collect();

    if rows.is_empty() && ctx.output != OutputMode::Json {
        anyhow::bail!("'{}' is not a classification code", args.code);
    }

    render_mode(
        ctx.output,
        &rows,
        |rows, w| {
            for row in rows {
                writeln!(
                    w,
                    "{}\t{}\t{}",
                    row.level,
                    row.code,
                    row.title.as_deref().unwrap_or("-")
                )?;
            }
            Ok(())
        },
        |rows, w| render_pretty(&args.code, rows, w),
    )
}

fn render_pretty(code: &str, rows: &[LevelRow], w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Hierarchy of {code}"))?;
    for row in rows {
        writeln!(
            w,
            "{:<9} {:<10} {}",
            row.level,
            row.code,
            row.title.as_deref().unwrap_or("(unknown)")
        )?;
        for line in &row.includes {
            writeln!(w, "{:<20} + {line}", "")?;
        }
        for line in &row.excludes {
            writeln!(w, "{:<20} - {line}", "")?;
        }
    }
    Ok(())
}
