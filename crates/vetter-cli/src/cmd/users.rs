//! `vt users`: list and create reviewer accounts.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::Write;
use vetter_core::backend::User;

use super::Context;
use crate::output::{pretty_section, render};

#[derive(Args, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: Option<UsersCommand>,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List reviewer accounts (default).
    List,

    /// Create a reviewer account. An existing name is not an error.
    Create {
        /// Username.
        name: String,

        #[arg(long, default_value = "reviewer")]
        role: String,
    },
}

#[derive(Debug, Serialize)]
struct Created {
    user: User,
    created: bool,
}

pub fn run_users(args: &UsersArgs, ctx: &Context) -> Result<()> {
    let remote = ctx.remote()?;
    match args.command.as_ref().unwrap_or(&UsersCommand::List) {
        UsersCommand::List => {
            let users = remote.admin.list_users().context("failed to list users")?;
            render(ctx.output, &users, |users, w| {
                pretty_section(w, &format!("Users ({})", users.len()))?;
                for user in users {
                    writeln!(w, "{:<24} {}", user.username, user.role)?;
                }
                Ok(())
            })
        }
        UsersCommand::Create { name, role } => {
            let name = name.trim();
            if name.is_empty() {
                anyhow::bail!("username must not be blank");
            }
            let (user, created) = remote
                .admin
                .create_user(name, role)
                .with_context(|| format!("failed to create user '{name}'"))?;
            if !created {
                tracing::warn!(username = %user.username, "user already exists");
            }
            render(ctx.output, &Created { user, created }, |c, w| {
                if c.created {
                    writeln!(w, "✓ created {} ({})", c.user.username, c.user.role)
                } else {
                    writeln!(w, "! {} already exists; nothing to do", c.user.username)
                }
            })
        }
    }
}
