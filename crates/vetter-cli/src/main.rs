#![forbid(unsafe_code)]

mod cmd;
mod output;
mod tui;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "vetter: review machine-assigned classification codes",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Review server base URL (overrides VETTER_SERVER and config).
    #[arg(long, global = true)]
    server: Option<String>,

    /// Serve everything from a JSON fixture instead of a server.
    #[arg(long, global = true, value_name = "FIXTURE")]
    offline: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Review",
        about = "Open the interactive review screen",
        long_about = "Fetch items one at a time and accept, fix or escalate each code.",
        after_help = "EXAMPLES:\n    # Review as the remembered reviewer\n    vt review\n\n    # Review a specific queue as sara\n    vt review --reviewer sara --queue low_confidence\n\n    # Practise against a local fixture\n    vt --offline fixture.json review"
    )]
    Review(cmd::review::ReviewArgs),

    #[command(
        next_help_heading = "Taxonomy",
        about = "Show a code's hierarchy",
        long_about = "Resolve a code into Division, Group and Class and show each title.",
        after_help = "EXAMPLES:\n    # Show the chain for a class\n    vt lookup 01.1.1\n\n    # Emit machine-readable output\n    vt lookup 01.1.1 --json"
    )]
    Lookup(cmd::lookup::LookupArgs),

    #[command(
        next_help_heading = "Taxonomy",
        about = "Search the taxonomy",
        long_about = "Search classifications, ranked most specific first.",
        after_help = "EXAMPLES:\n    # Search for a term\n    vt search coffee\n\n    # Include Division and Group rows\n    vt search coffee --context\n\n    # Emit machine-readable output\n    vt search coffee --json"
    )]
    Search(cmd::search::SearchArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Show or set the local reviewer",
        long_about = "Show or change the reviewer and daily target remembered on this machine.",
        after_help = "EXAMPLES:\n    # Show the remembered reviewer\n    vt reviewer\n\n    # Remember a reviewer\n    vt reviewer set sara\n\n    # Set a daily target\n    vt reviewer target 80"
    )]
    Reviewer(cmd::reviewer::ReviewerArgs),

    #[command(
        next_help_heading = "Admin",
        about = "Queue maintenance",
        long_about = "Inspect queue statistics and release or requeue items.",
        after_help = "EXAMPLES:\n    # Queue statistics\n    vt admin stats\n\n    # Release locks older than an hour\n    vt admin reset-stale-locks --max-age-minutes 60\n\n    # Move escalated items back to pending\n    vt admin requeue-escalated"
    )]
    Admin(cmd::admin::AdminArgs),

    #[command(
        next_help_heading = "Admin",
        about = "List or create reviewers",
        long_about = "List reviewer accounts or create a new one.",
        after_help = "EXAMPLES:\n    # List reviewers\n    vt users\n\n    # Create a reviewer\n    vt users create sara"
    )]
    Users(cmd::users::UsersArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    vt completions bash > ~/.local/share/bash-completion/completions/vt"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Pretty
        }
    }

    /// The TUI owns the terminal, so its logs go to a file.
    const fn logs_to_file(&self) -> bool {
        matches!(self.command, Commands::Review(_))
    }
}

fn log_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env("VETTER_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "vetter_core=debug,vt=debug,info"
        } else {
            "vetter_core=info,vt=info,warn"
        })
    })
}

fn log_file_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("vetter").join("vetter.log"))
}

fn init_tracing(verbose: bool, to_file: bool) {
    let format = env::var("VETTER_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(log_filter(verbose));

    if to_file {
        let Some(file) = log_file_path().and_then(|path| {
            fs::create_dir_all(path.parent()?).ok()?;
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        }) else {
            return;
        };
        let writer = Mutex::new(file);
        match format.as_str() {
            "json" => registry
                .with(fmt::layer().json().with_ansi(false).with_writer(writer))
                .init(),
            _ => registry
                .with(fmt::layer().compact().with_ansi(false).with_writer(writer))
                .init(),
        }
        return;
    }

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = cmd::Context::load(cli.server.as_deref(), cli.json, cli.offline.clone())?;
    match &cli.command {
        Commands::Review(args) => cmd::review::run_review(args, &ctx),
        Commands::Lookup(args) => cmd::lookup::run_lookup(args, &ctx),
        Commands::Search(args) => cmd::search::run_search(args, &ctx),
        Commands::Reviewer(args) => cmd::reviewer::run_reviewer(args, &ctx),
        Commands::Admin(args) => cmd::admin::run_admin(args, &ctx),
        Commands::Users(args) => cmd::users::run_users(args, &ctx),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command, &mut std::io::stdout())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.logs_to_file());

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    if let Err(err) = run(&cli) {
        tracing::debug!("command failed: {err:?}");
        let error = CliError::from_anyhow(&err);
        if render_error(cli.output_mode(), &error).is_err() {
            eprintln!("error: {err:#}");
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_before_and_after_subcommand() {
        let cli = Cli::parse_from(["vt", "--json", "search", "coffee"]);
        assert!(cli.output_mode().is_json());
        let cli = Cli::parse_from(["vt", "search", "coffee", "--json"]);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn default_output_is_not_json() {
        let cli = Cli::parse_from(["vt", "lookup", "01.1.1"]);
        assert!(!cli.output_mode().is_json());
    }

    #[test]
    fn server_and_offline_are_global() {
        let cli = Cli::parse_from([
            "vt",
            "users",
            "--server",
            "http://review.local:8000",
            "--offline",
            "fixture.json",
        ]);
        assert_eq!(cli.server.as_deref(), Some("http://review.local:8000"));
        assert_eq!(cli.offline, Some(PathBuf::from("fixture.json")));
    }

    #[test]
    fn review_flags_parse() {
        let cli = Cli::parse_from(["vt", "review", "-r", "sara", "--queue", "low_confidence"]);
        let Commands::Review(args) = &cli.command else {
            panic!("expected review");
        };
        assert_eq!(args.reviewer.as_deref(), Some("sara"));
        assert_eq!(args.queue.as_deref(), Some("low_confidence"));
        assert!(!args.no_start);
        assert!(cli.logs_to_file());
    }

    #[test]
    fn search_defaults_to_empty_query() {
        let cli = Cli::parse_from(["vt", "search"]);
        let Commands::Search(args) = &cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.query, "");
        assert!(!args.context);
        assert!(args.limit.is_none());
        assert!(!cli.logs_to_file());
    }

    #[test]
    fn admin_reset_stale_locks_defaults_to_thirty_minutes() {
        let cli = Cli::parse_from(["vt", "admin", "reset-stale-locks"]);
        let Commands::Admin(args) = &cli.command else {
            panic!("expected admin");
        };
        assert!(matches!(
            args.command,
            cmd::admin::AdminCommand::ResetStaleLocks {
                max_age_minutes: 30
            }
        ));
    }

    #[test]
    fn users_create_defaults_role() {
        let cli = Cli::parse_from(["vt", "users", "create", "sara"]);
        let Commands::Users(args) = &cli.command else {
            panic!("expected users");
        };
        assert!(matches!(
            &args.command,
            Some(cmd::users::UsersCommand::Create { name, role }) if name == "sara" && role == "reviewer"
        ));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["vt", "frobnicate"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
