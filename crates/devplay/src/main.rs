// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! DevPlay - developer software showcase client.
//!
//! Binary entry point: loads configuration, connects to the hosted backend,
//! runs the session bootstrap and dispatches the subcommand.

mod community;
mod context;
mod session;
mod status;

use std::process::ExitCode;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use devplay_core::{DevPlayError, OAuthProvider, Role};

use crate::context::Context;

/// DevPlay - developer software showcase client.
#[derive(Parser, Debug)]
#[command(name = "devplay", version, about, long_about = None)]
struct Cli {
    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Restore the session and show what the app would render.
    Status {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Start an OAuth sign-in and print the URL to open.
    Login {
        /// `google` or `github`.
        #[arg(value_parser = parse_provider)]
        provider: OAuthProvider,
    },
    /// Finish an OAuth sign-in from the redirected callback URL.
    Callback { url: String },
    /// Sign out and forget the stored session.
    Logout,
    /// Choose a nickname for a signed-in account without a profile.
    Setup { nickname: String },
    /// Browse published software.
    #[command(subcommand)]
    Software(SoftwareCommand),
    /// Browse forum threads.
    #[command(subcommand)]
    Threads(ThreadsCommand),
    /// Request or review role changes.
    #[command(subcommand)]
    Roles(RolesCommand),
}

#[derive(Subcommand, Debug)]
enum SoftwareCommand {
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ThreadsCommand {
    List {
        /// Sort by score instead of recency.
        #[arg(long)]
        popular: bool,
    },
}

#[derive(Subcommand, Debug)]
enum RolesCommand {
    /// Ask to become a developer or admin.
    Request {
        #[arg(value_parser = parse_role)]
        role: Role,
        #[arg(long)]
        reason: Option<String>,
    },
    /// List requests awaiting review (admins only).
    Pending,
    Approve {
        id: String,
        #[arg(long)]
        notes: Option<String>,
    },
    Reject {
        id: String,
        #[arg(long)]
        notes: Option<String>,
    },
}

fn parse_provider(raw: &str) -> Result<OAuthProvider, String> {
    OAuthProvider::from_str(&raw.to_ascii_lowercase())
        .map_err(|_| format!("unknown provider '{raw}' (expected google or github)"))
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::from_str(&raw.to_ascii_lowercase())
        .map_err(|_| format!("unknown role '{raw}' (expected developer or admin)"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match devplay_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            devplay_config::render_errors(&errors);
            return ExitCode::from(1);
        }
    };
    init_tracing(&config.app.log_level);

    let ctx = match Context::connect(config).await {
        Ok(ctx) => ctx,
        Err(e) => return report(&e),
    };

    let label = notice_context(&cli.command);
    let result = match cli.command {
        Commands::Status { json } => status::run_status(&ctx, json, cli.plain).await,
        Commands::Login { provider } => session::run_login(&ctx, provider).await,
        Commands::Callback { url } => session::run_callback(&ctx, &url).await,
        Commands::Logout => session::run_logout(&ctx).await,
        Commands::Setup { nickname } => session::run_setup(&ctx, &nickname).await,
        Commands::Software(SoftwareCommand::List { category, search }) => {
            community::list_software(&ctx, category, search).await
        }
        Commands::Threads(ThreadsCommand::List { popular }) => {
            community::list_threads(&ctx, popular).await
        }
        Commands::Roles(cmd) => match cmd {
            RolesCommand::Request { role, reason } => {
                community::request_role(&ctx, role, reason.as_deref()).await
            }
            RolesCommand::Pending => community::pending_requests(&ctx).await,
            RolesCommand::Approve { id, notes } => {
                community::review_request(&ctx, &id, true, notes.as_deref()).await
            }
            RolesCommand::Reject { id, notes } => {
                community::review_request(&ctx, &id, false, notes.as_deref()).await
            }
        },
    };

    ctx.shutdown().await;
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_in(&e, label),
    }
}

/// Label prefixed to failure notices.
fn notice_context(command: &Commands) -> &'static str {
    match command {
        Commands::Status { .. } => "상태",
        Commands::Login { .. } | Commands::Callback { .. } | Commands::Logout => "Auth",
        Commands::Setup { .. } => "프로필 설정",
        Commands::Software(_) => "소프트웨어",
        Commands::Threads(_) => "스레드",
        Commands::Roles(_) => "권한 요청",
    }
}

fn report(e: &DevPlayError) -> ExitCode {
    report_in(e, "DevPlay")
}

fn report_in(e: &DevPlayError, context: &str) -> ExitCode {
    match e {
        DevPlayError::Config(msg) => eprintln!("devplay: configuration error: {msg}"),
        other => {
            tracing::debug!(error = %other, "command failed");
            eprintln!("{}", other.notice(context));
        }
    }
    ExitCode::from(1)
}

/// Installs the fmt subscriber; `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("devplay={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
