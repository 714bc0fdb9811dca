use std::{path::PathBuf, sync::Arc, time::Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, BotDashboard, DispatchOutcome, StoreUpdate, VisibleNotices,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{info, warn};

mod render;

use render::{render_dashboard, render_notice};

#[derive(Parser, Debug)]
struct Cli {
    /// TOML settings file; `dashboard.toml` in the working directory is used if present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one poll cycle and print every bot.
    Status,
    /// Poll until Ctrl-C. Each line typed on stdin is sent as a friend request.
    Watch,
    /// Send a friend request from all bots.
    FriendRequest { username: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(url) = cli.api_base_url {
        settings.api_base_url = url;
        settings.validate()?;
    }
    let dashboard = Arc::new(
        BotDashboard::from_settings(&settings).context("failed to build bot dashboard")?,
    );

    match cli.command {
        Command::Status => {
            let mut notices = dashboard.notifier().subscribe();
            dashboard.refresh().await;
            while let Ok(notice) = notices.try_recv() {
                println!("{}", render_notice(&notice));
            }
            println!("{}", render_dashboard(&dashboard.snapshot().await, Utc::now()));
        }
        Command::FriendRequest { username } => {
            let mut notices = dashboard.notifier().subscribe();
            let outcome = dashboard.submit_friend_request(&username).await;
            while let Ok(notice) = notices.try_recv() {
                println!("{}", render_notice(&notice));
            }
            if let DispatchOutcome::Failed(err) = outcome {
                return Err(anyhow::Error::new(err).context("friend request failed"));
            }
        }
        Command::Watch => watch(dashboard).await?,
    }

    Ok(())
}

async fn watch(dashboard: Arc<BotDashboard>) -> Result<()> {
    let mut notices = dashboard.notifier().subscribe();
    let mut updates = dashboard.store().subscribe();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut visible = VisibleNotices::default();
    let mut stdin_open = true;

    let poller = dashboard.activate();
    info!("watching bots; type a username and press enter to send a friend request");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            notice = notices.recv() => match notice {
                Ok(notice) => {
                    println!("{}", render_notice(&notice));
                    visible.push(notice);
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "dropped notices"),
                Err(RecvError::Closed) => break,
            },
            update = updates.recv() => match update {
                Ok(StoreUpdate::BotsReplaced { .. }) | Err(RecvError::Lagged(_)) => {
                    visible.prune(Instant::now());
                    println!("{}", render_dashboard(&dashboard.snapshot().await, Utc::now()));
                    if !visible.visible().is_empty() {
                        println!("({} notice(s) on screen)", visible.visible().len());
                    }
                }
                Ok(StoreUpdate::SubmissionChanged { submitting }) => {
                    if submitting {
                        println!("sending friend request...");
                    }
                }
                Err(RecvError::Closed) => break,
            },
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    let dashboard = Arc::clone(&dashboard);
                    dashboard.store().set_username_input(line).await;
                    tokio::spawn(async move {
                        dashboard.dispatcher().submit_input().await;
                    });
                }
                Ok(None) => stdin_open = false,
                Err(err) => {
                    warn!(error = %err, "stdin closed");
                    stdin_open = false;
                }
            },
        }
    }

    poller.stop().await;
    Ok(())
}
