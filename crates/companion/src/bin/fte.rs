//! `fte` - terminal companion for the Digital FTE.

#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::disallowed_macros)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;

use companion::notice::drain_notices;
use companion::settings::NotificationKey;
use companion::{
    ui, ActionType, ApiClient, ApprovalsController, ConnectivityMonitor, FileKeyValueStore,
    KeyValueStore, NoticeSink, OfflineQueue, Outcome, SettingsStore, Signal, Theme,
};

#[derive(Parser)]
#[command(name = "fte")]
#[command(about = "Companion CLI for the Digital FTE", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory for persisted settings and the offline queue
    #[arg(long, global = true, env = "FTE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Treat the backend as unreachable and queue decisions
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show dashboard counts
    Dashboard,

    /// List tasks waiting for approval
    Pending {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Show a task
    Show { id: String },

    /// Approve a pending task
    Approve {
        id: String,
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Reject a pending task
    Reject {
        id: String,
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Send a chat message to the agent
    Chat { message: Vec<String> },

    /// Show chat history
    History {
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Show recent activity
    Activity {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Replay queued offline actions
    Sync,

    /// Show or clear the offline queue
    Queue {
        #[arg(long)]
        clear: bool,
    },

    /// View or change settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Check that the backend is reachable
    Health,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print current settings
    Show,
    /// Set the API base URL
    SetUrl { url: String },
    /// Set the theme (dark, light, system)
    Theme { theme: String },
    /// Toggle a notification category (approvals, suggestions, digest)
    Toggle { key: String },
    /// Restore defaults
    Reset,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        ui::print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME").map_or_else(
        || PathBuf::from(".fte"),
        |home| PathBuf::from(home).join(".fte"),
    )
}

fn print_signals(rx: &mut UnboundedReceiver<Signal>) {
    for notice in drain_notices(rx) {
        ui::print_notice(&notice);
    }
}

async fn decide(
    client: ApiClient,
    kv: &Arc<dyn KeyValueStore>,
    offline: bool,
    notices: &NoticeSink,
    kind: ActionType,
    id: &str,
    note: Option<&str>,
) -> Result<Outcome> {
    let queue = Arc::new(OfflineQueue::load(Arc::clone(kv)).await?);
    let connectivity = ConnectivityMonitor::new(false);
    if !offline {
        connectivity.probe(&client).await;
    }
    let controller = ApprovalsController::new(client, queue, connectivity, notices.clone());
    let outcome = match kind {
        ActionType::Approve => controller.approve(id, note).await?,
        ActionType::Reject => controller.reject(id, note).await?,
    };
    Ok(outcome)
}

fn report_outcome(outcome: Outcome) {
    if outcome == Outcome::Queued {
        ui::print_info("Run `fte sync` once the backend is reachable");
    }
}

async fn run(cli: Cli) -> Result<()> {
    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let kv: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(&data_dir));
    let settings = SettingsStore::load(Arc::clone(&kv)).await?;

    let base_url = std::env::var("FTE_API_URL")
        .ok()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(settings.get().await.api_base_url);
    let client = ApiClient::new(&base_url).context("Invalid API URL")?;

    let (notices, mut rx) = NoticeSink::channel();

    match cli.command {
        Commands::Dashboard => {
            let summary = client.dashboard().await?;
            ui::display_dashboard(&summary);
        }

        Commands::Pending { limit } => {
            let list = client.pending_tasks(limit).await?;
            if list.tasks.is_empty() {
                ui::print_success("Nothing waiting for approval");
            } else {
                println!("{}", ui::task_table(&list.tasks));
                ui::print_info(&format!("{} task(s) pending", list.count));
            }
        }

        Commands::Show { id } => {
            let task = client.task(&id).await?;
            ui::display_task_details(&task);
        }

        Commands::Approve { id, note } => {
            let outcome = decide(
                client,
                &kv,
                cli.offline,
                &notices,
                ActionType::Approve,
                &id,
                note.as_deref(),
            )
            .await;
            print_signals(&mut rx);
            report_outcome(outcome?);
        }

        Commands::Reject { id, note } => {
            let outcome = decide(
                client,
                &kv,
                cli.offline,
                &notices,
                ActionType::Reject,
                &id,
                note.as_deref(),
            )
            .await;
            print_signals(&mut rx);
            report_outcome(outcome?);
        }

        Commands::Chat { message } => {
            let message = message.join(" ");
            let reply = client.send_chat(&message, None).await?;
            println!("{}", reply.response);
            if let Some(id) = &reply.task_created {
                ui::print_success(&format!("Created task {id}"));
            }
            if !reply.suggestions.is_empty() {
                ui::print_info(&reply.suggestions.join(" · "));
            }
        }

        Commands::History { limit } => {
            let records = client.chat_history(limit).await?;
            ui::display_chat(&records);
        }

        Commands::Activity { limit } => {
            let items = client.activity(limit).await?;
            if items.is_empty() {
                ui::print_info("No recent activity");
            } else {
                println!("{}", ui::activity_table(&items));
            }
        }

        Commands::Sync => {
            let queue = OfflineQueue::load(Arc::clone(&kv)).await?;
            if queue.is_empty().await {
                ui::print_success("Offline queue is empty");
                return Ok(());
            }
            let connectivity = ConnectivityMonitor::new(false);
            if cli.offline || !connectivity.probe(&client).await {
                ui::print_warning("Backend unreachable, nothing sent");
                return Ok(());
            }
            let report = queue.drain(&client, &notices).await?;
            print_signals(&mut rx);
            ui::print_info(&format!(
                "{} synced, {} will retry, {} dropped",
                report.synced, report.retried, report.dropped
            ));
        }

        Commands::Queue { clear } => {
            let queue = OfflineQueue::load(Arc::clone(&kv)).await?;
            if clear {
                queue.clear().await?;
                ui::print_success("Offline queue cleared");
            } else {
                let actions = queue.snapshot().await;
                if actions.is_empty() {
                    ui::print_success("Offline queue is empty");
                } else {
                    println!("{}", ui::queue_table(&actions));
                }
            }
        }

        Commands::Settings { action } => match action.unwrap_or(SettingsAction::Show) {
            SettingsAction::Show => ui::display_settings(&settings.get().await, &base_url),
            SettingsAction::SetUrl { url } => {
                let updated = settings.set_api_base_url(&url).await?;
                ui::print_success(&format!("API URL set to {}", updated.api_base_url));
            }
            SettingsAction::Theme { theme } => {
                let theme: Theme = theme.parse()?;
                settings.set_theme(theme).await?;
                ui::print_success(&format!("Theme set to {theme:?}"));
            }
            SettingsAction::Toggle { key } => {
                let key: NotificationKey = key.parse()?;
                let enabled = settings.toggle_notification(key).await?;
                ui::print_success(&format!(
                    "{key:?} notifications {}",
                    if enabled { "enabled" } else { "disabled" }
                ));
            }
            SettingsAction::Reset => {
                settings.reset().await?;
                ui::print_success("Settings restored to defaults");
            }
        },

        Commands::Health => {
            let health = client.health().await?;
            ui::print_success(&format!("{} ({})", health.status, client.base_url()));
            println!("  api           {}", health.components.api);
            println!("  vault         {}", health.components.vault);
            println!("  notifications {}", health.components.notifications);
        }
    }

    print_signals(&mut rx);
    Ok(())
}
