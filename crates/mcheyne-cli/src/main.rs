mod client_cmds;
mod config;
mod lookup_cmds;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use mcheyne_core::plan::PlanStore;
use mcheyne_core::resolve::CalendarDate;
use mcheyne_core::source::{HttpSource, LocalSource, ReadingSource};

use client_cmds::DoneTarget;
use config::{CliOverrides, McheyneConfig};

#[derive(Parser)]
#[command(name = "mcheyne", about = "M'Cheyne Bible reading plan service")]
struct Cli {
    /// Reading-plan JSON document (overrides MCHEYNE_DATA_PATH env var)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write an mcheyne config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Serve the reading plan API, voice webhook and Alexa endpoint
    Serve {
        /// Address to bind (overrides MCHEYNE_BIND)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Core API the voice channels should forward to (overrides API_BASE_URL)
        #[arg(long)]
        api_base_url: Option<String>,
    },
    /// List the available reading plans
    Plans,
    /// Show today's reading
    Today {
        /// Plan ID (defaults to the selected plan)
        #[arg(long)]
        plan: Option<String>,
        /// Year of a multi-year plan (defaults to the first reading for the date)
        #[arg(long)]
        year: Option<u32>,
    },
    /// Show the reading for a month and day
    Date {
        /// Month number or name
        month: String,
        /// Day of month
        day: String,
        /// Plan ID (defaults to the selected plan)
        #[arg(long)]
        plan: Option<String>,
        /// Year of a multi-year plan (defaults to the first reading for the date)
        #[arg(long)]
        year: Option<u32>,
    },
    /// List every reading in a plan
    All {
        /// Plan ID (defaults to the selected plan)
        #[arg(long)]
        plan: Option<String>,
    },
    /// Print a Bible Gateway link for a passage
    Passage {
        /// Passage reference, e.g. "John 3:16"
        passage: String,
        /// Translation (defaults to client.bible_version)
        #[arg(long)]
        version: Option<String>,
    },
    /// Toggle completion of a reading (defaults to today)
    Done {
        /// Month number or name
        month: Option<String>,
        /// Day of month
        day: Option<String>,
        /// Year of a multi-year plan (defaults to the next unfinished one)
        #[arg(long, conflicts_with = "entry")]
        year: Option<u32>,
        /// Entry number as listed by `mcheyne all`
        #[arg(long, conflicts_with_all = ["month", "day"])]
        entry: Option<usize>,
        /// Plan ID (defaults to the selected plan)
        #[arg(long)]
        plan: Option<String>,
    },
    /// Show completion progress for a plan
    Progress {
        /// Plan ID (defaults to the selected plan)
        #[arg(long)]
        plan: Option<String>,
    },
    /// Selected plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Toggle between the light and dark theme
    Theme,
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Follow a different plan by default
    Use {
        /// Plan ID to select
        plan_id: String,
    },
}

/// Execute the `mcheyne init` command: write config file.
fn cmd_init(resolved: &McheyneConfig, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        server: config::ServerSection {
            bind: Some(resolved.bind.clone()),
            port: Some(resolved.port),
        },
        data: config::DataSection {
            path: Some(resolved.data_path.clone()),
        },
        voice: config::VoiceSection {
            api_base_url: resolved.api_base_url.clone(),
            timeout_secs: Some(resolved.upstream_timeout.as_secs()),
        },
        client: config::ClientSection {
            bible_version: Some(resolved.bible_version.clone()),
        },
    };

    config::save_config_to(&cfg, &path)?;

    println!("Config written to {}", path.display());
    println!("  data.path = {}", resolved.data_path.display());
    println!("  server = {}:{}", resolved.bind, resolved.port);
    println!();
    println!("Next: run `mcheyne serve` to start the API.");

    Ok(())
}

fn load_store(resolved: &McheyneConfig) -> anyhow::Result<Arc<PlanStore>> {
    let store = PlanStore::load(&resolved.data_path).with_context(|| {
        format!(
            "failed to load reading plans from {}",
            resolved.data_path.display()
        )
    })?;
    Ok(Arc::new(store))
}

/// Resolve a `[month day]` pair, falling back to today when both are absent.
fn date_or_today(month: Option<String>, day: Option<String>) -> anyhow::Result<CalendarDate> {
    match (month, day) {
        (Some(m), Some(d)) => lookup_cmds::parse_date_args(&m, &d),
        (None, None) => Ok(CalendarDate::today()),
        _ => anyhow::bail!("give both a month and a day, or neither for today"),
    }
}

async fn cmd_serve(resolved: McheyneConfig) -> anyhow::Result<()> {
    let store = load_store(&resolved)?;

    let source: Arc<dyn ReadingSource> = match &resolved.api_base_url {
        Some(url) => {
            tracing::info!(upstream = %url, "voice channels forward to upstream API");
            Arc::new(HttpSource::new(url.clone(), resolved.upstream_timeout)?)
        }
        None => Arc::new(LocalSource::new(store.clone())),
    };

    let state = serve_cmd::AppState::new(store, source);
    serve_cmd::run_serve(state, &resolved.bind, resolved.port).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let overrides = match &cli.command {
        Commands::Serve {
            bind,
            port,
            api_base_url,
        } => CliOverrides {
            data_path: cli.data.clone(),
            bind: bind.clone(),
            port: *port,
            api_base_url: api_base_url.clone(),
        },
        _ => CliOverrides {
            data_path: cli.data.clone(),
            ..Default::default()
        },
    };
    let resolved = McheyneConfig::resolve(&overrides)?;

    match cli.command {
        Commands::Init { force } => {
            cmd_init(&resolved, force)?;
        }
        Commands::Serve { .. } => {
            cmd_serve(resolved).await?;
        }
        Commands::Plans => {
            let store = load_store(&resolved)?;
            let state = client_cmds::open_state()?;
            lookup_cmds::run_plans(&store, &state.selected_plan());
        }
        Commands::Today { plan, year } => {
            let store = load_store(&resolved)?;
            let state = client_cmds::open_state()?;
            let plan = plan.unwrap_or_else(|| state.selected_plan());
            let text =
                lookup_cmds::today_text(&store, &plan, year, &resolved.bible_version, |i| {
                    state.is_completed(&plan, i)
                })?;
            print!("{text}");
        }
        Commands::Date {
            month,
            day,
            plan,
            year,
        } => {
            let store = load_store(&resolved)?;
            let state = client_cmds::open_state()?;
            let plan = plan.unwrap_or_else(|| state.selected_plan());
            let date = lookup_cmds::parse_date_args(&month, &day)?;
            let text =
                lookup_cmds::date_text(&store, &plan, date, year, &resolved.bible_version, |i| {
                    state.is_completed(&plan, i)
                })?;
            print!("{text}");
        }
        Commands::All { plan } => {
            let store = load_store(&resolved)?;
            let state = client_cmds::open_state()?;
            let plan = plan.unwrap_or_else(|| state.selected_plan());
            let text = lookup_cmds::all_text(&store, &plan, |i| state.is_completed(&plan, i))?;
            print!("{text}");
        }
        Commands::Passage { passage, version } => {
            let version = version.unwrap_or_else(|| resolved.bible_version.clone());
            print!("{}", lookup_cmds::passage_text(&passage, &version));
        }
        Commands::Done {
            month,
            day,
            year,
            entry,
            plan,
        } => {
            let store = load_store(&resolved)?;
            let mut state = client_cmds::open_state()?;
            let plan = plan.unwrap_or_else(|| state.selected_plan());
            let target = match entry {
                Some(number) => DoneTarget::Entry(number),
                None => DoneTarget::Date {
                    date: date_or_today(month, day)?,
                    cycle: year,
                },
            };
            let msg =
                client_cmds::toggle_done(&mut state, &store, &plan, target, chrono::Utc::now())?;
            println!("{msg}");
        }
        Commands::Progress { plan } => {
            let store = load_store(&resolved)?;
            let state = client_cmds::open_state()?;
            let plan = plan.unwrap_or_else(|| state.selected_plan());
            println!("{}", client_cmds::progress_text(&state, &store, &plan)?);
        }
        Commands::Plan {
            command: PlanCommands::Use { plan_id },
        } => {
            let store = load_store(&resolved)?;
            let mut state = client_cmds::open_state()?;
            println!("{}", client_cmds::use_plan(&mut state, &store, &plan_id)?);
        }
        Commands::Theme => {
            let mut state = client_cmds::open_state()?;
            println!("{}", client_cmds::toggle_theme(&mut state)?);
        }
    }

    Ok(())
}
