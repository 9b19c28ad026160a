//! updock CLI
//!
//! Command-line interface for interacting with the updock daemon

use clap::{Parser, Subcommand};
use color_eyre::Result;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use updock_api::requests::DEFAULT_RUNTIME_PORT;
use updock_client::{HttpClient, WsClient};

mod output;

#[derive(Parser)]
#[command(name = "updock")]
#[command(about = "Container image update detection across Docker hosts", long_about = None)]
struct Cli {
    /// Daemon base URL
    #[arg(long, global = true, env = "UPDOCK_URL", default_value = "http://localhost:3000")]
    url: String,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all hosts
    #[command(name = "hosts")]
    Hosts,
    /// Probe and register a Docker host
    #[command(name = "add-host")]
    AddHost {
        hostname: String,
        /// Docker API port
        #[arg(long, default_value_t = DEFAULT_RUNTIME_PORT)]
        port: u16,
    },
    /// Bring an offline host back after it is reachable again
    Reconnect { hostname: String },
    /// Run an update check across all hosts now
    Check,
    /// Show every recorded container
    Inventory,
    /// Show recent update checks
    History {
        /// Number of rows, daemon default when omitted
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show or change the interval between checks (0 disables)
    Interval {
        #[arg(allow_negative_numbers = true)]
        minutes: Option<i64>,
    },
    /// Stream live fleet events
    Watch,
}

fn render<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text(value));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = HttpClient::new(&cli.url)?;

    match cli.command {
        Commands::Hosts => {
            let hosts = client.list_hosts().await?;
            render(cli.json, &hosts, |h| output::hosts(h))?;
        }
        Commands::AddHost { hostname, port } => {
            let response = client.add_host(&hostname, port).await?;
            println!("{}", response.message);
        }
        Commands::Reconnect { hostname } => {
            let response = client.reconnect_host(&hostname).await?;
            println!("{}", response.message);
        }
        Commands::Check => {
            let report = client.check_updates().await?;
            render(cli.json, &report, output::report)?;
        }
        Commands::Inventory => {
            let containers = client.list_containers().await?;
            render(cli.json, &containers, |c| output::inventory(c))?;
        }
        Commands::History { limit } => {
            let records = client.update_history(limit).await?;
            render(cli.json, &records, |r| output::history(r))?;
        }
        Commands::Interval { minutes: Some(minutes) } => {
            let response = client.set_check_interval(minutes).await?;
            println!("{}", response.message);
        }
        Commands::Interval { minutes: None } => {
            let current = client.check_interval().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&current)?);
            } else if current.interval_minutes == 0 {
                println!("interval checks disabled");
            } else {
                println!("every {} minutes", current.interval_minutes);
            }
        }
        Commands::Watch => {
            let mut events = WsClient::connect(client.events_url()?)?;
            while let Some(event) = events.recv().await {
                if cli.json {
                    println!("{}", serde_json::to_string(&event)?);
                } else {
                    println!("{}", output::event(&event));
                }
            }
        }
    }

    Ok(())
}
