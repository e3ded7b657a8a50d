use std::path::PathBuf;

use clap::{Parser, Subcommand};

use registry_lifecycle::config;
use registry_lifecycle::health::{run_sweep, Prober};
use registry_lifecycle::lifecycle::{identity, startup};
use registry_lifecycle::registry::{EurekaClient, RegistryClient};

#[derive(Parser)]
#[command(name = "registry-cli")]
#[command(about = "Operator CLI for the discovery registry", long_about = None)]
struct Cli {
    /// Registry base URL (overrides config and EUREKA_URL).
    #[arg(short, long)]
    url: Option<String>,

    /// Optional TOML config file.
    #[arg(short, long, env = "REGISTRY_CONFIG")]
    config: Option<PathBuf>,

    /// Per-probe timeout in seconds for `sweep`.
    #[arg(long)]
    probe_timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered applications and instances as JSON
    Apps,
    /// Probe every registered instance once
    Sweep,
    /// Register this host once
    Register,
    /// Send one heartbeat for this host
    Heartbeat,
    /// Deregister this host
    Deregister,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let loaded = config::load(cli.config.as_deref())?;
    for var in &loaded.ignored {
        eprintln!("warning: ignoring {}", var);
    }
    let mut config = loaded.config;
    if let Some(url) = cli.url {
        config.registry.url = url;
    }
    if let Some(secs) = cli.probe_timeout {
        config.probe.timeout_secs = secs.max(1);
    }

    match cli.command {
        Commands::Apps => {
            let client =
                EurekaClient::new(&config.registry.url, config.registry.request_timeout())?;
            let apps = client.list_applications().await?;
            println!("{}", serde_json::to_string_pretty(&apps)?);
        }
        Commands::Sweep => {
            let client =
                EurekaClient::new(&config.registry.url, config.registry.request_timeout())?;
            let prober = Prober::new(&config.probe)?;
            let apps = client.list_applications().await?;
            let report = run_sweep(&prober, &apps).await;
            for outcome in &report.outcomes {
                println!("{}", outcome);
            }
            println!(
                "{} of {} instances reachable in {:?}",
                report.reachable(),
                report.probed(),
                report.duration
            );
        }
        Commands::Register | Commands::Heartbeat | Commands::Deregister => {
            let identity = identity::resolve(&config.instance);
            let manager = startup::build_manager(&config, &identity)?;
            let result = match cli.command {
                Commands::Register => manager.register().await,
                Commands::Heartbeat => manager.heartbeat().await.map(|outcome| {
                    println!("heartbeat: {:?}", outcome);
                }),
                _ => manager.deregister().await,
            };
            match result {
                Ok(()) => println!("ok: {}", manager.key()),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
