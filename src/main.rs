mod config;
mod modem;
mod poller;
mod reassembly;
mod registry;
mod web;

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::Config;
use crate::modem::{CommandDriver, SerialTransport};
use crate::poller::{GatewayState, PollScheduler, Poller};
use crate::web::AppState;

#[derive(Parser)]
#[command(name = "sms-gps-gateway")]
#[command(about = "Polls SMS GPS trackers through a serial GSM modem")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file and its roster
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run the polling worker and the status API
    Serve {
        #[arg(short, long)]
        config: PathBuf,
        /// Start with polling enabled regardless of the config
        #[arg(long)]
        enable_poll: bool,
        /// Append log output to this file instead of stderr
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            init_logging(cli.verbose, None);
            check(&config)
        }
        Commands::Serve {
            config,
            enable_poll,
            log_file,
        } => {
            init_logging(cli.verbose, log_file.as_deref());
            serve(&config, enable_poll)
        }
    }
}

fn init_logging(verbosity: u8, log_file: Option<&Path>) {
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    // RUST_LOG still wins over the flags
    builder.parse_default_env();
    builder.format(|buf, record| {
        let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        writeln!(
            buf,
            "{} [{}] {}: {}",
            ts,
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Some(path) = log_file {
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Cannot open log file {}: {}", path.display(), e),
        }
    }

    builder.init();
}

fn check(path: &Path) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let roster = match registry::load_roster(&config.roster.path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Roster error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Config is valid (modem {} @ {} baud, API on {})",
        config.modem.port, config.modem.baud_rate, config.web.bind
    );
    println!("Roster has {} devices", roster.len());
    for (i, device) in roster.iter().enumerate() {
        println!("  {}: {}", i + 1, device);
    }
    ExitCode::SUCCESS
}

fn serve(path: &Path, enable_poll: bool) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Cannot start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_gateway(config, enable_poll)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_gateway(config: Config, enable_poll: bool) -> Result<(), Box<dyn std::error::Error>> {
    let roster = registry::load_roster(&config.roster.path)?;
    let gateway = GatewayState::new(roster, config.poll.enabled || enable_poll);

    let transport = SerialTransport::open(&config.modem.port, config.modem.baud_rate)?;
    let driver = CommandDriver::new(transport, config.modem.command_settle);
    let scheduler = PollScheduler::new(driver, gateway.clone(), config.scheduler_config());

    let mut poller = Poller::new(gateway.clone());
    poller.start(scheduler, config.modem.tick_interval)?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Cannot listen for Ctrl-C: {}", e);
        }
        log::info!("Shutting down");
    };
    let served = web::run_server(&config.web.bind, AppState::new(gateway), shutdown).await;

    poller.stop().await;
    served?;
    Ok(())
}
