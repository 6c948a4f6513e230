use clap::{Parser, Subcommand};
use ipconf_core::cli::config::ConfigCmd;
use ipconf_core::conf::load_config;
use ipconf_core::logging::init_logging;
use ipconf_core::server;
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = "config/ipconf.hcl";

#[derive(Parser, Debug)]
#[command(
    name = "ipconf",
    version,
    about = "ipconf: gateway endpoint dispatch for the IM platform"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Configuration tooling
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },

    /// Run the dispatch service (default)
    Run {
        /// Path to the ipconf config file
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Config { cmd }) => {
            if let Err(e) = ipconf_core::cli::config::run(cmd) {
                eprintln!("config error: {e:#}");
                std::process::exit(1);
            }
        }

        Some(Command::Run { config }) => run(config),

        None => run(PathBuf::from(DEFAULT_CONFIG)),
    }
}

fn run(config: PathBuf) {
    init_logging();

    let cfg = match load_config(&config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(path = %config.display(), error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    if let Err(e) = server::run(cfg) {
        tracing::error!(error = ?e, "ipconf stopped");
        std::process::exit(1);
    }
}
