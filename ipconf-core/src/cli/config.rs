use crate::conf::{ConfigError, RuntimeConfig, load_config};
use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum ConfigCmd {
    /// Validate configuration and exit
    Check {
        /// Path to config file
        #[arg(default_value = "config/ipconf.hcl")]
        path: PathBuf,
    },

    /// Print resolved configuration
    Dump {
        #[arg(default_value = "config/ipconf.hcl")]
        path: PathBuf,

        /// Output as JSON instead of HCL
        #[arg(long)]
        json: bool,
    },
}

pub fn run(cmd: ConfigCmd) -> Result<()> {
    match cmd {
        ConfigCmd::Check { path } => check(path),
        ConfigCmd::Dump { path, json } => dump(path, json),
    }
}

pub fn check(path: PathBuf) -> Result<()> {
    match load_config(&path) {
        Ok(cfg) => {
            print_summary(&cfg);
            Ok(())
        }
        Err(err) => {
            eprintln!("{err}");
            if let Some(hint) = config_error_hint(&err) {
                eprintln!();
                eprintln!("{hint}");
            }
            std::process::exit(1);
        }
    }
}

fn print_summary(cfg: &RuntimeConfig) {
    println!("✔ Config loaded successfully");
    println!("✔ listening on {}", cfg.server.listen);
    println!(
        "✔ {} discovery endpoint(s), timeout {}s",
        cfg.discovery.endpoints.len(),
        cfg.discovery.timeout_secs
    );
    println!("✔ watching '{}'", cfg.ip_conf.service_path);
    match cfg.ip_conf.max_results {
        Some(n) => println!("✔ /ip/list truncated to top {n}"),
        None => println!("✔ /ip/list returns every candidate"),
    }
    if cfg.global.is_debug() {
        println!("✔ debug mode: synthetic gateway nodes will be registered");
    }
}

pub fn dump(path: PathBuf, json: bool) -> Result<()> {
    let cfg = load_config(&path)?;

    let rendered = if json {
        serde_json::to_string_pretty(&cfg)?
    } else {
        hcl::to_string(&cfg)?
    };
    println!("{rendered}");

    Ok(())
}

pub fn config_error_hint(err: &ConfigError) -> Option<&'static str> {
    match err {
        ConfigError::EmptyServicePath => Some(
            "The dispatcher needs the key prefix gateways register under.\n\
             \n\
             Example:\n\
             \n\
             ip_conf {\n\
             \x20 service_path = \"/platos/ip_dispatch\"\n\
             }",
        ),

        ConfigError::NoDiscoveryEndpoints => Some(
            "List the coordination cluster members to watch.\n\
             \n\
             Example:\n\
             \n\
             discovery {\n\
             \x20 endpoints = [\"localhost:2379\"]\n\
             }",
        ),

        ConfigError::InvalidListen { .. } => {
            Some("`server.listen` must be an IP socket address such as \"0.0.0.0:6789\".")
        }

        _ => None,
    }
}
