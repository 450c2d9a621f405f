use anyhow::{bail, Context, Result};
use qradar_core::{
    Entity, Integration, OffenseSource, Options, QRadarClient, RawOptions, RequestConfig,
};
use std::env;
use std::path::PathBuf;

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn raw_options_from_env() -> RawOptions {
    let mut raw = RawOptions::new();
    for (key, var) in [
        ("url", "QRADAR_URL"),
        ("username", "QRADAR_USERNAME"),
        ("password", "QRADAR_PASSWORD"),
    ] {
        raw.insert(key, env::var(var).unwrap_or_default());
    }
    raw.insert("openOnly", env_flag("QRADAR_OPEN_ONLY"));
    raw.insert("ignorePrivateIps", env_flag("QRADAR_IGNORE_PRIVATE"));
    if let Ok(sev) = env::var("QRADAR_MIN_SEVERITY") {
        raw.insert("minimumSeverity", sev);
    }
    raw
}

fn load_config() -> Result<RequestConfig> {
    let mut config = match env::var("QRADAR_CONFIG") {
        Ok(path) => RequestConfig::load(&PathBuf::from(&path))
            .with_context(|| format!("loading {}", path))?,
        Err(_) => RequestConfig::default(),
    };
    if env_flag("QRADAR_INSECURE") {
        config.reject_unauthorized = false;
    }
    Ok(config.with_env_overrides())
}

fn print_usage() {
    eprintln!("Usage: qradar-lookup [--raw] <ip> [ip...]");
    eprintln!("Environment:");
    eprintln!("  QRADAR_URL, QRADAR_USERNAME, QRADAR_PASSWORD   (required)");
    eprintln!("  QRADAR_OPEN_ONLY=1, QRADAR_IGNORE_PRIVATE=1, QRADAR_MIN_SEVERITY=<n>");
    eprintln!("  QRADAR_INSECURE=1   skip TLS certificate verification");
    eprintln!("  QRADAR_CONFIG=<path>   request settings JSON file");
}

async fn print_raw(config: RequestConfig, options: &Options, ips: &[String]) -> Result<()> {
    let client = QRadarClient::new(config)?;
    for ip in ips {
        let offenses = client.fetch_offenses(ip, options).await?;
        println!("--- {} ({} offenses) ---", ip, offenses.len());
        println!("{}", serde_json::to_string_pretty(&offenses)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let raw = args.iter().any(|s| s == "--raw");
    args.retain(|s| s != "--raw");

    if args.is_empty() {
        print_usage();
        return Ok(());
    }

    let config = load_config()?;
    let integration = Integration::new(config.clone());
    let (options, errors) = integration.validate_options(&raw_options_from_env());
    if !errors.is_empty() {
        for err in &errors {
            eprintln!("{}", err);
        }
        bail!("invalid configuration ({} errors)", errors.len());
    }

    if raw {
        return print_raw(config, &options, &args).await;
    }

    integration.startup()?;
    let entities: Vec<Entity> = args.into_iter().map(Entity::ip).collect();
    let results = integration.do_lookup(&entities, &options).await?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
