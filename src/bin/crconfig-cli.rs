use clap::{Parser, Subcommand};
use reqwest::header::LAST_MODIFIED;
use serde_json::Value;

use crconfig_monitor::http::CRCONFIG_PATH;
use crconfig_monitor::CdnRegister;

#[derive(Parser)]
#[command(name = "crconfig-cli")]
#[command(about = "Inspect the CRConfig published by a crconfig-monitor", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show monitor status and configured CDNs
    Status,
    /// List the CDNs present in the published CRConfig
    Cdns,
    /// Show which CDN and delivery service serve a hostname
    Resolve {
        /// Hostname to resolve, e.g. video.cdn.example.net
        host: String,
    },
    /// Pretty-print the published CRConfig
    Dump,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/status", base)).send().await?;
            let Some(body) = success_body(res).await? else {
                return Ok(());
            };
            let json: Value = serde_json::from_slice(&body)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Cdns => {
            let Some((body, last_modified)) = fetch_crconfig(&client, base).await? else {
                return Ok(());
            };
            let register = CdnRegister::from_slice(&body)?;
            if register.is_multi_cdn() {
                for cdn in register.managed_cdns() {
                    println!("{}", cdn);
                }
            } else {
                let domain = register
                    .default_config()
                    .and_then(|c| c.get("domain_name"))
                    .and_then(Value::as_str)
                    .unwrap_or("unknown domain");
                println!("single CDN ({})", domain);
            }
            if let Some(t) = last_modified {
                println!("last modified: {}", t);
            }
        }
        Commands::Resolve { host } => {
            let Some((body, _)) = fetch_crconfig(&client, base).await? else {
                return Ok(());
            };
            let register = CdnRegister::from_slice(&body)?;
            match register.cdn_for_host(&host) {
                Some(cdn) => {
                    let ds = register
                        .delivery_service_for_host(cdn, &host)
                        .unwrap_or("-");
                    println!("{} → cdn: {}, delivery service: {}", host, cdn, ds);
                }
                None => println!("{} → single-CDN CRConfig, no CDN selection", host),
            }
        }
        Commands::Dump => {
            let Some((body, _)) = fetch_crconfig(&client, base).await? else {
                return Ok(());
            };
            let json: Value = serde_json::from_slice(&body)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

async fn fetch_crconfig(
    client: &reqwest::Client,
    base: &str,
) -> Result<Option<(Vec<u8>, Option<String>)>, Box<dyn std::error::Error>> {
    let res = client.get(format!("{}{}", base, CRCONFIG_PATH)).send().await?;
    let last_modified = res
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    Ok(success_body(res).await?.map(|body| (body, last_modified)))
}

async fn success_body(res: reqwest::Response) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: monitor returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(None);
    }

    Ok(Some(res.bytes().await?.to_vec()))
}
