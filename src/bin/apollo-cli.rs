use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "apollo-cli")]
#[command(about = "Management CLI for the mock Apollo config service", long_about = None)]
struct Cli {
    /// Public config listener
    #[arg(short, long, default_value = "http://localhost:8070")]
    url: String,

    /// Internal admin listener
    #[arg(short, long, default_value = "http://localhost:9090")]
    admin_url: String,

    /// Admin API key, if the server requires one
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a namespace with its release key
    Config {
        app_id: String,
        cluster: String,
        namespace: String,
        #[arg(long)]
        release_key: Option<String>,
    },
    /// Fetch only the configurations of a namespace
    Flat {
        app_id: String,
        cluster: String,
        namespace: String,
    },
    /// Long poll for changes on the given namespaces
    Poll {
        #[arg(required = true)]
        namespaces: Vec<String>,
    },
    /// Check the public listener
    Health,
    /// Change the server log level (debug, info, warn, error)
    LogLevel { level: String },
    /// Show watchers and outstanding polls
    Status,
    /// Re-read every snapshot file now
    Reload,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);
    }

    match cli.command {
        Commands::Config {
            app_id,
            cluster,
            namespace,
            release_key,
        } => {
            let mut req = client.get(format!("{}/configs/{app_id}/{cluster}/{namespace}", cli.url));
            if let Some(release_key) = release_key {
                req = req.query(&[("releaseKey", release_key)]);
            }
            print_response(req.send().await?).await?;
        }
        Commands::Flat {
            app_id,
            cluster,
            namespace,
        } => {
            let res = client
                .get(format!("{}/configfiles/json/{app_id}/{cluster}/{namespace}", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Poll { namespaces } => {
            let notifications: Vec<Value> = namespaces
                .iter()
                .map(|ns| serde_json::json!({ "notificationId": -1, "namespaceName": ns }))
                .collect();
            let res = client
                .get(format!("{}/notifications/v2", cli.url))
                .query(&[("notifications", serde_json::to_string(&notifications)?)])
                .send()
                .await?;
            if res.status() == StatusCode::NOT_MODIFIED {
                println!("No change");
            } else {
                print_response(res).await?;
            }
        }
        Commands::Health => {
            let res = client.get(format!("{}/healthz", cli.url)).send().await?;
            print_text(res).await?;
        }
        Commands::LogLevel { level } => {
            let res = client
                .patch(format!("{}/ctrl/logging", cli.admin_url))
                .query(&[("level", level)])
                .headers(headers)
                .send()
                .await?;
            print_text(res).await?;
        }
        Commands::Status => {
            let res = client
                .get(format!("{}/admin/status", cli.admin_url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Reload => {
            let res = client
                .post(format!("{}/admin/reload", cli.admin_url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn print_text(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if status.is_success() {
        println!("{}", text);
    } else {
        eprintln!("Error: server returned status {}: {}", status, text);
    }
    Ok(())
}
