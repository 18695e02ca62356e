use clap::{Parser, Subcommand};
use reqwest::RequestBuilder;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "user-cli")]
#[command(about = "Management CLI for the user service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Sent as X-Correlation-Id; the service generates one when omitted.
    #[arg(short, long)]
    correlation_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List users page by page
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
        /// `email`, `fullName` or `createdAt`, optionally followed by `,asc` or `,desc`
        #[arg(long)]
        sort: Option<String>,
    },
    /// Fetch a user by id
    Get { id: String },
    /// Fetch a user by email
    Find { email: String },
    /// Create a user
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: Option<String>,
        /// CUSTOMER or ADMIN
        #[arg(long, default_value = "CUSTOMER")]
        role: String,
    },
    /// Delete a user by id
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::List { page, size, sort } => {
            let mut query = vec![("page", page.to_string()), ("size", size.to_string())];
            if let Some(sort) = sort {
                query.push(("sort", sort));
            }
            client.get(format!("{base}/api/users")).query(&query)
        }
        Commands::Get { id } => client.get(format!("{base}/api/users/{id}")),
        Commands::Find { email } => client
            .get(format!("{base}/api/users/by-email"))
            .query(&[("email", email)]),
        Commands::Create {
            email,
            password,
            full_name,
            role,
        } => client.post(format!("{base}/api/users")).json(&json!({
            "email": email,
            "password": password,
            "fullName": full_name,
            "role": role,
        })),
        Commands::Delete { id } => client.delete(format!("{base}/api/users/{id}")),
    };

    send(request, cli.correlation_id.as_deref()).await
}

async fn send(
    request: RequestBuilder,
    correlation_id: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = match correlation_id {
        Some(id) => request.header("X-Correlation-Id", id),
        None => request,
    };
    let res = request.send().await?;

    let status = res.status();
    let echoed = res
        .headers()
        .get("X-Correlation-Id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    eprintln!("Status: {status} | correlationId={echoed}");

    let text = res.text().await?;
    if text.is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }
    Ok(())
}
