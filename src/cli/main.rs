use clap::{Parser, Subcommand};
use reqwest::{Client, RequestBuilder};
use std::error::Error;

#[derive(Parser)]
#[command(name = "opinion-search-cli")]
#[command(about = "Opinion search admin CLI", long_about = None)]
struct Cli {
    #[arg(short, long, env = "OPINION_SEARCH_ENDPOINT", default_value = "http://localhost:8080")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search opinions
    Search {
        /// Free-text term
        #[arg(value_name = "QUERY", default_value = "")]
        q: String,

        #[arg(short, long)]
        product: Option<String>,

        #[arg(short, long)]
        version: Option<String>,

        #[arg(short, long)]
        os: Option<String>,

        /// praise, issue or suggestion
        #[arg(short = 't', long = "type")]
        opinion_type: Option<String>,

        #[arg(short, long)]
        locale: Option<String>,

        /// YYYY-MM-DD or MM/DD/YYYY
        #[arg(long)]
        date_start: Option<String>,

        /// YYYY-MM-DD or MM/DD/YYYY
        #[arg(long)]
        date_end: Option<String>,

        #[arg(long, default_value = "1")]
        page: usize,
    },

    /// Start serving queries
    Start,

    /// Stop serving queries
    Stop,

    /// Rebuild the search index from the store
    Reindex,

    /// Show search index statistics
    Stats,

    /// Check server health
    Health,
}

async fn print_json(request: RequestBuilder) -> Result<(), Box<dyn Error>> {
    let response = request.send().await?;
    let status = response.status();
    let body: serde_json::Value = response.json().await?;

    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        return Err(format!("server responded with {}", status).into());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let client = Client::new();
    let endpoint = cli.endpoint.trim_end_matches('/');

    match cli.command {
        Commands::Search {
            q,
            product,
            version,
            os,
            opinion_type,
            locale,
            date_start,
            date_end,
            page,
        } => {
            let mut params: Vec<(&str, String)> = vec![("q", q), ("page", page.to_string())];
            for (name, value) in [
                ("product", product),
                ("version", version),
                ("os", os),
                ("type", opinion_type),
                ("locale", locale),
                ("date_start", date_start),
                ("date_end", date_end),
            ] {
                if let Some(value) = value {
                    params.push((name, value));
                }
            }

            print_json(client.get(format!("{}/v1/search", endpoint)).query(&params)).await?;
        }

        Commands::Start => {
            print_json(client.post(format!("{}/admin/index/start", endpoint))).await?;
        }

        Commands::Stop => {
            print_json(client.post(format!("{}/admin/index/stop", endpoint))).await?;
        }

        Commands::Reindex => {
            print_json(client.post(format!("{}/admin/index/reindex", endpoint))).await?;
        }

        Commands::Stats => {
            print_json(client.get(format!("{}/admin/index/stats", endpoint))).await?;
        }

        Commands::Health => {
            print_json(client.get(format!("{}/health", endpoint))).await?;
        }
    }

    Ok(())
}
