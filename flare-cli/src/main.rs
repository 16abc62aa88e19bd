use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use zbus::{Connection, proxy, zvariant::Type};

/// Mirrors the daemon's `(ssssssd)` result item.
#[derive(Debug, Clone, Type, Serialize, Deserialize)]
struct ResultItem {
    kind: String,
    name: String,
    subtitle: String,
    action: String,
    icon: String,
    path: String,
    score: f64,
}

#[proxy(
    interface = "org.flare.Engine1",
    default_service = "org.flare.Engine",
    default_path = "/org/flare/Engine1"
)]
trait Engine {
    async fn search(&self, query: &str) -> zbus::Result<Vec<ResultItem>>;
    async fn open(&self, item: &ResultItem) -> zbus::Result<bool>;
    async fn reindex(&self) -> zbus::Result<bool>;
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print ranked results for a query
    Search {
        /// The search term
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Open the n-th result of a query
    Open {
        /// The search term
        #[arg(required = true)]
        query: Vec<String>,
        /// Which result to open, starting at 1
        #[arg(short, long, default_value_t = 1)]
        nth: usize,
    },
    /// Rebuild the application and file index in the background
    Reindex,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let connection = Connection::session().await?;
    let proxy = EngineProxy::new(&connection).await?;

    match args.command {
        Command::Search { query } => {
            let query = query.join(" ");
            let results = proxy.search(&query).await?;
            if results.is_empty() {
                println!("No results found for '{}'", query);
            } else {
                println!("Results for '{}':", query);
                for (i, item) in results.iter().enumerate() {
                    println!("{:>2}. [{}] {} ({:.1})", i + 1, item.kind, item.name, item.score);
                    if !item.subtitle.is_empty() {
                        println!("      {}", item.subtitle);
                    }
                }
            }
        }
        Command::Open { query, nth } => {
            let query = query.join(" ");
            let results = proxy.search(&query).await?;
            let Some(item) = nth.checked_sub(1).and_then(|i| results.get(i)) else {
                bail!("no result #{} for '{}'", nth, query);
            };
            if proxy.open(item).await? {
                println!("Opened {}", item.name);
            } else {
                bail!("could not open {}", item.name);
            }
        }
        Command::Reindex => {
            if proxy.reindex().await? {
                println!("Re-indexing started");
            } else {
                println!("Indexing already in progress");
            }
        }
    }

    Ok(())
}
