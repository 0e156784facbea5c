use anyhow::Result;
use clap::Parser;
use nendb::{Client, ClientConfig, commands};
use std::time::Duration;

/// nendb - NenDB graph database client
///
/// Runs health checks, statistics and graph algorithms against a NenDB
/// server and prints the result as JSON.
///
/// Examples:
///   nendb health
///   nendb stats
///   nendb bfs --start-node 0 --max-depth 3
///   nendb dijkstra --start-node 0 --end-node 5
///   nendb pagerank --iterations 100 --damping-factor 0.85
#[derive(Parser, Debug)]
#[command(author, version = env!("NENDB_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// NenDB server URL
    #[arg(
        long,
        short = 's',
        env = "NENDB_SERVER",
        value_name = "URL",
        default_value = nendb::config::DEFAULT_BASE_URL
    )]
    server: String,

    /// Request timeout in seconds
    #[arg(long, short = 't', env = "NENDB_TIMEOUT", value_name = "SECONDS", default_value_t = 30)]
    timeout: u64,

    /// Retries after a failed attempt
    #[arg(long, short = 'r', env = "NENDB_RETRIES", default_value_t = nendb::config::DEFAULT_RETRIES)]
    retries: u32,

    /// Pretty-print JSON output
    #[arg(long, short = 'p')]
    pretty: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Check server health
    Health,

    /// Get graph statistics
    Stats,

    /// Execute the BFS algorithm
    Bfs(BfsArgs),

    /// Execute Dijkstra's shortest path algorithm
    Dijkstra(DijkstraArgs),

    /// Execute the PageRank algorithm
    Pagerank(PageRankArgs),
}

#[derive(clap::Args, Debug)]
struct BfsArgs {
    /// Starting node ID
    #[arg(long, short = 's')]
    start_node: u64,

    /// Maximum search depth
    #[arg(long, short = 'd', default_value_t = 3)]
    max_depth: u32,

    /// JSON object of node/edge filters
    #[arg(long, short = 'f', value_name = "JSON")]
    filters: Option<String>,
}

#[derive(clap::Args, Debug)]
struct DijkstraArgs {
    /// Starting node ID
    #[arg(long, short = 's')]
    start_node: u64,

    /// Target node ID
    #[arg(long, short = 'e')]
    end_node: u64,

    /// Edge property used as weight
    #[arg(long, short = 'w', default_value = "weight")]
    weight_property: String,
}

#[derive(clap::Args, Debug)]
struct PageRankArgs {
    /// Maximum number of iterations
    #[arg(long, short = 'i', default_value_t = 100)]
    iterations: u32,

    /// Damping factor, strictly between 0 and 1
    #[arg(long, short = 'd', default_value_t = 0.85)]
    damping_factor: f64,

    /// Convergence tolerance
    #[arg(long, short = 't', default_value_t = 1e-6)]
    tolerance: f64,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.server.as_str())
            .with_timeout(Duration::from_secs(self.timeout))
            .with_retries(self.retries)
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = Client::new(cli.client_config())?;

    let value = match &cli.command {
        Commands::Health => commands::health(&client).await?,
        Commands::Stats => commands::stats(&client).await?,
        Commands::Bfs(args) => {
            commands::bfs(&client, args.start_node, args.max_depth, args.filters.as_deref()).await?
        }
        Commands::Dijkstra(args) => {
            commands::dijkstra(&client, args.start_node, args.end_node, &args.weight_property)
                .await?
        }
        Commands::Pagerank(args) => {
            commands::pagerank(&client, args.iterations, args.damping_factor, args.tolerance)
                .await?
        }
    };

    client.close();
    println!("{}", commands::render(&value, cli.pretty)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nOperation cancelled by user");
            std::process::exit(130);
        }
    }
}
