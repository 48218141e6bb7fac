mod config;
mod error;
mod output;
mod server;
mod supabase;

use clap::Parser;
use leaderboard_core::Partition;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{ConnectionOverrides, DEFAULT_BIND, DEFAULT_PORT, LeaderboardConfig};
use crate::supabase::SupabaseClient;

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "leaderboard", version, about = "Student point leaderboard backed by Supabase")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Serve the rankings API for the leaderboard display
    Serve(ServeArgs),
    /// Fetch and rank once, then print the leaderboard
    Rank(RankArgs),
    /// Create a default config file at ~/.config/student-leaderboard/config.toml
    Init,
}

#[derive(clap::Args)]
struct ConnectionArgs {
    /// Supabase project URL (also reads SUPABASE_URL env var)
    #[arg(long)]
    supabase_url: Option<String>,

    /// Supabase anon key (also reads SUPABASE_ANON_KEY env var)
    #[arg(long)]
    anon_key: Option<String>,

    /// Path to config file (default: ~/.config/student-leaderboard/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Max retries per Supabase request. Default: 2. Set to 0 to disable.
    #[arg(long)]
    retries: Option<usize>,

    /// Per-request timeout in seconds. Default: 10.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::Args)]
struct ServeArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Port to listen on. Default: 3000.
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind. Default: 0.0.0.0.
    #[arg(long)]
    bind: Option<String>,
}

#[derive(clap::Args)]
struct RankArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Output JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Only show one partition: "male" or "female"
    #[arg(long)]
    partition: Option<String>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn parse_partition(value: Option<&str>) -> Vec<Partition> {
    match value {
        None => Partition::ORDER.to_vec(),
        Some("male") => vec![Partition::Male],
        Some("female") => vec![Partition::Female],
        Some(other) => bail(format!("Unknown partition \"{other}\". Use \"male\" or \"female\".")),
    }
}

/// Load config file, merge with CLI args and env (CLI wins), build the client.
fn connect(args: &ConnectionArgs) -> (SupabaseClient, LeaderboardConfig) {
    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);

    let overrides = ConnectionOverrides {
        supabase_url: args.supabase_url.clone(),
        anon_key: args.anon_key.clone(),
        retries: args.retries,
        timeout_secs: args.timeout_secs,
        env_url: std::env::var("SUPABASE_URL").ok(),
        env_anon_key: std::env::var("SUPABASE_ANON_KEY").ok(),
    };
    let supabase = config::resolve_supabase(overrides, &cfg, &config_path).unwrap_or_else(|e| bail(e));
    let client = SupabaseClient::new(supabase)
        .unwrap_or_else(|e| bail(format!("Failed to build HTTP client: {e}")));

    (client, cfg)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Rank(args) => run_rank(args).await,
        Commands::Init => {
            let path = config::create_default_config();
            println!("Created config at {}", path.display());
            println!("Edit it to set your Supabase URL, port, etc.");
        }
    }
}

async fn run_serve(args: ServeArgs) {
    init_logging(args.connection.verbose);
    let (client, cfg) = connect(&args.connection);

    let port = args.port.or(cfg.port).unwrap_or(DEFAULT_PORT);
    let bind = args.bind.or(cfg.bind).unwrap_or_else(|| DEFAULT_BIND.to_string());
    let address = format!("{bind}:{port}");

    info!(
        "Serving rankings from {} (retries: {}, timeout: {:?})",
        client.config().url,
        client.config().retries,
        client.config().timeout,
    );

    if let Err(e) = server::serve(Arc::new(client), &address).await {
        bail(format!("Server failed on {address}: {e}"));
    }
}

async fn run_rank(args: RankArgs) {
    init_logging(args.connection.verbose);
    let partitions = parse_partition(args.partition.as_deref());
    let (client, _) = connect(&args.connection);

    let rankings = server::load_rankings(&client).await.unwrap_or_else(|e| bail(e));

    if args.json {
        let shown: Vec<_> = rankings
            .into_iter()
            .filter(|e| partitions.contains(&e.partition()))
            .collect();
        let json = output::to_json(&shown).unwrap_or_else(|e| bail(format!("Failed to render JSON: {e}")));
        println!("{json}");
    } else {
        output::print_table(&rankings, &partitions);
    }
}
