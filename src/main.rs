use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use modgate::analysis::heuristic::HeuristicEngine;
use modgate::analysis::pool::AnalysisPool;
use modgate::api;
use modgate::auth::authority::TokenAuthority;
use modgate::cli;
use modgate::config;
use modgate::pipeline::moderation::ModerationPipeline;
use modgate::pipeline::recorder::UsageRecorder;
use modgate::state::AppState;
use modgate::store::postgres::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "modgate=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::Token { command }) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            db.migrate().await?;
            handle_token_command(command, Arc::new(db)).await
        }
        None => run_server(cfg, None).await,
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: Option<u16>) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let db = PgStore::connect(&cfg.database_url).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    let store = Arc::new(db);
    let authority = TokenAuthority::new(store.clone());
    let recorder = UsageRecorder::new(store);
    let pool = AnalysisPool::new(Arc::new(HeuristicEngine::new()), cfg.analysis_workers);
    let pipeline = ModerationPipeline::new(pool, recorder, cfg.max_upload_bytes);

    let port = port.unwrap_or(cfg.port);
    let state = Arc::new(AppState {
        authority,
        pipeline,
        config: cfg,
    });
    let app = api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("modgate listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_token_command(
    cmd: cli::TokenCommands,
    store: Arc<PgStore>,
) -> anyhow::Result<()> {
    let authority = TokenAuthority::new(store);

    match cmd {
        cli::TokenCommands::Create { admin, description } => {
            let token = authority.issue(admin, description).await?;
            println!(
                "Token created:\n  Secret: {}\n  Admin:  {}\n  Use:    Authorization: Bearer {}",
                token.secret, token.is_admin, token.secret
            );
        }
        cli::TokenCommands::List => {
            let tokens = authority.list_active().await?;
            if tokens.is_empty() {
                println!("No active tokens.");
            } else {
                println!("{:<34} {:<7} {:<20} DESCRIPTION", "SECRET", "ADMIN", "CREATED");
                for t in tokens {
                    println!(
                        "{:<34} {:<7} {:<20} {}",
                        t.secret,
                        t.is_admin,
                        t.created_at.format("%Y-%m-%d %H:%M:%S"),
                        t.description.unwrap_or_default()
                    );
                }
            }
        }
        cli::TokenCommands::Revoke { secret } => {
            if authority.revoke(&secret).await? {
                println!("Token revoked.");
            } else {
                println!("Token not found or already revoked.");
            }
        }
    }
    Ok(())
}
