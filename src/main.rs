use clap::Parser;
use dishhub::cli::{self, Cli, Command};
use dishhub::{build_app, config::Config, db, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Cli::parse();
    let config = Config::load();

    let pool = db::init_pool(&config.database_url).await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {}
        Command::Seed => {
            let inserted = cli::seed_sample_dishes(&pool).await?;
            println!("Inserted {inserted} sample dishes");
            return Ok(());
        }
        Command::Import { file } => {
            let imported = cli::import_dishes(&pool, &file).await?;
            println!("Imported {imported} dishes");
            return Ok(());
        }
    }

    if config.seed_sample_data {
        cli::seed_sample_dishes(&pool).await?;
    }
    if config.backup_key.is_none() {
        tracing::warn!("BACKUP_KEY not set, /api/admin/backup is open");
    }

    let app = build_app(AppState {
        db: Some(pool),
        backup_key: config.backup_key,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
