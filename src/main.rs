use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use greenpia::{api, db};

#[derive(Parser)]
#[command(name = "greenpia")]
#[command(about = "Condo-association administrative portal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the greenpia server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "8700")]
        port: u16,
    },
    /// Report the configured database location and whether it exists
    Status,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "greenpia=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(port: u16) -> anyhow::Result<()> {
    let db = db::Database::open_default()?;
    db.migrate()?;

    let app = api::create_router(db);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("greenpia server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve { port }) => serve(port).await?,
        Some(Commands::Status) => {
            let path = db::Database::default_path()?;
            if path.exists() {
                println!("Database: {} (present)", path.display());
            } else {
                println!("Database: {} (not yet created)", path.display());
            }
        }
        None => serve(8700).await?,
    }

    Ok(())
}
