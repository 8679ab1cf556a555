//! services/client/src/bin/stylesense.rs

use clap::{Parser, Subcommand};
use std::sync::Arc;
use stylesense_client::{
    adapters::{FsImageSource, HttpRemoteAdapter, JsonFileStore},
    config::Config,
    error::ClientError,
    sync::{requests, ClientState, ProgressState, UploadOrchestrator},
};
use stylesense_core::domain::ImageRef;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stylesense", about = "StyleSense wardrobe sync client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the StyleSense service is reachable.
    Health,
    /// Show the wardrobe and purchase counts for the current user.
    Status,
    /// Upload images (paths relative to MEDIA_ROOT) into the wardrobe, one at a time.
    Upload {
        #[arg(required = true)]
        images: Vec<String>,
    },
    /// Import the current user's order history.
    LoadOrders,
    /// Ask for an outfit recommendation.
    Recommend {
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        location: Option<String>,
    },
    /// Switch to another user id and fetch its status.
    SwitchUser { user_id: String },
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Using service at {}", config.api_base_url);

    // --- 2. Initialize Adapters & Shared State ---
    let http_client = reqwest::Client::builder()
        .build()
        .map_err(|e| ClientError::Internal(format!("Failed to build HTTP client: {}", e)))?;
    let remote = Arc::new(HttpRemoteAdapter::new(
        http_client,
        config.api_base_url.clone(),
    ));
    let images = Arc::new(FsImageSource::new(config.media_root.clone()));
    let store = Arc::new(JsonFileStore::new(config.identity_store_path.clone()));
    let state = ClientState::new(remote, images, store, &config).await?;

    // --- 3. Run the Command ---
    match cli.command {
        Command::Health => {
            requests::check_health(&state).await?;
            println!("ok");
        }
        Command::Status => {
            state.status.refresh().await?;
            print_status(&state).await;
        }
        Command::Upload { images } => {
            let images: Vec<ImageRef> = images.into_iter().map(ImageRef::new).collect();
            let orchestrator = Arc::new(UploadOrchestrator::new(state.clone()));
            let printer = tokio::spawn(print_progress(orchestrator.clone()));

            let cancel = CancellationToken::new();
            tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Interrupt received; finishing the current image.");
                        cancel.cancel();
                    }
                }
            });

            let result = orchestrator.run_batch_with_cancel(&images, cancel).await;
            printer.abort();
            let result = result?;
            println!(
                "Uploaded {} of {} images ({} failed)",
                result.uploaded, result.total, result.failed
            );
            print_status(&state).await;
        }
        Command::LoadOrders => {
            let result = requests::load_order_history(&state).await?;
            println!("{}", result.message);
            if result.success {
                print_status(&state).await;
            }
        }
        Command::Recommend { prompt, location } => {
            let rec = requests::request_recommendation(&state, &prompt, location.as_deref()).await?;
            println!("Style twin: {}", rec.celebrity_twin);
            println!("Weather: {}", rec.weather_info);
            if let Some(emotion) = &rec.extracted_emotion {
                println!("Mood: {}", emotion);
            }
            println!();
            println!("{}", rec.final_recommendation);
            for owned in &rec.items_owned {
                if owned.owned_item.is_empty() {
                    println!("  from your closet: {}", owned.item);
                } else {
                    println!("  from your closet: {} ({})", owned.owned_item, owned.item);
                }
            }
            for buy in &rec.items_to_buy {
                if buy.link.is_empty() {
                    println!("  to buy: {}", buy.item);
                } else {
                    println!("  to buy: {} by {} - {}", buy.suggested_product, buy.brand, buy.link);
                }
            }
        }
        Command::SwitchUser { user_id } => {
            let identity = state.switch_identity(&user_id).await?;
            println!("Switched to {}", identity);
            state.status.refresh().await?;
            print_status(&state).await;
        }
    }

    Ok(())
}

async fn print_status(state: &ClientState) {
    let identity = state.identities.current().await;
    match state.status.get().await {
        Some(status) => {
            println!("User {} (exists: {})", identity, status.exists);
            println!("  wardrobe items:   {}", status.wardrobe_items_count);
            println!("  purchase history: {}", status.purchase_history_count);
            println!("  total items:      {}", status.total_items);
            if !status.message.is_empty() {
                println!("  {}", status.message);
            }
        }
        None => match state.status.last_error().await {
            Some(error) => println!("User {}: status unavailable ({})", identity, error),
            None => println!("User {}: no status loaded", identity),
        },
    }
}

async fn print_progress(orchestrator: Arc<UploadOrchestrator>) {
    let mut watcher = orchestrator.subscribe_progress();
    while watcher.changed().await.is_ok() {
        let state = watcher.borrow_and_update().clone();
        if let ProgressState::Running(snapshot) | ProgressState::Complete(snapshot) = &state {
            println!("[{:>3}%] {}", snapshot.percent(), snapshot.status_text);
        }
    }
}
