use budget_quest::config::{settings, storage};
use budget_quest::core::engine::Mutation;
use budget_quest::core::report::format_dashboard;
use budget_quest::errors::Result;
use budget_quest::storage::LocalStorage;
use budget_quest::store::Store;
use chrono::Utc;
use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Settings and storage
    let settings = settings::load_default_settings()
        .inspect_err(|e| error!("Critical error loading settings: {}", e))?;

    let db = storage::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to storage: {}", e))?;
    storage::create_tables(&db)
        .await
        .inspect(|()| info!("Storage initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize storage: {}", e))?;

    // 4. Boot the store from the saved snapshot or a fresh seed
    let mut store = Store::open(LocalStorage::new(db), settings).await?;

    // 5. One session: app open, weekly backup, save
    let now = Utc::now();
    if let Err(e) = store.dispatch(&Mutation::RecordAppOpen, now) {
        warn!("App open not recorded: {}", e);
    }
    if let Err(e) = store.auto_backup(now).await {
        warn!("Automatic backup failed: {}", e);
    }
    store.persist().await;

    if let Some(message) = store.take_notification() {
        info!("{}", message);
    }

    let summary = store.summary(now);
    let totals = store.totals(now);
    let quests = store.quests(now);
    println!(
        "{}",
        format_dashboard(
            store.state(),
            &summary,
            &totals,
            &quests,
            store.wall_clock(now)
        )
    );

    Ok(())
}
