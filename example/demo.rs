use fluent_cache::{CacheBuilder, MemoryStore, MemoryStoreConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const CACHE_DURATION_SECS: u64 = 5;
const LOAD_DELAY_MS: u64 = 100;

#[derive(Debug, Clone)]
struct Report {
    id: u32,
    body: String,
}

async fn load_report(id: u32) -> Report {
    tokio::time::sleep(Duration::from_millis(LOAD_DELAY_MS)).await;
    Report {
        id,
        body: format!("Report body for {}", id),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let store = Arc::new(MemoryStore::with_config(
        MemoryStoreConfig::new().with_default_sliding_expiration(Duration::from_secs(60)),
    ));
    let purge = store.spawn_purge_task(Duration::from_secs(1));
    let cache = CacheBuilder::new(store.clone());

    for attempt in 1..=2 {
        println!("Loading report 1 (attempt {})...", attempt);
        let report = cache
            .for_type::<Report>()
            .with_key("report:1")
            .expires_within(Duration::from_secs(CACHE_DURATION_SECS))
            .on_cache_miss(|| println!("  cache miss, building report"))
            .build_value_from_async(|| load_report(1))
            .get_from_cache_async()
            .await?;
        println!("Got: {:?}", report);
    }

    println!("Store size: {}", store.len());

    let entry = cache.for_type::<Report>().with_key("report:1");
    entry.invalidate_cache()?;
    println!("In cache after invalidation: {}", entry.is_in_cache()?);

    println!("Hashed keys:");
    for id in [10, 20, 30] {
        let report = cache
            .for_type::<Report>()
            .use_hashed_keys(true)
            .with_keys(["report:".to_string(), id.to_string()])
            .build_value_from_async(move || load_report(id))
            .get_from_cache_async()
            .await?;
        if let Some(report) = report {
            println!("  {} -> {}", report.id, report.body);
        }
    }

    println!("Store size with multiple keys: {}", store.len());

    store.clear()?;
    println!("Store size after clear: {}", store.len());

    purge.abort();
    Ok(())
}
