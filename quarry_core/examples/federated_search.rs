use quarry_core::federated::{FederatedSearch, SourceSelection};
use quarry_core::settings::SettingsStore;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = SettingsStore::new_default().load()?.with_env_overrides();
    let registry = quarry_core::build_registry(&settings)?;

    println!("Enabled sources:");
    for info in registry.list_adapters() {
        println!("  - {}: {}", info.name, info.description);
    }

    let queries: Vec<String> = std::env::args().skip(1).collect();
    let queries = if queries.is_empty() {
        vec!["choline supplementation cognition".to_string()]
    } else {
        queries
    };

    let engine = FederatedSearch::new(Arc::new(registry)).with_timeout(settings.search_timeout());
    let result = engine
        .search_all_report(&queries, SourceSelection::All, 5)
        .await;

    println!(
        "\n{} studies ({} duplicates removed, {} ms)",
        result.studies.len(),
        result.duplicates_removed,
        result.duration_ms.unwrap_or_default()
    );
    for study in &result.studies {
        println!("[{}] {} ({})", study.source, study.title, study.publish_date);
    }
    for error in &result.errors {
        println!("! {} failed for '{}': {}", error.source, error.query, error.error);
    }

    Ok(())
}
