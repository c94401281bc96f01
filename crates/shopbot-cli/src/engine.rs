//! Shared wiring between the config, the store registry and the scraper engine.

use std::collections::BTreeSet;

use anyhow::Context;
use shopbot_core::{AppConfig, RunResults, SiteRegistry, StoreId};
use shopbot_scraper::{
    run_all, RunSettings, SearchSettings, TracingObserver, WebDriverSessionFactory,
};

/// Loads the store table from `SHOPBOT_STORES_PATH`, or the bundled one.
pub(crate) fn load_registry(config: &AppConfig) -> anyhow::Result<SiteRegistry> {
    match &config.stores_path {
        Some(path) => shopbot_core::load_profiles(path)
            .with_context(|| format!("loading store profiles from {}", path.display())),
        None => SiteRegistry::builtin().context("loading bundled store profiles"),
    }
}

/// Maps user-supplied store names (ids or display names) to store ids.
///
/// An empty selection means every configured store.
pub(crate) fn resolve_stores(
    registry: &SiteRegistry,
    names: &[String],
) -> anyhow::Result<Vec<StoreId>> {
    if names.is_empty() {
        return Ok(registry.store_ids());
    }
    names
        .iter()
        .map(|name| {
            registry
                .resolve_name(name)
                .map(|profile| profile.store_id.clone())
                .ok_or_else(|| {
                    let known: Vec<String> =
                        registry.store_ids().iter().map(ToString::to_string).collect();
                    anyhow::anyhow!(
                        "unknown store '{name}'; configured stores: {}",
                        known.join(", ")
                    )
                })
        })
        .collect()
}

pub(crate) fn run_settings(config: &AppConfig) -> RunSettings {
    RunSettings {
        search: SearchSettings {
            wait_timeout: config.wait_timeout(),
            settle_delay: config.settle_delay(),
        },
        max_concurrent_stores: config.max_concurrent_stores,
    }
}

/// Runs `items` against `store_ids` on WebDriver sessions and logs every
/// store that produced no results.
pub(crate) async fn execute(
    config: &AppConfig,
    registry: &SiteRegistry,
    items: &[String],
    store_ids: &[StoreId],
) -> anyhow::Result<RunResults> {
    let factory = WebDriverSessionFactory::new(
        config.webdriver_url.clone(),
        config.headless,
        config.page_load_timeout(),
    );
    tracing::info!(
        items = items.len(),
        stores = store_ids.len(),
        concurrency = config.max_concurrent_stores,
        "starting shopping run"
    );

    let results = run_all(
        &factory,
        registry,
        items,
        store_ids,
        &run_settings(config),
        &TracingObserver,
    )
    .await?;

    let missing = store_ids
        .iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|id| !results.contains_key(*id))
        .count();
    if missing > 0 {
        tracing::warn!(
            missing,
            "some stores returned no results because their browser session failed"
        );
    }
    Ok(results)
}
