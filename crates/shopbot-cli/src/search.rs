//! `shopbot search`: run a shopping list given on the command line.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use shopbot_core::{AppConfig, FieldValue, RunResults, SiteRegistry};

use crate::engine;

pub(crate) async fn run_search(
    config: &AppConfig,
    registry: &SiteRegistry,
    items: &[String],
    items_file: Option<&Path>,
    stores: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let items = collect_items(items, items_file)?;
    if items.is_empty() {
        anyhow::bail!("no items to search for; pass --item or --items-file");
    }
    let store_ids = engine::resolve_stores(registry, stores)?;

    let results = engine::execute(config, registry, &items, &store_ids).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", render_table(registry, &results));
    }
    Ok(())
}

/// Items from `--item` flags followed by those read from `items_file`.
pub(crate) fn collect_items(
    cli_items: &[String],
    items_file: Option<&Path>,
) -> anyhow::Result<Vec<String>> {
    let mut items: Vec<String> = cli_items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    if let Some(path) = items_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading items file {}", path.display()))?;
        items.extend(parse_items(&content));
    }
    Ok(items)
}

pub(crate) fn parse_items(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Plain-text report: one block per store, one line per item.
pub(crate) fn render_table(registry: &SiteRegistry, results: &RunResults) -> String {
    let mut out = String::new();
    for (store_id, records) in results {
        let profile = registry.profile_for(store_id).ok();
        let heading = profile.map_or(store_id.as_str(), |p| p.display_name.as_str());
        let _ = writeln!(out, "{heading}");
        for record in records {
            let price = match (&record.price, profile) {
                (FieldValue::Present(value), Some(p)) => p.price_rule.render(*value),
                _ => record.price_text(),
            };
            let _ = writeln!(
                out,
                "  {:<24} {:<40} {:>10}  {}",
                record.item_query, record.product_name, price, record.source_url
            );
        }
    }
    out
}
