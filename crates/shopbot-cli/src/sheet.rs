//! `shopbot sheet`: fill a TSV shopping-list sheet in place.

use std::path::Path;

use shopbot_core::sheet::ITEM_HEADER;
use shopbot_core::{
    locate_anchors, plan_updates, AppConfig, SheetAnchors, SheetGrid, SiteRegistry, StoreId,
};

use crate::engine;

pub(crate) async fn run_sheet(
    config: &AppConfig,
    registry: &SiteRegistry,
    path: &Path,
    stores: &[String],
    stores_row: u32,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut grid = SheetGrid::load(path)?;
    let sheet_items = grid.items(ITEM_HEADER)?;
    if sheet_items.is_empty() {
        anyhow::bail!(
            "sheet {} lists no items under \"{ITEM_HEADER}\"",
            path.display()
        );
    }

    let row_index = usize::try_from(stores_row)?.saturating_sub(1);
    let anchors = locate_anchors(&grid, registry, row_index)?;
    let store_ids = select_stores(registry, &anchors, stores)?;

    let items: Vec<String> = sheet_items.iter().map(|item| item.query.clone()).collect();
    let results = engine::execute(config, registry, &items, &store_ids).await?;
    let updates = plan_updates(&results, &anchors, &sheet_items);

    if dry_run {
        for update in &updates {
            println!("R{}C{}\t{}", update.row + 1, update.col + 1, update.value);
        }
        println!("{} cells would be updated (dry run)", updates.len());
        return Ok(());
    }

    grid.apply(&updates);
    grid.save(path)?;
    tracing::info!(path = %path.display(), cells = updates.len(), "sheet updated");
    println!("updated {} cells in {}", updates.len(), path.display());
    Ok(())
}

/// Stores to run: every store with a column block, or the requested subset.
pub(crate) fn select_stores(
    registry: &SiteRegistry,
    anchors: &SheetAnchors,
    requested: &[String],
) -> anyhow::Result<Vec<StoreId>> {
    if requested.is_empty() {
        return Ok(anchors.keys().cloned().collect());
    }
    let ids = engine::resolve_stores(registry, requested)?;
    if let Some(missing) = ids.iter().find(|id| !anchors.contains_key(*id)) {
        anyhow::bail!("store '{missing}' has no column block in the sheet");
    }
    Ok(ids)
}
