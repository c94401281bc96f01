//! Spreadsheet publisher over a local tab-separated grid.
//!
//! Layout matches the shared shopping-list sheet: an `Item` column listing the
//! shopping list, a row of store-name headers, and under each store a
//! `Product Name | Price | URL` column block. A result is written on the
//! same row offset as its item, so blank rows in the `Item` column stay blank
//! in every block.
//!
//! Files are read and written with the `csv` crate in tab-delimited mode, so
//! quoted cells holding tabs or line breaks survive a round trip.

use std::collections::BTreeMap;
use std::path::Path;

use crate::profiles::{SiteRegistry, StoreId};
use crate::records::RunResults;
use crate::ConfigError;

pub const ITEM_HEADER: &str = "Item";
pub const PRODUCT_NAME_HEADER: &str = "Product Name";

/// First data cell `(row, col)` of each store's column block, zero-based.
pub type SheetAnchors = BTreeMap<StoreId, (usize, usize)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub row: usize,
    pub col: usize,
    pub value: String,
}

/// One shopping-list entry read from the `Item` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetItem {
    pub query: String,
    /// Rows below the first data row under the `Item` header.
    pub offset: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetGrid {
    rows: Vec<Vec<String>>,
}

impl SheetGrid {
    /// Parses tab-separated text, keeping blank lines as empty rows.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SheetFormat`] on malformed quoting or non-UTF-8 cells.
    pub fn parse_tsv(content: &str) -> Result<Self, ConfigError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut next_line: u64 = 1;
        for result in reader.records() {
            let record = result?;
            // The reader skips blank lines; pad them back in so row numbers
            // keep matching the file.
            if let Some(pos) = record.position() {
                while next_line < pos.line() {
                    rows.push(Vec::new());
                    next_line += 1;
                }
            }
            let embedded_breaks: usize = record.iter().map(|f| f.matches('\n').count()).sum();
            next_line += 1 + u64::try_from(embedded_breaks).unwrap_or(0);
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { rows })
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::SheetIo`] if the file cannot be read, or
    /// [`ConfigError::SheetFormat`] if it is not valid TSV.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SheetIo {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse_tsv(&content)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::SheetIo`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_tsv()?;
        std::fs::write(path, content).map_err(|e| ConfigError::SheetIo {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Renders the grid as TSV, quoting cells that contain tabs, quotes or
    /// line breaks.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SheetFormat`] if the writer fails.
    pub fn to_tsv(&self) -> Result<String, ConfigError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_writer(Vec::new());
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(String::from_utf8_lossy(writer.get_ref()).into_owned())
    }

    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    fn find(&self, text: &str) -> Option<(usize, usize)> {
        self.rows.iter().enumerate().find_map(|(r, row)| {
            row.iter()
                .position(|cell| cell.trim().eq_ignore_ascii_case(text))
                .map(|c| (r, c))
        })
    }

    /// Non-empty cells below the `header` cell, in order, with their row offsets.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SheetLayout`] if no cell holds `header`.
    pub fn items(&self, header: &str) -> Result<Vec<SheetItem>, ConfigError> {
        let (row, col) = self
            .find(header)
            .ok_or_else(|| ConfigError::SheetLayout(format!("no \"{header}\" header cell")))?;
        Ok(self.rows[row + 1..]
            .iter()
            .enumerate()
            .filter_map(|(offset, r)| {
                let cell = r.get(col)?.trim();
                (!cell.is_empty()).then(|| SheetItem {
                    query: cell.to_string(),
                    offset,
                })
            })
            .collect())
    }

    /// Writes every update, growing the grid where a cell does not exist yet.
    pub fn apply(&mut self, updates: &[CellUpdate]) {
        for update in updates {
            if self.rows.len() <= update.row {
                self.rows.resize_with(update.row + 1, Vec::new);
            }
            let row = &mut self.rows[update.row];
            if row.len() <= update.col {
                row.resize(update.col + 1, String::new());
            }
            row[update.col].clone_from(&update.value);
        }
    }
}

/// Resolves each store's column block from the header cells.
///
/// Store names are read from `stores_row`; a store's block starts at the
/// first `Product Name` header below its name in the same column, and its
/// anchor is the row under that header. Unrecognised store names and stores
/// without a `Product Name` header are skipped with a warning.
///
/// # Errors
///
/// Returns [`ConfigError::SheetLayout`] if `stores_row` does not exist or no
/// store block could be located.
pub fn locate_anchors(
    grid: &SheetGrid,
    registry: &SiteRegistry,
    stores_row: usize,
) -> Result<SheetAnchors, ConfigError> {
    let header_row = grid.rows.get(stores_row).ok_or_else(|| {
        ConfigError::SheetLayout(format!("sheet has no row {}", stores_row + 1))
    })?;

    let mut anchors = SheetAnchors::new();
    for (col, name) in header_row.iter().enumerate() {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let Some(profile) = registry.resolve_name(name) else {
            tracing::warn!(header = name, "sheet header does not name a configured store");
            continue;
        };
        let block_row = (stores_row + 1..grid.rows.len()).find(|&r| {
            grid.cell(r, col)
                .is_some_and(|c| c.trim().eq_ignore_ascii_case(PRODUCT_NAME_HEADER))
        });
        match block_row {
            Some(r) => {
                anchors.insert(profile.store_id.clone(), (r + 1, col));
            }
            None => tracing::warn!(
                store = %profile.store_id,
                "no \"{PRODUCT_NAME_HEADER}\" header under store column"
            ),
        }
    }

    if anchors.is_empty() {
        return Err(ConfigError::SheetLayout(format!(
            "no store column blocks found from row {}",
            stores_row + 1
        )));
    }
    Ok(anchors)
}

/// Cell writes for every record: name, price and URL side by side.
///
/// Record `i` of a store lands on the row of `items[i]` within that store's
/// block. Records beyond the end of `items` follow on consecutive rows.
#[must_use]
pub fn plan_updates(
    results: &RunResults,
    anchors: &SheetAnchors,
    items: &[SheetItem],
) -> Vec<CellUpdate> {
    let mut updates = Vec::new();
    for (store_id, records) in results {
        let Some(&(row, col)) = anchors.get(store_id) else {
            tracing::warn!(store = %store_id, "store has no column block in the sheet; skipping");
            continue;
        };
        for (i, record) in records.iter().enumerate() {
            let r = row + items.get(i).map_or(i, |item| item.offset);
            updates.push(CellUpdate {
                row: r,
                col,
                value: record.product_name.to_string(),
            });
            updates.push(CellUpdate {
                row: r,
                col: col + 1,
                value: record.price_text(),
            });
            updates.push(CellUpdate {
                row: r,
                col: col + 2,
                value: record.source_url.clone(),
            });
        }
    }
    updates
}
