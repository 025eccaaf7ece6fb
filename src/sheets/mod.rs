//! Upstream spreadsheet collaborators: narrow trait seams over the Google
//! Sheets API plus the worksheet discovery fallback chain.

pub mod google;

use crate::errors::SheetAccessError;
use crate::grid::Grid;
use crate::model::SheetEntry;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinSet;

#[async_trait]
pub trait SpreadsheetReader: Send + Sync {
    /// Fetch a 2-D range of string cells from one worksheet.
    async fn get_range(&self, sheet: &str, range: &str) -> Result<Grid, SheetAccessError>;
}

#[async_trait]
pub trait SheetCatalog: Send + Sync {
    /// Enumerate worksheets from the spreadsheet metadata. Unavailable for
    /// uploaded non-native documents (`Unsupported`).
    async fn list_sheets(&self) -> Result<Vec<SheetEntry>, SheetAccessError>;
}

pub trait SheetsApi: SpreadsheetReader + SheetCatalog {}

impl<T: SpreadsheetReader + SheetCatalog + ?Sized> SheetsApi for T {}

/// Enumerate worksheets with the three-tier fallback chain: spreadsheet
/// metadata, then concurrent trial reads of a candidate-name list, then a
/// static fallback list. A failed probe means the sheet does not exist and
/// never aborts the batch.
pub async fn discover_sheets(
    api: Arc<dyn SheetsApi>,
    candidate_names: &[String],
    fallback_names: &[String],
) -> Result<Vec<SheetEntry>, SheetAccessError> {
    match api.list_sheets().await {
        Ok(sheets) => {
            let sheets: Vec<SheetEntry> = sheets
                .into_iter()
                .filter(|s| !s.title.trim().is_empty())
                .collect();
            if !sheets.is_empty() {
                return Ok(sheets);
            }
            tracing::warn!("spreadsheet metadata lists no worksheets, probing candidate names");
        }
        Err(err) if err.is_unsupported() => {
            tracing::warn!(error = %err, "sheet metadata unavailable, probing candidate names");
        }
        Err(err) => return Err(err),
    }

    let probed = probe_candidates(api, candidate_names).await;
    if !probed.is_empty() {
        tracing::info!(found = probed.len(), "worksheets discovered by probing");
        return Ok(probed);
    }

    tracing::warn!("probing found no worksheets, serving the static fallback list");
    Ok(fallback_names
        .iter()
        .filter(|title| !title.trim().is_empty())
        .enumerate()
        .map(|(index, title)| SheetEntry {
            title: title.clone(),
            sheet_id: index as i32,
        })
        .collect())
}

/// Trial single-cell reads, issued concurrently; the probes are independent
/// side-effect-free reads with no ordering dependency.
async fn probe_candidates(api: Arc<dyn SheetsApi>, names: &[String]) -> Vec<SheetEntry> {
    let mut probes = JoinSet::new();
    for (index, title) in names.iter().cloned().enumerate() {
        let api = api.clone();
        probes.spawn(async move {
            let exists = api.get_range(&title, "A1").await.is_ok();
            (index, title, exists)
        });
    }

    let mut found = Vec::new();
    while let Some(joined) = probes.join_next().await {
        match joined {
            Ok((index, title, true)) => found.push((index, title)),
            Ok((_, _, false)) => {}
            Err(err) => tracing::warn!(error = %err, "sheet probe task failed"),
        }
    }

    // Completion order is arbitrary; restore the candidate-list order.
    found.sort_by_key(|(index, _)| *index);
    found
        .into_iter()
        .map(|(index, title)| SheetEntry {
            title,
            sheet_id: index as i32,
        })
        .collect()
}
