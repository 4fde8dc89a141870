use crate::output::store::ResultStore;
use crate::output::tabular::{LeadRow, TabularStore};
use crate::output::OutputResult;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What a consolidation merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationReport {
    pub files: Vec<PathBuf>,
    pub rows_read: usize,
    pub leads_written: usize,
}

/// Merges every `.csv` sheet in `directory` into `destination`
///
/// Sheets are read in file-name order and the first occurrence of a URL
/// wins. The destination itself and hidden files are skipped.
pub fn consolidate(
    directory: &Path,
    destination: &Path,
    store: Arc<dyn TabularStore>,
) -> OutputResult<ConsolidationReport> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        let is_sheet = path.extension().map(|e| e == "csv").unwrap_or(false);
        let is_hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(true);
        if is_sheet && !is_hidden && path.as_path() != destination {
            files.push(path);
        }
    }
    files.sort();

    let mut merged = ResultStore::new(destination, Arc::clone(&store));
    let mut rows_read = 0;
    for file in &files {
        let rows = store.read_sheet(file)?;
        rows_read += rows.len();
        for lead in rows.into_iter().filter_map(LeadRow::into_lead) {
            if !merged.contains(&lead.source_url) {
                merged.append(lead);
            }
        }
        tracing::debug!("Merged {}", file.display());
    }

    merged.flush_all()?;
    tracing::info!(
        "Consolidated {} files into {} ({} leads)",
        files.len(),
        destination.display(),
        merged.len()
    );

    Ok(ConsolidationReport {
        files,
        rows_read,
        leads_written: merged.len(),
    })
}
