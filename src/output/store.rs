use crate::extract::Lead;
use crate::output::tabular::{LeadRow, TabularStore, COLUMN_WIDTHS};
use crate::output::OutputResult;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Insertion-ordered set of leads keyed by source URL, backed by one file
///
/// Every flush rewrites the whole file, so the destination always holds a
/// complete snapshot and an interrupted run can be resumed from it.
pub struct ResultStore {
    path: PathBuf,
    store: Arc<dyn TabularStore>,
    leads: Vec<Lead>,
    index: HashMap<String, usize>,
}

impl ResultStore {
    /// Empty store that will flush to `path`
    pub fn new(path: impl Into<PathBuf>, store: Arc<dyn TabularStore>) -> Self {
        Self {
            path: path.into(),
            store,
            leads: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Loads prior results from `path`; a missing file yields an empty store
    pub fn load(path: impl Into<PathBuf>, store: Arc<dyn TabularStore>) -> OutputResult<Self> {
        let mut result = Self::new(path, store);
        if !result.path.exists() {
            return Ok(result);
        }

        let rows = result.store.read_sheet(&result.path)?;
        let total = rows.len();
        for lead in rows.into_iter().filter_map(LeadRow::into_lead) {
            result.append(lead);
        }
        if result.len() < total {
            tracing::warn!(
                "Ignored {} unusable rows in {}",
                total - result.len(),
                result.path.display()
            );
        }
        Ok(result)
    }

    /// Adds a lead, replacing in place any lead with the same source URL
    ///
    /// Returns `true` when the URL was not present before.
    pub fn append(&mut self, lead: Lead) -> bool {
        match self.index.get(&lead.source_url) {
            Some(&position) => {
                self.leads[position] = lead;
                false
            }
            None => {
                self.index.insert(lead.source_url.clone(), self.leads.len());
                self.leads.push(lead);
                true
            }
        }
    }

    pub fn contains(&self, source_url: &str) -> bool {
        self.index.contains_key(source_url)
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the full snapshot to a sibling temporary file, then renames it
    /// over the destination
    pub fn flush_all(&self) -> OutputResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let rows: Vec<LeadRow> = self.leads.iter().map(LeadRow::from).collect();
        let temporary = self.temporary_path();
        self.store.write_sheet(&temporary, &rows, &COLUMN_WIDTHS)?;
        std::fs::rename(&temporary, &self.path)?;

        tracing::debug!("Flushed {} leads to {}", rows.len(), self.path.display());
        Ok(())
    }

    fn temporary_path(&self) -> PathBuf {
        let mut name = OsString::from(".");
        name.push(self.path.file_name().unwrap_or_else(|| OsStr::new("leads")));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl std::fmt::Debug for ResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStore")
            .field("path", &self.path)
            .field("leads", &self.leads.len())
            .finish_non_exhaustive()
    }
}
