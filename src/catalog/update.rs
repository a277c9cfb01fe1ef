use std::fs;
use std::path::Path;

use serde::Serialize;

use super::error::CatalogError;
use super::tle::{kep_check, Tle};
use super::Catalog;

/// Outcome of merging a bulk element file into the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    /// Valid element sets found in the file.
    pub read: usize,
    /// Catalog entries replaced.
    pub updated: usize,
}

/// Merges element sets from a NASA two-line file (with or without name
/// lines) into the catalog by catalog number. An entry is replaced only
/// when the new epoch is not older than the stored one; the stored name is
/// kept. The catalog's TLE file is rewritten when anything changed.
pub fn auto_update(catalog: &mut Catalog, path: &Path) -> Result<UpdateSummary, CatalogError> {
    let content = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
    let summary = merge(catalog, &content);

    log::info!(
        "{}: {} element sets read, {} satellites updated",
        path.display(),
        summary.read,
        summary.updated
    );
    if summary.updated > 0 {
        catalog.save_tles()?;
    }
    Ok(summary)
}

pub(crate) fn merge(catalog: &mut Catalog, content: &str) -> UpdateSummary {
    let lines: Vec<&str> = content.lines().map(str::trim_end).collect();
    let mut summary = UpdateSummary::default();

    let mut i = 0;
    while i + 1 < lines.len() {
        if kep_check(lines[i], lines[i + 1]).is_err() {
            i += 1;
            continue;
        }

        match Tle::parse("", lines[i], lines[i + 1]) {
            Ok(fresh) => {
                summary.read += 1;
                if catalog.replace_if_newer(fresh) {
                    summary.updated += 1;
                }
            }
            Err(e) => log::warn!("skipping element set at line {}: {}", i + 1, e),
        }
        // the line after an element set may be the next name
        i += 3;
    }
    summary
}
