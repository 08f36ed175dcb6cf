//! Writing catalogs back to disk with minimal changes

use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use super::Catalog;
use super::entry::Entry;
use super::error::{CatalogError, Result};
use super::index::KeyIndex;
use crate::wrap::FieldFormatter;

/// Output order of entry positions, with misplaced entries moved across
/// the retired boundary.
///
/// Retired entries found before the boundary are pushed just behind it,
/// active entries found after it are pulled in front of it. Entries
/// pending removal keep their slot and are skipped.
fn reflow(entries: &[Entry], boundary: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..entries.len()).collect();
    let mut retired_top = boundary.min(entries.len());
    let mut i = 0;
    while i < order.len() {
        let entry = &entries[order[i]];
        if entry.is_pending_removal() {
            i += 1;
            continue;
        }
        if entry.is_retired() && i < retired_top {
            let moved = order.remove(i);
            order.insert(retired_top - 1, moved);
            retired_top -= 1;
            // Whatever slid into this slot is examined next.
            continue;
        }
        if entry.is_active() && i >= retired_top {
            let moved = order.remove(i);
            order.insert(retired_top, moved);
            retired_top += 1;
        }
        i += 1;
    }
    order
}

/// Replace `path` with `text` by renaming a finished temporary file over it.
fn write_atomic(path: &Path, text: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| CatalogError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CatalogError::io(dir, e))?;
    if let Err(e) = tmp.write_all(text.as_bytes()).and_then(|_| tmp.as_file().sync_all()) {
        return Err(CatalogError::io(tmp.path(), e));
    }
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| CatalogError::io(path, e))?;
    }
    tmp.persist(path).map_err(|e| CatalogError::io(path, e.error))?;
    Ok(())
}

fn render(
    header_lines: Vec<String>,
    entries: &mut [Entry],
    order: &[usize],
    formatter: &dyn FieldFormatter,
    force: bool,
) -> String {
    let mut lines = header_lines;
    lines.push(String::new());
    for &pos in order {
        let entry = &mut entries[pos];
        if entry.is_pending_removal() {
            continue;
        }
        lines.extend(entry.to_lines(formatter, force));
        lines.push(String::new());
    }
    if lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

impl Catalog {
    /// Write the catalog to its path if anything changed, or always with
    /// `force`, which also re-renders every field.
    ///
    /// Unchanged entries are written back from their original lines.
    /// Returns whether the file was written. On failure the catalog is
    /// left as it was.
    pub fn sync(&mut self, force: bool) -> Result<bool> {
        if !force && self.modcount() == 0 {
            debug!("{} unchanged, not writing", self.path.display());
            return Ok(false);
        }

        let order = reflow(&self.entries, self.retired_boundary);

        // The index goes stale once positions move; nothing may look keys
        // up until it is rebuilt.
        let stale_index = std::mem::take(&mut self.index);

        let formatter: &dyn FieldFormatter = &*self.formatter;
        let header_lines = self.header.to_lines(formatter, force);
        let text = render(header_lines, &mut self.entries, &order, formatter, force);

        if let Err(err) = write_atomic(&self.path, &text) {
            self.index = stale_index;
            return Err(err);
        }

        self.fresh = false;
        self.header.commit();

        let mut slots: Vec<Option<Entry>> = std::mem::take(&mut self.entries)
            .into_iter()
            .map(Some)
            .collect();
        let mut kept = Vec::with_capacity(slots.len());
        for pos in order {
            let Some(mut entry) = slots[pos].take() else {
                continue;
            };
            if entry.is_pending_removal() {
                continue;
            }
            entry.commit();
            kept.push(entry);
        }

        self.retired_boundary = kept.iter().filter(|e| e.is_active()).count();
        self.entries = kept;
        self.index = KeyIndex::build(&self.entries);
        self.structure_mods = 0;

        debug!(
            "Wrote {} ({} entries, {} active)",
            self.path.display(),
            self.entries.len(),
            self.retired_boundary
        );
        Ok(true)
    }
}
