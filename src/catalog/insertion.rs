//! Placement of new entries by their source references
//!
//! Every gap between two adjacent active entries is scored against the
//! new entry's references. Falling between two references into the same
//! file scores above 2; sitting right after or right before a reference
//! into a shared file scores above 1. Closer line numbers score higher.

use std::collections::HashMap;
use tracing::trace;

use super::entry::Entry;

/// Synonymous names for source files, keyed by the canonical name.
pub type SourceSynonyms = HashMap<String, Vec<String>>;

type LinesByFile<'a> = HashMap<&'a str, Vec<u32>>;

fn group<'a>(entry: &'a Entry, aliases: &HashMap<&'a str, &'a str>) -> LinesByFile<'a> {
    let mut grouped: LinesByFile<'a> = HashMap::new();
    for source in entry.source_refs() {
        let Some(line) = source.line else {
            continue;
        };
        let file = aliases.get(source.file.as_str()).copied().unwrap_or(source.file.as_str());
        grouped.entry(file).or_default().push(line);
    }
    grouped
}

fn best(weights: impl Iterator<Item = f64>) -> Option<f64> {
    weights.fold(None, |acc, w| Some(acc.map_or(w, |a: f64| a.max(w))))
}

fn fits_after(new: &LinesByFile<'_>, prev: &LinesByFile<'_>) -> Option<f64> {
    best(new.iter().flat_map(move |(file, new_lines)| {
        let prev_lines = prev.get(file).map(Vec::as_slice).unwrap_or(&[]);
        new_lines.iter().flat_map(move |&n| {
            prev_lines
                .iter()
                .filter(move |&&p| p <= n)
                .map(move |&p| 1.0 + 1.0 / (f64::from(n) - f64::from(p) + 2.0))
        })
    }))
}

fn fits_before(new: &LinesByFile<'_>, cur: &LinesByFile<'_>) -> Option<f64> {
    best(new.iter().flat_map(move |(file, new_lines)| {
        let cur_lines = cur.get(file).map(Vec::as_slice).unwrap_or(&[]);
        new_lines.iter().flat_map(move |&n| {
            cur_lines
                .iter()
                .filter(move |&&c| n <= c)
                .map(move |&c| 1.0 + 1.0 / (f64::from(c) - f64::from(n) + 2.0))
        })
    }))
}

fn fits_between(
    new: &LinesByFile<'_>,
    prev: &LinesByFile<'_>,
    cur: &LinesByFile<'_>,
) -> Option<f64> {
    let mut weight: Option<f64> = None;
    for (file, new_lines) in new {
        let (Some(prev_lines), Some(cur_lines)) = (prev.get(file), cur.get(file)) else {
            continue;
        };
        for &n in new_lines {
            for &p in prev_lines {
                for &c in cur_lines {
                    if p != c && p <= n && n <= c {
                        let w = 2.0 + 1.0 / (f64::from(c) - f64::from(p) + 2.0);
                        weight = Some(weight.map_or(w, |m| m.max(w)));
                    }
                }
            }
        }
    }
    weight
}

/// Best position and weight for `new` among `entries[..boundary]`.
///
/// The fallback is `(boundary, 0.0)`. Among equal weights the first
/// candidate found wins.
pub(crate) fn pick_insertion_point(
    entries: &[Entry],
    boundary: usize,
    new: &Entry,
    synonyms: &SourceSynonyms,
) -> (usize, f64) {
    let boundary = boundary.min(entries.len());
    let mut picked = (boundary, 0.0);

    let aliases: HashMap<&str, &str> = synonyms
        .iter()
        .flat_map(|(name, others)| others.iter().map(move |o| (o.as_str(), name.as_str())))
        .collect();

    let new_lines = group(new, &aliases);
    if new_lines.is_empty() || boundary == 0 {
        return picked;
    }

    let mut consider = |pos: usize, weight: Option<f64>| {
        if let Some(weight) = weight {
            if weight > picked.1 {
                picked = (pos, weight);
            }
        }
    };

    let mut prev = group(&entries[0], &aliases);
    consider(0, fits_before(&new_lines, &prev));

    for (i, entry) in entries.iter().enumerate().take(boundary).skip(1) {
        let cur = group(entry, &aliases);
        if prev.keys().any(|file| cur.contains_key(file)) {
            consider(i, fits_between(&new_lines, &prev, &cur));
        } else {
            consider(i, fits_after(&new_lines, &prev));
            consider(i, fits_before(&new_lines, &cur));
        }
        prev = cur;
    }

    trace!("Insertion point for {}: {} (weight {:.3})", new.key(), picked.0, picked.1);
    picked
}
