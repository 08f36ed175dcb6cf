//! In-memory PO catalogs
//!
//! A [`Catalog`] owns the header, the ordered entries, a key index and the
//! boundary of the trailing retired region. Entries before the boundary
//! are active and unique by key; entries from the boundary on are retired.

pub mod entry;
pub mod error;
pub mod header;
mod index;
pub mod insertion;
mod parser;
pub mod plural;
mod sync;

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use entry::{Entry, EntryState, FieldCounters, Key, SourceRef};
pub use error::{CatalogError, Lookup, ParseErrorKind, Result};
pub use header::Header;
pub use insertion::SourceSynonyms;

use crate::wrap::{FieldFormatter, Wrapper};
use index::KeyIndex;

pub struct Catalog {
    path: PathBuf,
    header: Header,
    entries: Vec<Entry>,
    index: KeyIndex,
    retired_boundary: usize,
    structure_mods: u32,
    fresh: bool,
    formatter: Box<dyn FieldFormatter + Send + Sync>,
    language: Option<String>,
    accelerators: Option<BTreeSet<String>>,
    markup: Option<BTreeSet<String>>,
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("path", &self.path)
            .field("entries", &self.entries.len())
            .field("retired_boundary", &self.retired_boundary)
            .field("fresh", &self.fresh)
            .finish_non_exhaustive()
    }
}

fn is_header_record(entry: &Entry) -> bool {
    entry.original().is_empty() && entry.context().unwrap_or_default().is_empty() && entry.is_active()
}

fn retired_tail(entries: &[Entry]) -> usize {
    entries.iter().rev().take_while(|e| e.is_retired()).count()
}

impl Catalog {
    fn assemble(path: PathBuf, header: Header, entries: Vec<Entry>, fresh: bool) -> Self {
        let retired_boundary = entries.len() - retired_tail(&entries);
        let index = KeyIndex::build(&entries);
        Self {
            path,
            header,
            entries,
            index,
            retired_boundary,
            structure_mods: 0,
            fresh,
            formatter: Box::new(Wrapper::default()),
            language: None,
            accelerators: None,
            markup: None,
        }
    }

    /// An empty catalog with a template header, not yet on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::assemble(path.into(), Header::new(), Vec::new(), true)
    }

    /// Parse catalog text; `name` labels errors and becomes the path.
    pub fn from_str(name: &str, text: &str) -> Result<Self> {
        let records = parser::parse(name, text, false)?;
        let mut entries = records.into_iter().map(Entry::from_record);

        let mut body = Vec::new();
        let header = match entries.next() {
            Some(first) if is_header_record(&first) => Header::from_entry(first),
            Some(first) => {
                warn!("{} has no header entry, using a default one", name);
                body.push(first);
                Header::new()
            }
            None => Header::new(),
        };
        body.extend(entries);

        debug!("Loaded {} entries from {}", body.len(), name);
        Ok(Self::assemble(PathBuf::from(name), header, body, false))
    }

    /// Open an existing catalog file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CatalogError::MissingFile(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        Self::from_str(&path.to_string_lossy(), &text)
    }

    /// Open a catalog file, or start a fresh one if it does not exist.
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::open(path)
        } else {
            debug!("Creating new catalog {}", path.display());
            Ok(Self::new(path))
        }
    }

    /// Read only the header of a catalog file.
    pub fn read_header(path: impl AsRef<Path>) -> Result<Header> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CatalogError::MissingFile(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        let records = parser::parse(&path.to_string_lossy(), &text, true)?;
        Ok(match records.into_iter().next().map(Entry::from_record) {
            Some(first) if is_header_record(&first) => Header::from_entry(first),
            _ => Header::new(),
        })
    }

    /// Render re-formatted fields through `formatter` instead of the
    /// default wrapper.
    pub fn with_formatter(mut self, formatter: Box<dyn FieldFormatter + Send + Sync>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without extension.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn retired_boundary(&self) -> usize {
        self.retired_boundary
    }

    /// True if there was no file behind the catalog when it was created,
    /// and it has not been synced since.
    pub fn was_freshly_created(&self) -> bool {
        self.fresh
    }

    /// Sum of structural, header and per-entry modifications.
    pub fn modcount(&self) -> u32 {
        self.structure_mods
            + self.header.modcount()
            + self.entries.iter().map(Entry::modcount).sum::<u32>()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Mutable iteration. Changing an entry's key this way requires
    /// [`rebuild_index`](Self::rebuild_index) before the next key lookup.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entry> {
        self.entries.iter_mut()
    }

    pub fn get(&self, pos: usize) -> Option<&Entry> {
        self.entries.get(pos)
    }

    /// Mutable access by position; see [`iter_mut`](Self::iter_mut) about keys.
    pub fn get_mut(&mut self, pos: usize) -> Option<&mut Entry> {
        self.entries.get_mut(pos)
    }

    pub fn find(&self, key: &Key) -> Option<usize> {
        self.index.get(key)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.index.get(key).is_some()
    }

    pub fn get_by_key(&self, key: &Key) -> Option<&Entry> {
        self.find(key).map(|pos| &self.entries[pos])
    }

    pub fn get_by_key_mut(&mut self, key: &Key) -> Option<&mut Entry> {
        self.find(key).map(|pos| &mut self.entries[pos])
    }

    pub fn rebuild_index(&mut self) {
        self.index = KeyIndex::build(&self.entries);
    }

    fn resolve(&self, key: &Key) -> Result<usize> {
        self.find(key)
            .ok_or_else(|| CatalogError::NotFound(Lookup::Key(key.clone())))
    }

    /// Add an entry and return its position.
    ///
    /// An entry whose key is already present is merged into the existing
    /// one instead, unless only a retired entry holds the key and the new
    /// one is active. Retired entries always go to the end. A non-negative
    /// `position` is taken as is (capped at the retired boundary), a
    /// negative one counts back from the boundary so that `-1` appends to
    /// the active region, and `None` lets the source references decide.
    pub fn add(&mut self, mut entry: Entry, position: Option<isize>) -> Result<usize> {
        if entry.original().is_empty() {
            return Err(CatalogError::EmptyOriginal);
        }

        let key = entry.key();
        if let Some(pos) = self.index.get(&key) {
            let existing = &mut self.entries[pos];
            if existing.is_active() || entry.is_retired() {
                existing.merge(&entry);
                return Ok(pos);
            }
        }

        let at = if entry.is_retired() {
            self.entries.len()
        } else {
            match position {
                Some(pos) if pos >= 0 => (pos as usize).min(self.retired_boundary),
                Some(pos) => {
                    let at = self.retired_boundary as isize + pos + 1;
                    at.max(0) as usize
                }
                None => self.insertion_inquiry(&entry).0,
            }
        };

        self.index.shift_up(at);
        entry.mark_uncommitted();
        entry.set_pending_removal(false);
        if entry.is_active() {
            self.retired_boundary += 1;
        }
        self.entries.insert(at, entry);
        self.index.insert(key, at);
        self.structure_mods += 1;
        Ok(at)
    }

    /// Remove the entry at `pos` right away.
    pub fn remove(&mut self, pos: usize) -> Result<Entry> {
        if pos >= self.entries.len() {
            return Err(CatalogError::NotFound(Lookup::Position(pos)));
        }

        let entry = self.entries.remove(pos);
        let key = entry.key();
        if self.index.get(&key) == Some(pos) {
            self.index.remove(&key);
        }
        self.index.shift_down(pos);
        if pos < self.retired_boundary {
            self.retired_boundary -= 1;
        }

        // Another entry may share the key, e.g. a retired duplicate.
        if self.index.get(&key).is_none() {
            let survivor = self
                .entries
                .iter()
                .position(|e| e.is_active() && e.key() == key)
                .or_else(|| self.entries.iter().position(|e| e.key() == key));
            if let Some(other) = survivor {
                self.index.insert(key, other);
            }
        }

        self.structure_mods += 1;
        Ok(entry)
    }

    pub fn remove_by_key(&mut self, key: &Key) -> Result<Entry> {
        let pos = self.resolve(key)?;
        self.remove(pos)
    }

    /// Mark the entry at `pos` to be dropped on the next sync.
    ///
    /// Positions stay valid until then.
    pub fn remove_on_sync(&mut self, pos: usize) -> Result<()> {
        let entry = self
            .entries
            .get_mut(pos)
            .ok_or(CatalogError::NotFound(Lookup::Position(pos)))?;
        if !entry.is_pending_removal() {
            entry.set_pending_removal(true);
            self.structure_mods += 1;
        }
        Ok(())
    }

    pub fn remove_on_sync_by_key(&mut self, key: &Key) -> Result<()> {
        let pos = self.resolve(key)?;
        self.remove_on_sync(pos)
    }

    /// Where [`add`](Self::add) would put `entry` without a position, and
    /// how well it fits there.
    pub fn insertion_inquiry(&self, entry: &Entry) -> (usize, f64) {
        self.insertion_inquiry_with_synonyms(entry, &SourceSynonyms::new())
    }

    pub fn insertion_inquiry_with_synonyms(
        &self,
        entry: &Entry,
        synonyms: &SourceSynonyms,
    ) -> (usize, f64) {
        insertion::pick_insertion_point(&self.entries, self.retired_boundary, entry, synonyms)
    }

    /// The entry with this context and original, as a zero or one
    /// element list.
    pub fn select_by_key(&self, context: &str, original: &str) -> Vec<&Entry> {
        self.get_by_key(&Key::new(context, original))
            .into_iter()
            .collect()
    }

    /// All entries with this original text, whatever their context.
    pub fn select_by_original(&self, original: &str) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| e.original() == original)
            .collect()
    }

    /// Entries whose original text is at least `cutoff` similar to
    /// `original` (1.0 being identical), most similar first.
    pub fn select_by_original_fuzzy(&self, original: &str, cutoff: f64) -> Vec<&Entry> {
        let mut scored: Vec<(f64, &Entry)> = self
            .entries
            .iter()
            .map(|e| (strsim::normalized_levenshtein(original, e.original()), e))
            .filter(|(score, _)| *score >= cutoff)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().map(|(_, e)| e).collect()
    }

    /// Number of plural forms, 1 when the header does not say.
    pub fn nplurals(&self) -> usize {
        self.header
            .field("Plural-Forms")
            .and_then(plural::nplurals)
            .unwrap_or(1)
    }

    /// Translation slot for the number `n`, 0 when undeterminable.
    pub fn plural_index(&self, n: u64) -> usize {
        self.header
            .field("Plural-Forms")
            .and_then(plural::plural_expression)
            .map(|expr| expr.eval(n) as usize)
            .unwrap_or(0)
    }

    /// Translation slots used for exactly one number.
    pub fn plural_indices_single(&self) -> Vec<usize> {
        self.header
            .field("Plural-Forms")
            .and_then(plural::plural_expression)
            .map(|expr| plural::single_number_indices(&expr))
            .unwrap_or_default()
    }

    /// Language code, from an override or the `Language` header field.
    pub fn language(&self) -> Option<String> {
        if let Some(language) = &self.language {
            return Some(language.clone());
        }
        self.header
            .field("Language")
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
    }

    /// Override the language without touching the header; `None` goes
    /// back to reading the header.
    pub fn set_language(&mut self, language: Option<String>) {
        self.language = language;
    }

    fn header_set(&self, names: &[&str]) -> Option<BTreeSet<String>> {
        let mut found = None;
        for name in names {
            for value in self.header.fields_named(name) {
                let set = found.get_or_insert_with(BTreeSet::new);
                set.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string),
                );
            }
        }
        found
    }

    /// Accelerator markers stated in the header, `None` if undetermined.
    pub fn accelerators(&self) -> Option<BTreeSet<String>> {
        self.accelerators
            .clone()
            .or_else(|| self.header_set(&["Accelerator-Marker", "X-Accelerator-Marker"]))
    }

    pub fn set_accelerators(&mut self, accelerators: Option<BTreeSet<String>>) {
        self.accelerators = accelerators;
    }

    /// Markup types stated in the header, `None` if undetermined.
    pub fn markup(&self) -> Option<BTreeSet<String>> {
        self.markup
            .clone()
            .or_else(|| self.header_set(&["Text-Markup", "X-Text-Markup"]))
    }

    pub fn set_markup(&mut self, markup: Option<BTreeSet<String>>) {
        self.markup = markup;
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = r#"# Test catalog.
msgid ""
msgstr ""
"Project-Id-Version: test\n"
"Language: sr\n"
"Plural-Forms: nplurals=3; plural=n%10==1 && n%100!=11 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2;\n"
"X-Accelerator-Marker: &, _\n"

#: a.c:1
msgid "One"
msgstr "Jedan"

msgctxt "menu"
msgid "One"
msgstr "Jedan (meni)"

#~ msgid "Old"
#~ msgstr "Staro"
"#;

    fn catalog() -> Catalog {
        Catalog::from_str("sr.po", TEXT).unwrap()
    }

    #[test]
    fn test_load() {
        let cat = catalog();
        assert_eq!(cat.len(), 3);
        assert_eq!(cat.retired_boundary(), 2);
        assert_eq!(cat.name(), "sr");
        assert_eq!(cat.modcount(), 0);
        assert!(!cat.was_freshly_created());
        assert_eq!(cat.find(&Key::new("menu", "One")), Some(1));
        assert!(cat.contains(&Key::new("", "Old")));
    }

    #[test]
    fn test_header_queries() {
        let mut cat = catalog();
        assert_eq!(cat.nplurals(), 3);
        assert_eq!(cat.plural_index(1), 0);
        assert_eq!(cat.plural_index(3), 1);
        assert_eq!(cat.plural_index(5), 2);
        assert_eq!(cat.language().as_deref(), Some("sr"));
        let accels = cat.accelerators().unwrap();
        assert!(accels.contains("&") && accels.contains("_"));
        assert_eq!(cat.markup(), None);

        cat.set_language(Some("sr@latin".to_string()));
        assert_eq!(cat.language().as_deref(), Some("sr@latin"));
        cat.set_markup(Some(BTreeSet::new()));
        assert_eq!(cat.markup(), Some(BTreeSet::new()));
    }

    #[test]
    fn test_selection() {
        let cat = catalog();
        assert_eq!(cat.select_by_original("One").len(), 2);
        assert_eq!(cat.select_by_key("menu", "One").len(), 1);
        assert!(cat.select_by_key("", "Two").is_empty());
        let near = cat.select_by_original_fuzzy("Ona", 0.6);
        assert_eq!(near.len(), 2);
        assert_eq!(near[0].original(), "One");
    }

    #[test]
    fn test_add_merges_existing_key() {
        let mut cat = catalog();
        let pos = cat
            .add(Entry::new("One").with_translations(["Jedan!"]), None)
            .unwrap();
        assert_eq!(pos, 0);
        assert_eq!(cat.len(), 3);
        // Both translated: existing translation stays.
        assert_eq!(cat.get(0).unwrap().translation(0), Some("Jedan"));
    }

    #[test]
    fn test_add_positions() {
        let mut cat = catalog();
        assert_eq!(cat.add(Entry::new("Two"), Some(-1)).unwrap(), 2);
        assert_eq!(cat.retired_boundary(), 3);
        assert_eq!(cat.add(Entry::new("Zero"), Some(0)).unwrap(), 0);
        assert_eq!(cat.find(&Key::new("", "One")), Some(1));
        assert_eq!(cat.find(&Key::new("", "Old")), Some(4));
        assert_eq!(cat.add(Entry::new("Gone").retired(), Some(0)).unwrap(), 5);
        assert_eq!(cat.retired_boundary(), 4);
        assert!(matches!(
            cat.add(Entry::new(""), None),
            Err(CatalogError::EmptyOriginal)
        ));
    }

    #[test]
    fn test_reactivated_key_inserts_new_entry() {
        let mut cat = catalog();
        let pos = cat.add(Entry::new("Old").with_translations(["Novo"]), Some(-1)).unwrap();
        assert_eq!(pos, 2);
        assert_eq!(cat.len(), 4);
        assert_eq!(cat.find(&Key::new("", "Old")), Some(2));
    }

    #[test]
    fn test_remove() {
        let mut cat = catalog();
        let removed = cat.remove(0).unwrap();
        assert_eq!(removed.original(), "One");
        assert_eq!(cat.retired_boundary(), 1);
        assert_eq!(cat.find(&Key::new("menu", "One")), Some(0));
        assert_eq!(cat.find(&Key::new("", "Old")), Some(1));
        assert!(!cat.contains(&Key::new("", "One")));
        assert!(matches!(cat.remove(9), Err(CatalogError::NotFound(Lookup::Position(9)))));
        assert!(cat.remove_by_key(&Key::new("", "Nope")).is_err());
        assert!(cat.modcount() > 0);
    }

    #[test]
    fn test_missing_header_gets_default() {
        let cat = Catalog::from_str("x.po", "msgid \"a\"\nmsgstr \"b\"\n").unwrap();
        assert_eq!(cat.len(), 1);
        assert!(cat.header().needs_write());
        assert!(cat.modcount() > 0);
    }
}
