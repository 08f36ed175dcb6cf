//! Catalog entries and their modification tracking

use indexmap::IndexSet;
use std::fmt;

use super::parser::Record;
use crate::escape::escape;
use crate::wrap::{FieldFormatter, wrap_comment, wrap_comment_unwrap};

pub const FUZZY: &str = "fuzzy";

/// Identity of an entry: context plus original text.
///
/// A missing context and an empty one are the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Key {
    pub context: String,
    pub original: String,
}

impl Key {
    pub fn new(context: impl Into<String>, original: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            original: original.into(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.is_empty() {
            write!(f, "{:?}", self.original)
        } else {
            write!(f, "{:?} (context {:?})", self.original, self.context)
        }
    }
}

/// A `file:line` source reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef {
    pub file: String,
    pub line: Option<u32>,
}

impl SourceRef {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
        }
    }

    pub fn file_only(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
        }
    }

    /// Parse one whitespace-free token from a `#:` comment.
    pub fn parse(token: &str) -> Self {
        match token.rsplit_once(':') {
            Some((file, line)) if !file.is_empty() => match line.parse() {
                Ok(line) => Self::new(file, line),
                Err(_) => Self::file_only(token),
            },
            _ => Self::file_only(token),
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.file, line),
            None => write!(f, "{}", self.file),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Translated,
    Fuzzy,
    Untranslated,
    Retired,
}

/// Shadow modification counters, one per tracked field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldCounters {
    pub manual_comments: u32,
    pub extracted_comments: u32,
    pub source_refs: u32,
    pub flags: u32,
    pub retired: u32,
    pub previous_context: u32,
    pub previous_original: u32,
    pub previous_original_plural: u32,
    pub context: u32,
    pub original: u32,
    pub original_plural: u32,
    pub translations: u32,
    /// Structural changes, such as adding or removing a translation slot.
    pub structure: u32,
}

impl FieldCounters {
    pub fn total(&self) -> u32 {
        self.manual_comments
            + self.extracted_comments
            + self.source_refs
            + self.flags
            + self.retired
            + self.previous_context
            + self.previous_original
            + self.previous_original_plural
            + self.context
            + self.original
            + self.original_plural
            + self.translations
            + self.structure
    }
}

/// Lines as they were read from (or last written to) disk.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawLines {
    pub all: Vec<String>,
    pub manual_comments: Vec<String>,
    pub extracted_comments: Vec<String>,
    pub source_refs: Vec<String>,
    pub flags: Vec<String>,
    pub previous_context: Vec<String>,
    pub previous_original: Vec<String>,
    pub previous_original_plural: Vec<String>,
    pub context: Vec<String>,
    pub original: Vec<String>,
    pub original_plural: Vec<String>,
    pub translations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Entry {
    context: Option<String>,
    original: String,
    original_plural: Option<String>,
    translations: Vec<String>,
    manual_comments: Vec<String>,
    extracted_comments: Vec<String>,
    source_refs: Vec<SourceRef>,
    flags: IndexSet<String>,
    previous_context: Option<String>,
    previous_original: Option<String>,
    previous_original_plural: Option<String>,
    retired: bool,

    counters: FieldCounters,
    committed: bool,
    pending_removal: bool,
    ref_line: Option<usize>,
    ref_entry: Option<usize>,
    raw: RawLines,
}

/// Store `value` into `slot` if it differs, bumping `counter`.
fn replace<T: PartialEq>(slot: &mut T, value: T, counter: &mut u32, committed: &mut bool) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    *counter += 1;
    *committed = false;
    true
}

impl Entry {
    /// A new, uncommitted entry with a single empty translation.
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            context: None,
            original: original.into(),
            original_plural: None,
            translations: vec![String::new()],
            manual_comments: Vec::new(),
            extracted_comments: Vec::new(),
            source_refs: Vec::new(),
            flags: IndexSet::new(),
            previous_context: None,
            previous_original: None,
            previous_original_plural: None,
            retired: false,
            counters: FieldCounters::default(),
            committed: false,
            pending_removal: false,
            ref_line: None,
            ref_entry: None,
            raw: RawLines::default(),
        }
    }

    pub(crate) fn from_record(record: Record) -> Self {
        Self {
            context: record.context,
            original: record.original.unwrap_or_default(),
            original_plural: record.original_plural,
            translations: record.translations,
            manual_comments: record.manual_comments,
            extracted_comments: record.extracted_comments,
            source_refs: record.source_refs,
            flags: record.flags.into_iter().collect(),
            previous_context: record.previous_context,
            previous_original: record.previous_original,
            previous_original_plural: record.previous_original_plural,
            retired: record.retired,
            counters: FieldCounters::default(),
            committed: true,
            pending_removal: false,
            ref_line: record.ref_line,
            ref_entry: record.ref_entry,
            raw: record.raw,
        }
    }

    /// Drop one field's cached lines along with the assembled block.
    fn invalidate(&mut self, field: impl FnOnce(&mut RawLines) -> &mut Vec<String>) {
        field(&mut self.raw).clear();
        self.raw.all.clear();
        self.committed = false;
    }

    // Builders. They do not count as modifications, but on an entry cloned
    // out of a parsed catalog they must still drop the lines they outdate.

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self.invalidate(|raw| &mut raw.context);
        self
    }

    pub fn with_plural(mut self, original_plural: impl Into<String>) -> Self {
        self.original_plural = Some(original_plural.into());
        self.invalidate(|raw| &mut raw.original_plural);
        // Singular and plural translations render differently.
        self.invalidate(|raw| &mut raw.translations);
        self
    }

    pub fn with_translations<I, S>(mut self, translations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.translations = translations.into_iter().map(Into::into).collect();
        self.invalidate(|raw| &mut raw.translations);
        self
    }

    pub fn with_source(mut self, file: impl Into<String>, line: u32) -> Self {
        self.source_refs.push(SourceRef::new(file, line));
        self.invalidate(|raw| &mut raw.source_refs);
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self.invalidate(|raw| &mut raw.flags);
        self
    }

    pub fn with_manual_comment(mut self, comment: impl Into<String>) -> Self {
        self.manual_comments.push(comment.into());
        self.invalidate(|raw| &mut raw.manual_comments);
        self
    }

    pub fn with_extracted_comment(mut self, comment: impl Into<String>) -> Self {
        self.extracted_comments.push(comment.into());
        self.invalidate(|raw| &mut raw.extracted_comments);
        self
    }

    pub fn retired(mut self) -> Self {
        self.retired = true;
        // Every line prefix changes.
        self.raw = RawLines::default();
        self.committed = false;
        self
    }

    // Read access.

    pub fn key(&self) -> Key {
        Key::new(self.context.clone().unwrap_or_default(), self.original.clone())
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn original_plural(&self) -> Option<&str> {
        self.original_plural.as_deref()
    }

    pub fn translations(&self) -> &[String] {
        &self.translations
    }

    pub fn translation(&self, index: usize) -> Option<&str> {
        self.translations.get(index).map(String::as_str)
    }

    pub fn manual_comments(&self) -> &[String] {
        &self.manual_comments
    }

    pub fn extracted_comments(&self) -> &[String] {
        &self.extracted_comments
    }

    pub fn source_refs(&self) -> &[SourceRef] {
        &self.source_refs
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn previous_context(&self) -> Option<&str> {
        self.previous_context.as_deref()
    }

    pub fn previous_original(&self) -> Option<&str> {
        self.previous_original.as_deref()
    }

    pub fn previous_original_plural(&self) -> Option<&str> {
        self.previous_original_plural.as_deref()
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub fn is_active(&self) -> bool {
        !self.retired
    }

    /// Whether the on-disk rendering is stale.
    pub fn needs_write(&self) -> bool {
        !self.committed
    }

    pub fn is_pending_removal(&self) -> bool {
        self.pending_removal
    }

    pub fn counters(&self) -> &FieldCounters {
        &self.counters
    }

    pub fn modcount(&self) -> u32 {
        self.counters.total()
    }

    /// Line of the original keyword in the file this entry was read from.
    pub fn ref_line(&self) -> Option<usize> {
        self.ref_line
    }

    /// Ordinal of this entry in the file it was read from.
    pub fn ref_entry(&self) -> Option<usize> {
        self.ref_entry
    }

    pub fn is_fuzzy(&self) -> bool {
        self.has_flag(FUZZY) && !self.retired
    }

    /// At least one non-empty translation, and neither fuzzy nor retired.
    pub fn is_translated(&self) -> bool {
        !self.is_fuzzy() && !self.retired && self.translations.iter().any(|t| !t.is_empty())
    }

    pub fn is_untranslated(&self) -> bool {
        if self.is_fuzzy() || self.retired {
            return false;
        }
        self.translations.is_empty() || self.translations.iter().any(String::is_empty)
    }

    pub fn state(&self) -> EntryState {
        if self.retired {
            EntryState::Retired
        } else if self.is_fuzzy() {
            EntryState::Fuzzy
        } else if self.is_translated() {
            EntryState::Translated
        } else {
            EntryState::Untranslated
        }
    }

    /// The first `*-format` flag, if any.
    pub fn format_flag(&self) -> Option<&str> {
        self.flags().find(|f| f.contains("-format"))
    }

    // Mutation. Every setter bumps its field counter only on actual change.

    pub fn set_context(&mut self, context: Option<String>) -> bool {
        replace(&mut self.context, context, &mut self.counters.context, &mut self.committed)
    }

    pub fn set_original(&mut self, original: impl Into<String>) -> bool {
        replace(
            &mut self.original,
            original.into(),
            &mut self.counters.original,
            &mut self.committed,
        )
    }

    pub fn set_original_plural(&mut self, original_plural: Option<String>) -> bool {
        replace(
            &mut self.original_plural,
            original_plural,
            &mut self.counters.original_plural,
            &mut self.committed,
        )
    }

    pub fn set_translations(&mut self, translations: Vec<String>) -> bool {
        if translations.len() != self.translations.len() {
            self.counters.structure += 1;
        }
        replace(
            &mut self.translations,
            translations,
            &mut self.counters.translations,
            &mut self.committed,
        )
    }

    /// Set one translation slot, growing the list with empty slots if needed.
    pub fn set_translation(&mut self, index: usize, text: impl Into<String>) -> bool {
        let text = text.into();
        if index >= self.translations.len() {
            self.translations.resize(index + 1, String::new());
            self.counters.structure += 1;
            self.counters.translations += 1;
            self.committed = false;
        }
        replace(
            &mut self.translations[index],
            text,
            &mut self.counters.translations,
            &mut self.committed,
        )
    }

    pub fn set_manual_comments(&mut self, comments: Vec<String>) -> bool {
        replace(
            &mut self.manual_comments,
            comments,
            &mut self.counters.manual_comments,
            &mut self.committed,
        )
    }

    pub fn add_manual_comment(&mut self, comment: impl Into<String>) {
        self.manual_comments.push(comment.into());
        self.counters.manual_comments += 1;
        self.committed = false;
    }

    pub fn set_extracted_comments(&mut self, comments: Vec<String>) -> bool {
        replace(
            &mut self.extracted_comments,
            comments,
            &mut self.counters.extracted_comments,
            &mut self.committed,
        )
    }

    pub fn add_extracted_comment(&mut self, comment: impl Into<String>) {
        self.extracted_comments.push(comment.into());
        self.counters.extracted_comments += 1;
        self.committed = false;
    }

    pub fn set_source_refs(&mut self, refs: Vec<SourceRef>) -> bool {
        replace(
            &mut self.source_refs,
            refs,
            &mut self.counters.source_refs,
            &mut self.committed,
        )
    }

    pub fn add_source_ref(&mut self, source: SourceRef) {
        self.source_refs.push(source);
        self.counters.source_refs += 1;
        self.committed = false;
    }

    pub fn add_flag(&mut self, flag: impl Into<String>) -> bool {
        let added = self.flags.insert(flag.into());
        if added {
            self.counters.flags += 1;
            self.committed = false;
        }
        added
    }

    pub fn remove_flag(&mut self, flag: &str) -> bool {
        let removed = self.flags.shift_remove(flag);
        if removed {
            self.counters.flags += 1;
            self.committed = false;
        }
        removed
    }

    pub fn set_previous_context(&mut self, context: Option<String>) -> bool {
        replace(
            &mut self.previous_context,
            context,
            &mut self.counters.previous_context,
            &mut self.committed,
        )
    }

    pub fn set_previous_original(&mut self, original: Option<String>) -> bool {
        replace(
            &mut self.previous_original,
            original,
            &mut self.counters.previous_original,
            &mut self.committed,
        )
    }

    pub fn set_previous_original_plural(&mut self, original_plural: Option<String>) -> bool {
        replace(
            &mut self.previous_original_plural,
            original_plural,
            &mut self.counters.previous_original_plural,
            &mut self.committed,
        )
    }

    pub fn set_retired(&mut self, retired: bool) -> bool {
        replace(&mut self.retired, retired, &mut self.counters.retired, &mut self.committed)
    }

    /// Set or clear fuzziness. Clearing also drops the previous values.
    pub fn set_fuzzy(&mut self, fuzzy: bool) -> bool {
        if fuzzy == self.is_fuzzy() {
            return false;
        }
        if fuzzy {
            self.add_flag(FUZZY)
        } else {
            self.set_previous_context(None);
            self.set_previous_original(None);
            self.set_previous_original_plural(None);
            self.remove_flag(FUZZY)
        }
    }

    fn take_previous_from(&mut self, other: &Entry) {
        self.set_previous_context(other.previous_context.clone());
        self.set_previous_original(other.previous_original.clone());
        self.set_previous_original_plural(other.previous_original_plural.clone());
    }

    /// Fold a newer entry with the same key into this one.
    ///
    /// Translations and translator comments flow from `other` depending on
    /// the translation state of both sides; source references, extracted
    /// comments and flags other than fuzzy stay as they are. Retired entries
    /// never merge. Returns whether anything changed; the entry is marked
    /// for re-rendering either way.
    pub fn merge(&mut self, other: &Entry) -> bool {
        debug_assert_eq!(self.key(), other.key());
        self.committed = false;
        if self.retired || other.retired {
            return false;
        }

        let before = self.modcount();

        if self.original_plural.is_none() && other.original_plural.is_some() {
            if !other.manual_comments.is_empty() {
                self.set_manual_comments(other.manual_comments.clone());
            }
            if other.is_fuzzy() {
                self.take_previous_from(other);
            }
            self.set_original_plural(other.original_plural.clone());
            self.set_translations(other.translations.clone());
            self.set_fuzzy(other.is_fuzzy());
        } else if (self.is_translated() && other.is_translated())
            || (self.is_fuzzy() && other.is_fuzzy())
            || (self.is_untranslated() && other.is_untranslated())
        {
            if self.manual_comments.is_empty() {
                self.set_manual_comments(other.manual_comments.clone());
            }
            if other.original_plural.is_some() {
                self.set_original_plural(other.original_plural.clone());
            }
        } else if self.is_fuzzy() && other.is_translated() {
            self.set_manual_comments(other.manual_comments.clone());
            if self.original_plural.is_none() || other.original_plural.is_some() {
                if other.original_plural.is_some() {
                    self.set_original_plural(other.original_plural.clone());
                }
                self.set_translations(other.translations.clone());
                if self.original_plural == other.original_plural {
                    self.set_fuzzy(false);
                }
            }
        } else if self.is_untranslated() && (other.is_translated() || other.is_fuzzy()) {
            self.set_manual_comments(other.manual_comments.clone());
            if self.original_plural.is_none() || other.original_plural.is_some() {
                if other.is_fuzzy() {
                    self.take_previous_from(other);
                }
                if other.original_plural.is_some() {
                    self.set_original_plural(other.original_plural.clone());
                }
                self.set_translations(other.translations.clone());
                self.set_fuzzy(other.is_fuzzy());
            }
        }

        self.modcount() > before
    }

    pub(crate) fn set_pending_removal(&mut self, pending: bool) {
        self.pending_removal = pending;
    }

    pub(crate) fn mark_uncommitted(&mut self) {
        self.committed = false;
    }

    /// Record that the on-disk form now matches this entry.
    pub(crate) fn commit(&mut self) {
        self.committed = true;
        self.counters = FieldCounters::default();
    }

    /// Render the entry, reusing the cached lines of every unchanged field.
    ///
    /// With `force` every field goes through the formatter again.
    pub fn to_lines(&mut self, formatter: &dyn FieldFormatter, force: bool) -> Vec<String> {
        if !force && self.committed && self.counters.total() == 0 && !self.raw.all.is_empty() {
            return self.raw.all.clone();
        }

        // A retirement change alters every line prefix.
        let all = force || self.counters.retired > 0;
        let stale = |counter: u32, cached: &[String]| all || counter > 0 || cached.is_empty();
        let (current, previous) = if self.retired { ("#~ ", "#~| ") } else { ("", "#| ") };
        let field = |keyword: &str, text: &Option<String>, prefix: &str| match text {
            Some(text) => formatter.format_field(keyword, &escape(text), prefix),
            None => Vec::new(),
        };

        let c = self.counters;
        let raw = &mut self.raw;

        if stale(c.manual_comments, &raw.manual_comments) {
            raw.manual_comments = self
                .manual_comments
                .iter()
                .flat_map(|comment| wrap_comment_unwrap("", comment))
                .collect();
        }
        if stale(c.extracted_comments, &raw.extracted_comments) {
            raw.extracted_comments = self
                .extracted_comments
                .iter()
                .flat_map(|comment| wrap_comment_unwrap(".", comment))
                .collect();
        }
        if stale(c.source_refs, &raw.source_refs) {
            raw.source_refs = if self.source_refs.is_empty() {
                Vec::new()
            } else {
                let refs: Vec<String> = self.source_refs.iter().map(ToString::to_string).collect();
                wrap_comment(":", &refs.join(" "))
            };
        }
        if stale(c.flags, &raw.flags) {
            // Fuzzy goes first.
            let mut flags: Vec<&str> = self.flags.iter().map(String::as_str).filter(|f| *f != FUZZY).collect();
            if self.flags.contains(FUZZY) {
                flags.insert(0, FUZZY);
            }
            raw.flags = if flags.is_empty() {
                Vec::new()
            } else {
                wrap_comment(",", &flags.join(", "))
            };
        }
        if stale(c.previous_context, &raw.previous_context) {
            raw.previous_context = field("msgctxt", &self.previous_context, previous);
        }
        if stale(c.previous_original, &raw.previous_original) {
            raw.previous_original = field("msgid", &self.previous_original, previous);
        }
        if stale(c.previous_original_plural, &raw.previous_original_plural) {
            raw.previous_original_plural =
                field("msgid_plural", &self.previous_original_plural, previous);
        }
        if stale(c.context, &raw.context) {
            raw.context = field("msgctxt", &self.context, current);
        }
        if stale(c.original, &raw.original) {
            raw.original = formatter.format_field("msgid", &escape(&self.original), current);
        }
        if stale(c.original_plural, &raw.original_plural) {
            raw.original_plural = field("msgid_plural", &self.original_plural, current);
        }
        if stale(c.translations + c.structure, &raw.translations) {
            raw.translations = if self.original_plural.is_none() && self.translations.len() <= 1 {
                let text = self.translations.first().map(String::as_str).unwrap_or("");
                formatter.format_field("msgstr", &escape(text), current)
            } else {
                self.translations
                    .iter()
                    .enumerate()
                    .flat_map(|(i, text)| {
                        formatter.format_field(&format!("msgstr[{}]", i), &escape(text), current)
                    })
                    .collect()
            };
        }

        let mut lines = Vec::new();
        lines.extend_from_slice(&raw.manual_comments);
        lines.extend_from_slice(&raw.extracted_comments);
        if !self.retired {
            lines.extend_from_slice(&raw.source_refs);
        }
        lines.extend_from_slice(&raw.flags);
        lines.extend_from_slice(&raw.previous_context);
        lines.extend_from_slice(&raw.previous_original);
        lines.extend_from_slice(&raw.previous_original_plural);
        lines.extend_from_slice(&raw.context);
        lines.extend_from_slice(&raw.original);
        lines.extend_from_slice(&raw.original_plural);
        lines.extend_from_slice(&raw.translations);
        raw.all = lines.clone();
        lines
    }

    /// Render as a single string, one line per row.
    pub fn to_string_with(&mut self, formatter: &dyn FieldFormatter, force: bool) -> String {
        let mut out = self.to_lines(formatter, force).join("\n");
        out.push('\n');
        out
    }
}

/// Content equality; tracking state and cached lines are ignored.
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.context == other.context
            && self.original == other.original
            && self.original_plural == other.original_plural
            && self.translations == other.translations
            && self.manual_comments == other.manual_comments
            && self.extracted_comments == other.extracted_comments
            && self.source_refs == other.source_refs
            && self.flags == other.flags
            && self.previous_context == other.previous_context
            && self.previous_original == other.previous_original
            && self.previous_original_plural == other.previous_original_plural
            && self.retired == other.retired
    }
}
