//! Header entry: catalog metadata layered over an ordinary entry

use regex::Regex;
use std::sync::LazyLock;

use super::entry::Entry;
use crate::wrap::FieldFormatter;

static COPYRIGHT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)copyright").unwrap());
static LICENSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)license").unwrap());
static AUTHOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*@.*>").unwrap());

const DEFAULT_TITLE: &str = "SOME DESCRIPTIVE TITLE.";
const DEFAULT_COPYRIGHT: &str = "Copyright (C) YEAR THE PACKAGE'S COPYRIGHT HOLDER";
const DEFAULT_LICENSE: &str = "This file is distributed under the same license as the PACKAGE package.";
const DEFAULT_AUTHOR: &str = "FIRST AUTHOR <EMAIL@ADDRESS>, YEAR.";

/// The header record of a catalog.
///
/// Manual comments are classified into title, copyright, license, author
/// and free comment lines; the first translation is split into
/// `Name: value` fields. Edits go to the structured view and are folded
/// back into the underlying entry only for the parts that changed.
#[derive(Debug, Clone)]
pub struct Header {
    entry: Entry,
    title: Vec<String>,
    copyright: Option<String>,
    license: Option<String>,
    authors: Vec<String>,
    comments: Vec<String>,
    fields: Vec<(String, String)>,
    comment_mods: u32,
    field_mods: u32,
}

impl Header {
    /// Build the structured view of a parsed header record.
    pub fn from_entry(entry: Entry) -> Self {
        let mut title = Vec::new();
        let mut copyright = None;
        let mut license = None;
        let mut authors = Vec::new();
        let mut comments = Vec::new();
        let mut in_title = true;

        for comment in entry.manual_comments() {
            if copyright.is_none() && COPYRIGHT_RE.is_match(comment) {
                copyright = Some(comment.clone());
                in_title = false;
            } else if license.is_none() && LICENSE_RE.is_match(comment) {
                license = Some(comment.clone());
                in_title = false;
            } else if AUTHOR_RE.is_match(comment) {
                authors.push(comment.clone());
                in_title = false;
            } else if in_title {
                title.push(comment.clone());
            } else {
                comments.push(comment.clone());
            }
        }

        let fields = entry
            .translation(0)
            .map(parse_fields)
            .unwrap_or_default();

        Self {
            entry,
            title,
            copyright,
            license,
            authors,
            comments,
            fields,
            comment_mods: 0,
            field_mods: 0,
        }
    }

    /// Template header for a catalog that has none yet.
    pub fn new() -> Self {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M%z").to_string();
        let fields = [
            ("Project-Id-Version", "PACKAGE VERSION"),
            ("Report-Msgid-Bugs-To", ""),
            ("POT-Creation-Date", now.as_str()),
            ("PO-Revision-Date", "YEAR-MO-DA HO:MI+ZONE"),
            ("Last-Translator", "FULL NAME <EMAIL@ADDRESS>"),
            ("Language-Team", "LANGUAGE <LL@li.org>"),
            ("MIME-Version", "1.0"),
            ("Content-Type", "text/plain; charset=CHARSET"),
            ("Content-Transfer-Encoding", "8bit"),
            ("Plural-Forms", "nplurals=INTEGER; plural=EXPRESSION;"),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

        let mut header = Self {
            entry: Entry::new(""),
            title: vec![DEFAULT_TITLE.to_string()],
            copyright: Some(DEFAULT_COPYRIGHT.to_string()),
            license: Some(DEFAULT_LICENSE.to_string()),
            authors: vec![DEFAULT_AUTHOR.to_string()],
            comments: vec![String::new()],
            fields,
            comment_mods: 0,
            field_mods: 0,
        };
        header.remake(true);
        header
    }

    /// The underlying entry, as last synchronized with the structured view.
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn title(&self) -> &[String] {
        &self.title
    }

    pub fn copyright(&self) -> Option<&str> {
        self.copyright.as_deref()
    }

    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }

    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Value of the first field with this name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All values of fields with this name; names need not be unique.
    pub fn fields_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_title(&mut self, title: Vec<String>) {
        if self.title != title {
            self.title = title;
            self.comment_mods += 1;
        }
    }

    pub fn set_copyright(&mut self, copyright: Option<String>) {
        if self.copyright != copyright {
            self.copyright = copyright;
            self.comment_mods += 1;
        }
    }

    pub fn set_license(&mut self, license: Option<String>) {
        if self.license != license {
            self.license = license;
            self.comment_mods += 1;
        }
    }

    pub fn set_comments(&mut self, comments: Vec<String>) {
        if self.comments != comments {
            self.comments = comments;
            self.comment_mods += 1;
        }
    }

    pub fn add_author(&mut self, author: impl Into<String>) {
        self.authors.push(author.into());
        self.comment_mods += 1;
    }

    /// Set a field, replacing the first same-named one or appending.
    ///
    /// Returns the position of the field.
    pub fn set_field(&mut self, name: &str, value: &str) -> usize {
        self.place_field(name, value, None)
    }

    /// Like [`set_field`](Self::set_field), but a new field goes right
    /// after `after` when that exists.
    pub fn set_field_after(&mut self, name: &str, value: &str, after: &str) -> usize {
        let pos = self.fields.iter().position(|(n, _)| n == after).map(|p| p + 1);
        self.place_field(name, value, pos)
    }

    /// Like [`set_field`](Self::set_field), but a new field goes right
    /// before `before` when that exists.
    pub fn set_field_before(&mut self, name: &str, value: &str, before: &str) -> usize {
        let pos = self.fields.iter().position(|(n, _)| n == before);
        self.place_field(name, value, pos)
    }

    fn place_field(&mut self, name: &str, value: &str, insert_at: Option<usize>) -> usize {
        if let Some(pos) = self.fields.iter().position(|(n, _)| n == name) {
            if self.fields[pos].1 != value {
                self.fields[pos].1 = value.to_string();
                self.field_mods += 1;
            }
            return pos;
        }
        let pos = insert_at.unwrap_or(self.fields.len());
        self.fields.insert(pos, (name.to_string(), value.to_string()));
        self.field_mods += 1;
        pos
    }

    /// Replace the value of the `nth` field named `name`.
    ///
    /// Returns false if there are not that many such fields.
    pub fn replace_field_value(&mut self, name: &str, value: &str, nth: usize) -> bool {
        let Some(field) = self.fields.iter_mut().filter(|(n, _)| n == name).nth(nth) else {
            return false;
        };
        if field.1 != value {
            field.1 = value.to_string();
            self.field_mods += 1;
        }
        true
    }

    /// Remove every field with this name, returning how many went.
    pub fn remove_field(&mut self, name: &str) -> usize {
        let before = self.fields.len();
        self.fields.retain(|(n, _)| n != name);
        let removed = before - self.fields.len();
        if removed > 0 {
            self.field_mods += 1;
        }
        removed
    }

    pub fn modcount(&self) -> u32 {
        self.comment_mods + self.field_mods + self.entry.modcount()
    }

    pub fn needs_write(&self) -> bool {
        self.modcount() > 0 || self.entry.needs_write()
    }

    /// Fold structured changes back into the underlying entry.
    fn remake(&mut self, force: bool) {
        if force || self.comment_mods > 0 {
            let comments = self
                .title
                .iter()
                .chain(self.copyright.iter())
                .chain(self.license.iter())
                .chain(self.authors.iter())
                .chain(self.comments.iter())
                .cloned()
                .collect();
            self.entry.set_manual_comments(comments);
        }
        if force || self.field_mods > 0 {
            let text: String = self
                .fields
                .iter()
                .map(|(name, value)| format!("{}: {}\n", name, value))
                .collect();
            self.entry.set_translations(vec![text]);
        }
        self.comment_mods = 0;
        self.field_mods = 0;
    }

    pub fn to_lines(&mut self, formatter: &dyn FieldFormatter, force: bool) -> Vec<String> {
        self.remake(force);
        self.entry.to_lines(formatter, force)
    }

    pub(crate) fn mark_uncommitted(&mut self) {
        self.entry.mark_uncommitted();
    }

    pub(crate) fn commit(&mut self) {
        self.entry.commit();
        self.comment_mods = 0;
        self.field_mods = 0;
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_fields(text: &str) -> Vec<(String, String)> {
    text.split('\n')
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| {
            let value = value.strip_prefix(' ').unwrap_or(value);
            (name.to_string(), value.to_string())
        })
        .collect()
}
