//! Line-oriented PO parser
//!
//! The scanner is a small state machine: a life context (current or
//! retired record), a field context (which field quoted strings append
//! to) and an age context (current or previous value) that resets on
//! every physical line. A record completes when the field context leaves
//! the translation field.

use tracing::debug;

use super::entry::{RawLines, SourceRef};
use super::error::{CatalogError, ParseErrorKind, Result};
use crate::escape::unescape;

/// Field values and raw lines gathered for one record.
#[derive(Debug, Default)]
pub(crate) struct Record {
    pub context: Option<String>,
    pub original: Option<String>,
    pub original_plural: Option<String>,
    pub translations: Vec<String>,
    pub manual_comments: Vec<String>,
    pub extracted_comments: Vec<String>,
    pub source_refs: Vec<SourceRef>,
    pub flags: Vec<String>,
    pub previous_context: Option<String>,
    pub previous_original: Option<String>,
    pub previous_original_plural: Option<String>,
    pub retired: bool,
    pub ref_line: Option<usize>,
    pub ref_entry: Option<usize>,
    pub raw: RawLines,
    /// First line number of the record, for diagnostics.
    first_line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Life {
    Modern,
    Retired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Context,
    Original,
    Plural,
    Translation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Age {
    Current,
    Previous,
}

/// Where the raw text of a line is cached.
#[derive(Debug, Clone, Copy)]
enum Bucket {
    None,
    Manual,
    Extracted,
    Source,
    Flags,
    Value(Field, Age),
}

/// One classified line, stripped of any tombstone or previous marker.
enum Line<'a> {
    Manual(&'a str),
    Extracted(&'a str),
    Source(&'a str),
    Flags(&'a str),
    Open { field: Field, index: usize, rest: &'a str },
    Continuation(&'a str),
    Empty,
}

struct Parser<'a> {
    file: &'a str,
    life: Life,
    field: Field,
    slot: usize,
    entries_seen: usize,
    record: Record,
    records: Vec<Record>,
}

/// Parse catalog text into raw records, in file order.
///
/// With `header_only`, scanning stops after the first complete record.
pub(crate) fn parse(file: &str, text: &str, header_only: bool) -> Result<Vec<Record>> {
    let mut parser = Parser {
        file,
        life: Life::Modern,
        field: Field::None,
        slot: 0,
        entries_seen: 0,
        record: Record::default(),
        records: Vec::new(),
    };

    for (i, raw) in text.lines().enumerate() {
        parser.feed(i + 1, raw)?;
        if header_only && !parser.records.is_empty() {
            return Ok(parser.records);
        }
    }

    parser.try_finish();
    if !parser.record.raw.all.is_empty() {
        return Err(parser.error(parser.record.first_line, ParseErrorKind::UnterminatedEntry));
    }

    debug!("Parsed {} records from {}", parser.records.len(), file);
    Ok(parser.records)
}

fn parse_quoted(text: &str) -> std::result::Result<String, ParseErrorKind> {
    if text.len() < 2 || !text.starts_with('"') || !text.ends_with('"') {
        return Err(ParseErrorKind::MalformedString);
    }
    Ok(unescape(&text[1..text.len() - 1]))
}

/// Match a field keyword at the start of `line`, returning the remainder.
fn keyword<'a>(line: &'a str, word: &str, bracket: bool) -> Option<&'a str> {
    let rest = line.strip_prefix(word)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() || c == '"' || (bracket && c == '[') => Some(rest),
        _ => None,
    }
}

fn classify(line: &str) -> std::result::Result<Line<'_>, ParseErrorKind> {
    if line.is_empty() {
        return Ok(Line::Empty);
    }
    if let Some(rest) = line.strip_prefix('#') {
        return match rest.chars().next() {
            Some('.') => Ok(Line::Extracted(rest[1..].trim_start())),
            Some(':') => Ok(Line::Source(&rest[1..])),
            Some(',') => Ok(Line::Flags(&rest[1..])),
            None => Ok(Line::Manual("")),
            Some(c) if c.is_ascii_punctuation() => Err(ParseErrorKind::UnknownComment),
            Some(_) => Ok(Line::Manual(rest.strip_prefix(' ').unwrap_or(rest))),
        };
    }
    if line.starts_with('"') {
        return Ok(Line::Continuation(line));
    }

    if let Some(rest) = keyword(line, "msgctxt", false) {
        return Ok(Line::Open { field: Field::Context, index: 0, rest: rest.trim_start() });
    }
    if let Some(rest) = keyword(line, "msgid_plural", false) {
        return Ok(Line::Open { field: Field::Plural, index: 0, rest: rest.trim_start() });
    }
    if let Some(rest) = keyword(line, "msgid", false) {
        return Ok(Line::Open { field: Field::Original, index: 0, rest: rest.trim_start() });
    }
    if let Some(rest) = keyword(line, "msgstr", true) {
        let rest = rest.trim_start();
        let Some(inner) = rest.strip_prefix('[') else {
            return Ok(Line::Open { field: Field::Translation, index: 0, rest });
        };
        let inner = inner.trim_start();
        let digits = inner.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(ParseErrorKind::MalformedPluralIndex);
        }
        let index = inner[..digits]
            .parse()
            .map_err(|_| ParseErrorKind::MalformedPluralIndex)?;
        let Some(rest) = inner[digits..].trim_start().strip_prefix(']') else {
            return Err(ParseErrorKind::MalformedPluralIndex);
        };
        return Ok(Line::Open { field: Field::Translation, index, rest: rest.trim_start() });
    }

    Err(ParseErrorKind::UnknownField)
}

impl Parser<'_> {
    fn error(&self, line: usize, kind: ParseErrorKind) -> CatalogError {
        CatalogError::Parse {
            file: self.file.to_string(),
            line,
            kind,
        }
    }

    /// Complete the current record if the translation field just ended.
    fn try_finish(&mut self) {
        if self.field == Field::Translation {
            let record = std::mem::take(&mut self.record);
            self.records.push(record);
            self.field = Field::None;
            self.life = Life::Modern;
            self.slot = 0;
        }
    }

    fn feed(&mut self, lno: usize, raw: &str) -> Result<()> {
        let mut line = raw.trim();
        if line.is_empty() {
            return Ok(());
        }

        let mut age = Age::Current;
        let mut tombstone = false;
        if let Some(rest) = line.strip_prefix("#~") {
            tombstone = true;
            if let Some(rest) = rest.strip_prefix('|') {
                age = Age::Previous;
                line = rest.trim_start();
            } else {
                line = rest.trim_start();
            }
        } else if let Some(rest) = line.strip_prefix("#|") {
            age = Age::Previous;
            line = rest.trim_start();
        }

        let classified = classify(line).map_err(|kind| self.error(lno, kind))?;

        let bucket = match classified {
            Line::Empty => Bucket::None,
            Line::Manual(text) => {
                self.try_finish();
                self.record.manual_comments.push(text.to_string());
                Bucket::Manual
            }
            Line::Extracted(text) => {
                self.try_finish();
                self.record.extracted_comments.push(text.to_string());
                Bucket::Extracted
            }
            Line::Source(text) => {
                self.try_finish();
                self.record
                    .source_refs
                    .extend(text.split_whitespace().map(SourceRef::parse));
                Bucket::Source
            }
            Line::Flags(text) => {
                self.try_finish();
                self.record.flags.extend(
                    text.split(',')
                        .map(str::trim)
                        .filter(|f| !f.is_empty())
                        .map(str::to_string),
                );
                Bucket::Flags
            }
            Line::Open { field, index, rest } => {
                self.open(lno, field, index, age, tombstone)?;
                if !rest.is_empty() {
                    self.append(lno, rest, age)?;
                }
                Bucket::Value(field, age)
            }
            Line::Continuation(text) => {
                self.append(lno, text, age)?;
                Bucket::Value(self.field, age)
            }
        };

        if tombstone {
            self.life = Life::Retired;
        }

        if self.record.raw.all.is_empty() {
            self.record.first_line = lno;
        }
        self.cache_raw(bucket, raw);
        Ok(())
    }

    fn open(&mut self, lno: usize, field: Field, index: usize, age: Age, tombstone: bool) -> Result<()> {
        match field {
            Field::Context | Field::Original => self.try_finish(),
            Field::Translation if age == Age::Previous => {
                return Err(self.error(lno, ParseErrorKind::PreviousTranslation));
            }
            _ => {}
        }
        self.field = field;

        let record = &mut self.record;
        match (field, age) {
            (Field::Context, Age::Current) => record.context = Some(String::new()),
            (Field::Context, Age::Previous) => record.previous_context = Some(String::new()),
            (Field::Original, Age::Current) => {
                record.original = Some(String::new());
                record.ref_line = Some(lno);
                record.ref_entry = Some(self.entries_seen);
                self.entries_seen += 1;
                if tombstone || self.life == Life::Retired {
                    record.retired = true;
                }
            }
            (Field::Original, Age::Previous) => record.previous_original = Some(String::new()),
            (Field::Plural, Age::Current) => record.original_plural = Some(String::new()),
            (Field::Plural, Age::Previous) => {
                record.previous_original_plural = Some(String::new())
            }
            (Field::Translation, _) => {
                if record.translations.len() <= index {
                    record.translations.resize(index + 1, String::new());
                }
                self.slot = index;
            }
            (Field::None, _) => {}
        }
        Ok(())
    }

    fn append(&mut self, lno: usize, text: &str, age: Age) -> Result<()> {
        match (self.field, age) {
            (Field::None, _) => return Err(self.error(lno, ParseErrorKind::UnexpectedContinuation)),
            (Field::Translation, Age::Previous) => {
                return Err(self.error(lno, ParseErrorKind::PreviousTranslation));
            }
            _ => {}
        }
        let value = parse_quoted(text).map_err(|kind| self.error(lno, kind))?;
        let record = &mut self.record;
        let slot = match (self.field, age) {
            (Field::None, _) | (Field::Translation, Age::Previous) => return Ok(()),
            (Field::Context, Age::Current) => &mut record.context,
            (Field::Context, Age::Previous) => &mut record.previous_context,
            (Field::Original, Age::Current) => &mut record.original,
            (Field::Original, Age::Previous) => &mut record.previous_original,
            (Field::Plural, Age::Current) => &mut record.original_plural,
            (Field::Plural, Age::Previous) => &mut record.previous_original_plural,
            (Field::Translation, Age::Current) => {
                record.translations[self.slot].push_str(&value);
                return Ok(());
            }
        };
        slot.get_or_insert_with(String::new).push_str(&value);
        Ok(())
    }

    fn cache_raw(&mut self, bucket: Bucket, raw: &str) {
        let lines = &mut self.record.raw;
        lines.all.push(raw.to_string());
        let target = match bucket {
            Bucket::None => return,
            Bucket::Manual => &mut lines.manual_comments,
            Bucket::Extracted => &mut lines.extracted_comments,
            Bucket::Source => &mut lines.source_refs,
            Bucket::Flags => &mut lines.flags,
            Bucket::Value(Field::Context, Age::Current) => &mut lines.context,
            Bucket::Value(Field::Context, Age::Previous) => &mut lines.previous_context,
            Bucket::Value(Field::Original, Age::Current) => &mut lines.original,
            Bucket::Value(Field::Original, Age::Previous) => &mut lines.previous_original,
            Bucket::Value(Field::Plural, Age::Current) => &mut lines.original_plural,
            Bucket::Value(Field::Plural, Age::Previous) => &mut lines.previous_original_plural,
            Bucket::Value(Field::Translation, _) => &mut lines.translations,
            Bucket::Value(Field::None, _) => return,
        };
        target.push(raw.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"# Translator note
#. Extracted note
#: src/a.c:10 src/b.c
#, fuzzy, c-format
#| msgid "Old %d file"
msgctxt "menu"
msgid "%d file"
msgid_plural "%d files"
msgstr[0] "%d fajl"
msgstr[1] ""
"%d fajla"

#~ msgid "Gone"
#~ msgstr "Nema"
"#;

    #[test]
    fn test_parse_fields() {
        let records = parse("sample.po", SAMPLE, false).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.manual_comments, vec!["Translator note"]);
        assert_eq!(first.extracted_comments, vec!["Extracted note"]);
        assert_eq!(
            first.source_refs,
            vec![SourceRef::new("src/a.c", 10), SourceRef::file_only("src/b.c")]
        );
        assert_eq!(first.flags, vec!["fuzzy", "c-format"]);
        assert_eq!(first.previous_original.as_deref(), Some("Old %d file"));
        assert_eq!(first.context.as_deref(), Some("menu"));
        assert_eq!(first.original.as_deref(), Some("%d file"));
        assert_eq!(first.original_plural.as_deref(), Some("%d files"));
        assert_eq!(first.translations, vec!["%d fajl", "%d fajla"]);
        assert_eq!(first.ref_line, Some(7));
        assert_eq!(first.ref_entry, Some(0));
        assert!(!first.retired);
        assert_eq!(first.raw.all.len(), 11);
        assert_eq!(first.raw.translations.len(), 3);

        let second = &records[1];
        assert!(second.retired);
        assert_eq!(second.original.as_deref(), Some("Gone"));
        assert_eq!(second.translations, vec!["Nema"]);
        assert_eq!(second.ref_entry, Some(1));
    }

    #[test]
    fn test_modern_after_retired() {
        let text = "#~ msgid \"a\"\n#~ msgstr \"b\"\nmsgid \"c\"\nmsgstr \"d\"\n";
        let records = parse("x.po", text, false).unwrap();
        assert!(records[0].retired);
        assert!(!records[1].retired);
    }

    #[test]
    fn test_malformed_plural_index() {
        let text = "msgid \"a\"\nmsgid_plural \"b\"\nmsgstr[x] \"bad\"\n";
        let err = parse("bad.po", text, false).unwrap_err();
        match err {
            CatalogError::Parse { file, line, kind } => {
                assert_eq!(file, "bad.po");
                assert_eq!(line, 3);
                assert_eq!(kind, ParseErrorKind::MalformedPluralIndex);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_kinds() {
        let kind = |text: &str| match parse("t.po", text, false) {
            Err(CatalogError::Parse { kind, .. }) => kind,
            other => panic!("expected parse error, got {other:?}"),
        };
        assert_eq!(kind("msgid \"a\"\nmsgfoo \"b\"\n"), ParseErrorKind::UnknownField);
        assert_eq!(kind("#! what\n"), ParseErrorKind::UnknownComment);
        assert_eq!(kind("\"orphan\"\n"), ParseErrorKind::UnexpectedContinuation);
        assert_eq!(kind("msgid \"a\nmsgstr \"\"\n"), ParseErrorKind::MalformedString);
        assert_eq!(kind("#| msgstr \"x\"\n"), ParseErrorKind::PreviousTranslation);
        assert_eq!(kind("msgid \"a\"\n"), ParseErrorKind::UnterminatedEntry);
    }

    #[test]
    fn test_header_only_stops_early() {
        let text = "msgid \"\"\nmsgstr \"Language: sr\\n\"\n\nmsgid \"x\"\nmsgfoo\n";
        let records = parse("h.po", text, true).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].translations, vec!["Language: sr\n"]);
    }
}
