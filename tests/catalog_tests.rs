//! Catalog engine tests against files on disk

use pocat::catalog::{CatalogError, ParseErrorKind};
use pocat::{Catalog, Entry, Key};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SAMPLE: &str = r##"# Serbian translation of Demo.
# Copyright (C) 2024 Demo Authors
# This file is distributed under the same license as the Demo package.
# Jane Roe <jane@example.org>, 2024.
#
msgid ""
msgstr ""
"Project-Id-Version: demo 1.0\n"
"Language: sr\n"
"MIME-Version: 1.0\n"
"Content-Type: text/plain; charset=UTF-8\n"
"Plural-Forms: nplurals=3; plural=n==1 ? 0 : n<5 ? 1 : 2;\n"

#. Main window title
#: src/main.c:10
msgid "Demo"
msgstr "Demo"

#: src/main.c:20
#, c-format
msgid "Opened %d file"
msgid_plural "Opened %d files"
msgstr[0] "Otvoren %d fajl"
msgstr[1] "Otvorena %d fajla"
msgstr[2] "Otvoreno %d fajlova"

#: src/main.c:30
#, fuzzy
#| msgid "Close window"
msgid "Close the window"
msgstr "Zatvori prozor"

#: src/main.c:40
msgctxt "menu"
msgid "Quit"
msgstr ""

#~ msgid "Obsolete"
#~ msgstr "Zastarelo"
"##;

fn write_sample(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("sr.po");
    fs::write(&path, SAMPLE).unwrap();
    path
}

fn assert_boundary(catalog: &Catalog) {
    for (i, entry) in catalog.iter().enumerate() {
        assert_eq!(
            entry.is_active(),
            i < catalog.retired_boundary(),
            "entry {} ({}) on the wrong side of the retired boundary",
            i,
            entry.original()
        );
    }
}

fn originals(catalog: &Catalog) -> Vec<String> {
    catalog.iter().map(|e| e.original().to_string()).collect()
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_unmodified_sync_does_not_write() {
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir);

    let mut catalog = Catalog::open(&path).unwrap();
    assert_eq!(catalog.len(), 5);
    assert_eq!(catalog.retired_boundary(), 4);
    assert_eq!(catalog.modcount(), 0);

    assert!(!catalog.sync(false).unwrap());
    assert_eq!(read(&path), SAMPLE);
}

#[test]
fn test_forced_sync_preserves_content() {
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir);

    let mut catalog = Catalog::open(&path).unwrap();
    let before: Vec<Entry> = catalog.iter().cloned().collect();
    let fields_before = catalog.header().fields().to_vec();

    assert!(catalog.sync(true).unwrap());
    assert_eq!(catalog.modcount(), 0);

    let reread = Catalog::open(&path).unwrap();
    let after: Vec<Entry> = reread.iter().cloned().collect();
    assert_eq!(after, before);
    assert_eq!(reread.header().fields(), fields_before.as_slice());
    assert_eq!(reread.header().authors(), &["Jane Roe <jane@example.org>, 2024."]);
}

#[test]
fn test_modification_changes_only_its_lines() {
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir);

    let mut catalog = Catalog::open(&path).unwrap();
    let key = Key::new("menu", "Quit");
    catalog.get_by_key_mut(&key).unwrap().set_translation(0, "Izađi");
    assert!(catalog.modcount() > 0);

    assert!(catalog.sync(false).unwrap());
    let expected = SAMPLE.replace(
        "msgid \"Quit\"\nmsgstr \"\"",
        "msgid \"Quit\"\nmsgstr \"Izađi\"",
    );
    assert_eq!(read(&path), expected);
    assert!(!catalog.sync(false).unwrap());
}

#[test]
fn test_colliding_adds_merge() {
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir);
    let mut catalog = Catalog::open(&path).unwrap();

    for _ in 0..3 {
        let pos = catalog
            .add(
                Entry::new("Quit").with_context("menu").with_translations(["Izađi"]),
                None,
            )
            .unwrap();
        assert_eq!(pos, 3);
    }
    catalog
        .add(Entry::new("Demo").with_translations(["Something else"]), Some(-1))
        .unwrap();

    assert_eq!(catalog.len(), 5);
    assert_eq!(
        catalog.get_by_key(&Key::new("menu", "Quit")).unwrap().translation(0),
        Some("Izađi")
    );
    assert_eq!(catalog.get(0).unwrap().translation(0), Some("Demo"));

    let active: Vec<Key> = catalog
        .iter()
        .take(catalog.retired_boundary())
        .map(Entry::key)
        .collect();
    let unique: HashSet<&Key> = active.iter().collect();
    assert_eq!(unique.len(), active.len());
}

#[test]
fn test_boundary_holds_across_operations() {
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir);
    let mut catalog = Catalog::open(&path).unwrap();

    catalog.add(Entry::new("New one"), Some(-1)).unwrap();
    assert_boundary(&catalog);
    catalog.add(Entry::new("Retired one").retired(), None).unwrap();
    assert_boundary(&catalog);
    catalog.add(Entry::new("First"), Some(0)).unwrap();
    assert_boundary(&catalog);
    catalog.remove(2).unwrap();
    assert_boundary(&catalog);
    catalog.remove(catalog.len() - 1).unwrap();
    assert_boundary(&catalog);
    catalog.remove_on_sync(0).unwrap();
    catalog.remove_on_sync(catalog.len() - 1).unwrap();

    assert!(catalog.sync(false).unwrap());
    assert_boundary(&catalog);
    assert_eq!(
        originals(&catalog),
        vec!["Demo", "Close the window", "Quit", "New one"]
    );

    let reread = Catalog::open(&path).unwrap();
    assert_eq!(originals(&reread), originals(&catalog));
    assert_eq!(reread.retired_boundary(), 4);
}

#[test]
fn test_insertion_between_references() {
    let dir = TempDir::new().unwrap();
    let mut catalog = Catalog::open_or_create(dir.path().join("x.po")).unwrap();

    catalog.add(Entry::new("A").with_source("x.c", 10), Some(-1)).unwrap();
    catalog.add(Entry::new("B").with_source("x.c", 20), Some(-1)).unwrap();

    let c = Entry::new("C").with_source("x.c", 15);
    let (pos, weight) = catalog.insertion_inquiry(&c);
    assert_eq!(pos, 1);
    assert!((weight - (2.0 + 1.0 / 12.0)).abs() < 1e-9);
    assert_eq!(catalog.len(), 2);

    assert_eq!(catalog.add(c, None).unwrap(), 1);
    assert_eq!(originals(&catalog), vec!["A", "C", "B"]);
    assert_eq!(catalog.find(&Key::new("", "B")), Some(2));
}

#[test]
fn test_negative_position_appends_before_retired() {
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir);
    let mut catalog = Catalog::open(&path).unwrap();

    for i in 0..10 {
        let boundary = catalog.retired_boundary();
        let pos = catalog.add(Entry::new(format!("tail {}", i)), Some(-1)).unwrap();
        assert_eq!(pos, boundary);
        assert_eq!(catalog.get(pos + 1).unwrap().original(), "Obsolete");
    }
    assert_boundary(&catalog);
}

#[test]
fn test_lazy_removal_keeps_positions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lazy.po");
    let mut catalog = Catalog::open_or_create(&path).unwrap();
    assert!(catalog.was_freshly_created());

    for i in 0..9 {
        catalog.add(Entry::new(format!("e{}", i)), Some(-1)).unwrap();
    }
    for i in 0..catalog.len() {
        if i % 3 == 0 {
            catalog.remove_on_sync(i).unwrap();
        }
        // Positions are stable while removals are pending.
        assert_eq!(catalog.get(i).unwrap().original(), format!("e{}", i));
    }

    assert!(catalog.sync(false).unwrap());
    assert!(!catalog.was_freshly_created());
    assert_eq!(originals(&catalog), vec!["e1", "e2", "e4", "e5", "e7", "e8"]);
    assert_eq!(catalog.retired_boundary(), 6);
    assert_eq!(catalog.find(&Key::new("", "e4")), Some(2));
    assert!(!catalog.contains(&Key::new("", "e3")));

    let reread = Catalog::open(&path).unwrap();
    assert_eq!(originals(&reread), originals(&catalog));
    assert_eq!(reread.header().field("MIME-Version"), Some("1.0"));
}

#[test]
fn test_bad_plural_index_reports_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.po");
    fs::write(
        &path,
        "msgid \"\"\nmsgstr \"\"\n\nmsgid \"a\"\nmsgid_plural \"b\"\nmsgstr[x] \"bad\"\n",
    )
    .unwrap();

    match Catalog::open(&path) {
        Err(CatalogError::Parse { line, kind, file }) => {
            assert_eq!(line, 6);
            assert_eq!(kind, ParseErrorKind::MalformedPluralIndex);
            assert!(file.ends_with("bad.po"));
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn test_retired_entry_moves_to_tail() {
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir);
    let mut catalog = Catalog::open(&path).unwrap();

    catalog.get_mut(1).unwrap().set_retired(true);
    assert!(catalog.sync(false).unwrap());

    assert_eq!(catalog.retired_boundary(), 3);
    assert_boundary(&catalog);
    assert_eq!(
        originals(&catalog),
        vec!["Demo", "Close the window", "Quit", "Opened %d file", "Obsolete"]
    );

    let text = read(&path);
    assert!(text.contains("#~ msgid \"Opened %d file\"\n#~ msgid_plural \"Opened %d files\"\n"));
    assert!(text.contains("#~ msgstr[2] \"Otvoreno %d fajlova\""));
    assert!(!text.contains("src/main.c:20"));

    let reread = Catalog::open(&path).unwrap();
    assert_eq!(reread.retired_boundary(), 3);
    assert_eq!(originals(&reread), originals(&catalog));
}

#[test]
fn test_failed_write_leaves_catalog_intact() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    let mut catalog = Catalog::open_or_create(blocker.join("sub").join("x.po")).unwrap();
    catalog.add(Entry::new("Hello"), None).unwrap();
    let modcount = catalog.modcount();

    assert!(matches!(catalog.sync(false), Err(CatalogError::Io { .. })));
    assert_eq!(catalog.modcount(), modcount);
    assert!(catalog.was_freshly_created());
    assert_eq!(catalog.find(&Key::new("", "Hello")), Some(0));
}

#[test]
fn test_read_header_only() {
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir);

    let header = Catalog::read_header(&path).unwrap();
    assert_eq!(header.field("Language"), Some("sr"));
    assert_eq!(header.title(), &["Serbian translation of Demo."]);

    assert!(matches!(
        Catalog::read_header(dir.path().join("missing.po")),
        Err(CatalogError::MissingFile(_))
    ));
}

#[test]
fn test_header_edit_is_minimal() {
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir);
    let mut catalog = Catalog::open(&path).unwrap();

    catalog.header_mut().set_field("Language", "sr@latin");
    assert!(catalog.sync(false).unwrap());

    let expected = SAMPLE.replace("\"Language: sr\\n\"", "\"Language: sr@latin\\n\"");
    assert_eq!(read(&path), expected);
}

#[test]
fn test_custom_formatter_for_changed_fields() {
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir);
    let formatter = |keyword: &str, text: &str, prefix: &str| {
        vec![format!("{}{} \"{}\"", prefix, keyword, text.to_uppercase())]
    };
    let mut catalog = Catalog::open(&path).unwrap().with_formatter(Box::new(formatter));

    catalog.get_mut(0).unwrap().set_translation(0, "Demo!");
    catalog.sync(false).unwrap();

    let text = read(&path);
    assert!(text.contains("msgid \"Demo\"\nmsgstr \"DEMO!\"\n"));
    assert!(text.contains("msgstr \"Zatvori prozor\""));
}

#[test]
fn test_copied_entry_keeps_builder_edits() {
    let dir = TempDir::new().unwrap();
    let source = Catalog::open(write_sample(&dir)).unwrap();
    let target_path = dir.path().join("copy.po");
    let mut target = Catalog::open_or_create(&target_path).unwrap();

    let copy = source
        .get(0)
        .unwrap()
        .clone()
        .with_translations(["Changed"])
        .with_manual_comment("copied");
    target.add(copy, None).unwrap();
    target
        .add(source.get(1).unwrap().clone().retired(), None)
        .unwrap();
    assert!(target.sync(false).unwrap());

    let text = read(&target_path);
    assert!(
        text.contains(
            "# copied\n#. Main window title\n#: src/main.c:10\nmsgid \"Demo\"\nmsgstr \"Changed\"\n"
        ),
        "got: {}",
        text
    );
    assert!(text.contains("#~ msgid \"Opened %d file\"\n"));
    assert!(!text.contains("src/main.c:20"));

    let reread = Catalog::open(&target_path).unwrap();
    assert_eq!(reread.get(0).unwrap().translation(0), Some("Changed"));
    assert_eq!(reread.retired_boundary(), 1);
}
