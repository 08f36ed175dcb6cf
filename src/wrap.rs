//! Text wrapping for PO fields and comments
//!
//! Gettext wraps with an intricate Unicode line-breaking algorithm of its
//! own. This module does something simpler that lands close to it for
//! typical catalog text: break on spaces and punctuation, always break
//! after an embedded `\n`, and never leave a dangling backslash.

use regex::Regex;
use std::sync::LazyLock;
use unicode_width::UnicodeWidthChar;

/// Renders one field into its on-disk quoted lines.
///
/// `text` arrives already escaped; `prefix` is the line prefix for previous
/// values (`#| `) and retired entries (`#~ `). Lines carry no terminator.
pub trait FieldFormatter {
    fn format_field(&self, keyword: &str, text: &str, prefix: &str) -> Vec<String>;
}

impl<F> FieldFormatter for F
where
    F: Fn(&str, &str, &str) -> Vec<String>,
{
    fn format_field(&self, keyword: &str, text: &str, prefix: &str) -> Vec<String> {
        self(keyword, text, prefix)
    }
}

/// Characters after which a line may naturally break.
const NATURAL_BREAKS: &str = ".,;/%-)]}";

/// Transcript fence, broken both before and after.
const FENCE: &str = "|/|";

const TAG_BREAKS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "table", "th", "td", "tr",
    "center", "blockquote", "pre", "dd", "dl", "dt", "title", "subtitle", "para", "list", "item",
];

const TAG_BREAKS_INPLACE: &[&str] = &["br", "hr", "nl"];

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<\s*(/?)\s*(\w+)[^/>]*(/?)\s*>\s*$").unwrap());

/// Knobs for [`wrap_text`].
#[derive(Debug, Clone)]
pub struct WrapOptions<'a> {
    /// Column to wrap at; 0 splits only at unconditional breaks.
    pub width: usize,
    pub lead: &'a str,
    /// Lead for the first line, `lead` when unset.
    pub first_lead: Option<&'a str>,
    pub trail: &'a str,
    /// Leave the first line empty when the whole text does not fit on it.
    pub first_empty: bool,
    pub natural_breaks: &'a str,
    pub break_before: &'a [&'a str],
    /// Sequences to break after, unless the text also ends with the
    /// paired exception.
    pub break_after: &'a [(&'a str, Option<&'a str>)],
    /// Block tags: break before opening and after closing.
    pub tag_breaks: &'a [&'a str],
    /// Tags to always break after.
    pub tag_breaks_always: &'a [&'a str],
    /// Natural breaks are not taken before this column.
    pub min_natural_col: usize,
    /// Break in the middle of a word when nothing better is available.
    pub mid_word: bool,
    /// Remove trailing whitespace even when it belongs to the lead.
    pub strip_trailing: bool,
}

impl Default for WrapOptions<'_> {
    fn default() -> Self {
        Self {
            width: 80,
            lead: "",
            first_lead: None,
            trail: "",
            first_empty: false,
            natural_breaks: "",
            break_before: &[],
            break_after: &[],
            tag_breaks: &[],
            tag_breaks_always: &[],
            min_natural_col: 0,
            mid_word: true,
            strip_trailing: false,
        }
    }
}

#[derive(PartialEq)]
enum TagState {
    Open,
    Close,
    Inplace,
}

fn split_tag(tag: &str) -> Option<(String, TagState)> {
    let caps = TAG_RE.captures(tag)?;
    let state = if !caps[1].is_empty() {
        TagState::Close
    } else if !caps[3].is_empty() {
        TagState::Inplace
    } else {
        TagState::Open
    };
    Some((caps[2].to_string(), state))
}

fn ends_with(text: &[char], pat: &[char]) -> bool {
    text.len() >= pat.len() && text[text.len() - pat.len()..] == *pat
}

fn starts_with(text: &[char], pat: &[char]) -> bool {
    text.len() >= pat.len() && text[..pat.len()] == *pat
}

/// Length of a shell color escape at the start of `text`, if any.
fn color_escape_len(text: &[char]) -> Option<usize> {
    if !starts_with(text, &['\u{1b}', '[']) {
        return None;
    }
    let mut i = 2;
    let mut digits = 0;
    while i < text.len() && (text[i].is_ascii_digit() || (text[i] == ';' && digits > 0)) {
        digits += 1;
        i += 1;
    }
    (digits > 0 && i < text.len() && text[i] == 'm').then_some(i + 1)
}

fn char_width(c: char) -> usize {
    match c.width() {
        Some(2) => 2,
        _ => 1,
    }
}

/// Wrap text into lines according to `opts`.
pub fn wrap_text(text: &str, opts: &WrapOptions<'_>) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let widths: Vec<usize> = chars.iter().map(|&c| char_width(c)).collect();
    let first_lead = opts.first_lead.unwrap_or(opts.lead);
    let lead_len = opts.lead.chars().count() as isize;
    let first_lead_len = first_lead.chars().count() as isize;
    let trail_len = opts.trail.chars().count() as isize;

    let mut wcol = opts.width as isize;
    if wcol > 0 && lead_len + trail_len + 1 >= wcol {
        // Lead and trail alone overflow the column, split only where forced.
        wcol = 0;
    }

    let break_after: Vec<(Vec<char>, Option<Vec<char>>)> = opts
        .break_after
        .iter()
        .map(|(br, except)| (br.chars().collect(), except.map(|e| e.chars().collect())))
        .collect();
    let break_before: Vec<Vec<char>> = opts.break_before.iter().map(|b| b.chars().collect()).collect();
    let natural: Vec<char> = opts.natural_breaks.chars().collect();
    let check_tags = !opts.tag_breaks.is_empty() || !opts.tag_breaks_always.is_empty();

    let n = chars.len();
    let mut lines: Vec<String> = Vec::new();
    let mut p = 0usize;
    while p < n {
        let first = lines.is_empty();
        let clead = if first { first_lead } else { opts.lead };
        let ewcol = wcol - 1 - trail_len - if first { first_lead_len } else { lead_len };

        let mut at_break = false;
        let mut pl = 0usize;
        let mut ple = 0isize;
        let mut pl_ok = 0usize;
        let mut ple_ok = 0isize;
        while p + pl < n && (ple <= ewcol || wcol <= 0 || (!opts.mid_word && pl_ok == 0)) {
            let back = &chars[..p + pl];
            let fore = &chars[p + pl..];
            let pchar = back.last().copied();
            let cchar = fore[0];

            if pl >= 1 {
                at_break = break_after.iter().any(|(br, except)| {
                    ends_with(back, br) && !except.as_ref().is_some_and(|e| ends_with(back, e))
                }) || break_before.iter().any(|br| starts_with(fore, br));

                if !at_break && check_tags && back.last() == Some(&'>') {
                    let inner = &back[..back.len() - 1];
                    if let Some(pt) = inner.iter().rposition(|&c| c == '<') {
                        let tag: String = back[pt..].iter().collect();
                        if let Some((name, state)) = split_tag(&tag) {
                            at_break = opts.tag_breaks_always.contains(&name.as_str())
                                || (opts.tag_breaks.contains(&name.as_str())
                                    && state != TagState::Open);
                        }
                    }
                }
                if !at_break && !opts.tag_breaks.is_empty() && cchar == '<' {
                    if let Some(pt) = fore.iter().skip(1).position(|&c| c == '>') {
                        let tag: String = fore[..pt + 2].iter().collect();
                        if let Some((name, state)) = split_tag(&tag) {
                            at_break =
                                opts.tag_breaks.contains(&name.as_str()) && state == TagState::Open;
                        }
                    }
                }
                if at_break {
                    break;
                }
            }

            if pchar == Some(' ')
                || (cchar != ' '
                    && pchar.is_some_and(|c| natural.contains(&c))
                    && !natural.contains(&cchar))
            {
                pl_ok = pl;
                ple_ok = ple;
            }

            if let Some(len) = color_escape_len(fore) {
                pl += len;
            } else {
                ple += widths[p + pl] as isize;
                pl += 1;
            }
        }

        if !at_break && ple > ewcol && ewcol > 0 {
            if ple_ok > opts.min_natural_col as isize {
                pl = pl_ok;
                ple = ple_ok;
            }
            if opts.mid_word {
                while pl > 1 && ple > ewcol {
                    pl -= 1;
                    ple -= widths[p + pl] as isize;
                }
            }
        }

        // Never break right after a backslash.
        while pl > 1 && p + pl < n && chars[p + pl - 1] == '\\' {
            pl -= 1;
        }

        if first && ((opts.first_empty && p + pl < n) || (ewcol <= 0 && wcol > 0)) {
            lines.push(format!("{}{}", clead, opts.trail));
            pl = 0;
        } else {
            let segment: String = chars[p..p + pl].iter().collect();
            lines.push(format!("{}{}{}", clead, segment, opts.trail));
        }
        p += pl;
    }

    if n == 0 {
        lines.push(format!("{}{}", first_lead, opts.trail));
    }

    if opts.trail.is_empty() || opts.strip_trailing {
        for (i, line) in lines.iter_mut().enumerate() {
            let keep = if opts.strip_trailing {
                0
            } else if i == 0 {
                first_lead.len()
            } else {
                opts.lead.len()
            };
            let keep = keep.min(line.len());
            let stripped = line[keep..].trim_end().len();
            line.truncate(keep + stripped);
        }
    }

    lines
}

fn field_options<'a>(
    width: usize,
    first_lead: &'a str,
    lead: &'a str,
    fine: bool,
) -> WrapOptions<'a> {
    WrapOptions {
        width,
        lead,
        first_lead: Some(first_lead),
        trail: "\"",
        first_empty: true,
        natural_breaks: if width > 0 { NATURAL_BREAKS } else { "" },
        break_before: &[FENCE],
        break_after: &[("\\n", Some("\\\\n")), (FENCE, None)],
        tag_breaks: if fine { TAG_BREAKS } else { &[] },
        tag_breaks_always: if fine { TAG_BREAKS_INPLACE } else { &[] },
        min_natural_col: if fine { 0 } else { 40 },
        ..WrapOptions::default()
    }
}

fn render_field(keyword: &str, text: &str, prefix: &str, width: usize, fine: bool) -> Vec<String> {
    let first_lead = format!("{prefix}{keyword} \"");
    let lead = format!("{prefix}\"");
    wrap_text(text, &field_options(width, &first_lead, &lead, fine))
}

/// Wrap a field at column 80.
pub fn wrap_field(keyword: &str, text: &str, prefix: &str) -> Vec<String> {
    render_field(keyword, text, prefix, 80, false)
}

/// Split a field only at embedded newlines.
pub fn wrap_field_unwrap(keyword: &str, text: &str, prefix: &str) -> Vec<String> {
    render_field(keyword, text, prefix, 0, false)
}

/// Wrap a field at column 80, also breaking around block markup.
pub fn wrap_field_fine(keyword: &str, text: &str, prefix: &str) -> Vec<String> {
    render_field(keyword, text, prefix, 80, true)
}

/// Wrap a comment of the given kind (`""`, `"."`, `":"`, `","`).
pub fn wrap_comment(kind: &str, text: &str) -> Vec<String> {
    let lead = format!("#{kind} ");
    wrap_text(
        text,
        &WrapOptions {
            lead: &lead,
            mid_word: false,
            strip_trailing: true,
            ..WrapOptions::default()
        },
    )
}

/// Render a comment on a single line.
pub fn wrap_comment_unwrap(kind: &str, text: &str) -> Vec<String> {
    let lead = format!("#{kind} ");
    wrap_text(
        text,
        &WrapOptions {
            width: 0,
            lead: &lead,
            strip_trailing: true,
            ..WrapOptions::default()
        },
    )
}

/// Configurable field formatter used by catalogs by default.
#[derive(Debug, Clone, Copy)]
pub struct Wrapper {
    width: usize,
    fine: bool,
}

impl Default for Wrapper {
    fn default() -> Self {
        Self::new(80)
    }
}

impl Wrapper {
    pub fn new(width: usize) -> Self {
        Self { width, fine: false }
    }

    pub fn unwrapped() -> Self {
        Self::new(0)
    }

    pub fn fine(mut self, fine: bool) -> Self {
        self.fine = fine;
        self
    }
}

impl FieldFormatter for Wrapper {
    fn format_field(&self, keyword: &str, text: &str, prefix: &str) -> Vec<String> {
        render_field(keyword, text, prefix, self.width, self.fine)
    }
}

/// Pick a field wrapper: `basic` wraps on column, `fine` on markup.
pub fn select_field_wrapper(basic: bool, fine: bool) -> Wrapper {
    let wrapper = if basic { Wrapper::default() } else { Wrapper::unwrapped() };
    wrapper.fine(fine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_field_single_line() {
        assert_eq!(wrap_field("msgid", "Hello", ""), vec!["msgid \"Hello\""]);
        assert_eq!(wrap_field("msgstr", "", "#~ "), vec!["#~ msgstr \"\""]);
    }

    #[test]
    fn test_newline_forces_break() {
        let lines = wrap_field("msgid", "one\\ntwo", "");
        assert_eq!(lines, vec!["msgid \"\"", "\"one\\n\"", "\"two\""]);
    }

    #[test]
    fn test_escaped_backslash_n_is_not_a_break() {
        let lines = wrap_field("msgid", "a\\\\nb", "");
        assert_eq!(lines, vec!["msgid \"a\\\\nb\""]);
    }

    #[test]
    fn test_long_field_wraps_on_spaces() {
        let text = "word ".repeat(30);
        let text = text.trim_end();
        let lines = wrap_field("msgid", text, "");
        assert_eq!(lines[0], "msgid \"\"");
        assert!(lines.len() > 2);
        for line in &lines {
            assert!(line.chars().count() <= 79, "too long: {line}");
        }
        let joined: String = lines[1..]
            .iter()
            .map(|l| l.trim_start_matches('"').trim_end_matches('"'))
            .collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_wide_chars_count_double() {
        let text = "漢".repeat(50);
        let lines = wrap_field("msgstr", &text, "");
        assert!(lines.len() >= 3);
        for line in &lines[1..] {
            let inner = line.trim_matches('"');
            assert!(inner.chars().count() * 2 <= 78);
        }
    }

    #[test]
    fn test_unwrapped_splits_only_on_newline() {
        let text = format!("{}\\nend", "x ".repeat(60));
        let lines = wrap_field_unwrap("msgid", &text, "");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "\"end\"");
    }

    #[test]
    fn test_fine_breaks_after_paragraph() {
        let lines = wrap_field_fine("msgid", "<p>One.</p><p>Two.</p>", "");
        assert_eq!(lines, vec!["msgid \"\"", "\"<p>One.</p>\"", "\"<p>Two.</p>\""]);
    }

    #[test]
    fn test_comment_wrapping() {
        assert_eq!(wrap_comment_unwrap("", ""), vec!["#"]);
        assert_eq!(wrap_comment_unwrap(".", "note"), vec!["#. note"]);
        let refs = (1..30).map(|i| format!("src/file.c:{i}")).collect::<Vec<_>>().join(" ");
        let lines = wrap_comment(":", &refs);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.starts_with("#: ")));
        assert!(lines.iter().all(|l| !l.ends_with(' ')));
    }

    #[test]
    fn test_closure_is_a_formatter() {
        let f = |kw: &str, text: &str, prefix: &str| vec![format!("{prefix}{kw} <{text}>")];
        assert_eq!(f.format_field("msgid", "x", "#| "), vec!["#| msgid <x>"]);
    }

    #[test]
    fn test_selected_wrapper() {
        let text = format!("{}\\nend", "x ".repeat(60));
        let unwrapped = select_field_wrapper(false, false).format_field("msgid", &text, "");
        assert_eq!(unwrapped, wrap_field_unwrap("msgid", &text, ""));
        let fine = select_field_wrapper(true, true).format_field("msgid", "<p>a</p><p>b</p>", "");
        assert_eq!(fine, wrap_field_fine("msgid", "<p>a</p><p>b</p>", ""));
    }
}
