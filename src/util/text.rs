use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Terminal column width of `s` (CJK and emoji count as two).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate `s` to at most `max_width` terminal columns, appending "..."
/// when text was cut.
///
/// Widths of three columns or fewer get a plain cut with no ellipsis.
///
/// ```
/// use sacco_admin::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Loan products", 20), "Loan products");
/// assert_eq!(truncate_to_width("Annual general meeting", 10), "Annual ...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let budget = if max_width <= ELLIPSIS_WIDTH {
        max_width
    } else {
        max_width - ELLIPSIS_WIDTH
    };

    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    if max_width <= ELLIPSIS_WIDTH {
        Cow::Owned(s[..end].to_string())
    } else {
        Cow::Owned(format!("{}{}", &s[..end], ELLIPSIS))
    }
}

/// Remove terminal control characters and ANSI escape sequences.
///
/// Text arriving from the content API or from the public contact form is
/// printed straight to the terminal. Tabs and newlines are kept.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let needs_strip = s
        .chars()
        .any(|c| c == '\x1b' || c == '\x7f' || (c.is_control() && !matches!(c, '\t' | '\n' | '\r')));
    if !needs_strip {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x1b' => match chars.peek() {
                // CSI: ESC [ params final-byte
                Some('[') => {
                    chars.next();
                    for next in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&next) {
                            break;
                        }
                    }
                }
                // OSC: ESC ] ... BEL | ESC \
                Some(']') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '\x07' {
                            break;
                        }
                        if next == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            },
            '\t' | '\n' | '\r' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Single-line table cell: control characters stripped, newlines folded
/// to spaces, truncated and right-padded to exactly `width` columns.
pub fn table_cell(s: &str, width: usize) -> String {
    let clean = strip_control_chars(s);
    let single_line: String = clean
        .chars()
        .map(|c| if matches!(c, '\n' | '\r' | '\t') { ' ' } else { c })
        .collect();
    let cut = truncate_to_width(&single_line, width);
    let pad = width.saturating_sub(display_width(&cut));
    format!("{}{}", cut, " ".repeat(pad))
}
