use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Characters that are unsafe in filenames on common filesystems.
const UNSAFE_FILENAME_CHARS: [char; 10] = ['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

const ELLIPSIS: &str = "...";

/// Calculates the display width of a string in terminal columns.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncates a string to fit within `max_width` terminal columns, appending
/// "..." when anything was cut.
///
/// Widths too narrow for a character plus the ellipsis get as many
/// characters as fit, with no ellipsis.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let ellipsis = display_width(ELLIPSIS);
    let (budget, suffix) = if max_width <= ellipsis {
        (max_width, "")
    } else {
        (max_width - ellipsis, ELLIPSIS)
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

    Cow::Owned(format!("{}{}", &s[..end], suffix))
}

/// SEC-001: Strips terminal control characters and ANSI escape sequences
/// from feed-provided text before it is printed.
///
/// Tab, newline and carriage return are kept. CSI (`ESC [ … final`) and OSC
/// (`ESC ] … BEL` or `ESC ] … ESC \`) sequences are removed whole.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_control = |c: char| c.is_control() && !matches!(c, '\t' | '\n' | '\r');

    if !s.chars().any(is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    // Parameter bytes run until the final byte (0x40..=0x7e)
                    for c in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&c) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(c) = chars.next() {
                        if c == '\x07' {
                            break;
                        }
                        if c == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
        } else if !is_control(c) {
            out.push(c);
        }
    }

    Cow::Owned(out)
}

/// Filesystem-safe `.epub` filename for a book title.
///
/// Each of `/ \ ? % * : | " < >` becomes `-`.
pub fn safe_filename(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '-' } else { c })
        .collect();
    format!("{stem}.epub")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_fits() {
        assert!(matches!(truncate_to_width("Short", 10), Cow::Borrowed(_)));
        assert_eq!(truncate_to_width("12345", 5), "12345");
    }

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
        assert_eq!(truncate_to_width("Testing", 4), "T...");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // Each of these is two columns wide
        assert_eq!(truncate_to_width("日本語の本", 7), "日本...");
        assert_eq!(truncate_to_width("日本語", 3), "日");
    }

    #[test]
    fn test_truncate_narrow_widths() {
        assert_eq!(truncate_to_width("Test", 0), "");
        assert_eq!(truncate_to_width("Test", 2), "Te");
        assert_eq!(truncate_to_width("Test", 3), "Tes");
    }

    #[test]
    fn test_strip_clean_text_is_borrowed() {
        let input = "A Tale of Two Cities\n\tby Dickens";
        assert!(matches!(strip_control_chars(input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_escape_sequences() {
        assert_eq!(strip_control_chars("\x1b[31mRed\x1b[0m Book"), "Red Book");
        assert_eq!(strip_control_chars("\x1b]0;pwned\x07Title"), "Title");
        assert_eq!(strip_control_chars("\x1b]0;pwned\x1b\\Title"), "Title");
        assert_eq!(strip_control_chars("be\x1bfore"), "before");
    }

    #[test]
    fn test_strip_c0_and_del() {
        assert_eq!(strip_control_chars("a\x00b\x07c\x7fd"), "abcd");
    }

    #[test]
    fn test_safe_filename_replaces_every_unsafe_char() {
        assert_eq!(
            safe_filename(r#"a/b\c?d%e*f:g|h"i<j>k"#),
            "a-b-c-d-e-f-g-h-i-j-k.epub"
        );
    }

    #[test]
    fn test_safe_filename_keeps_other_chars() {
        assert_eq!(safe_filename("Don Quijote (1605)"), "Don Quijote (1605).epub");
        assert_eq!(safe_filename("Les Misérables"), "Les Misérables.epub");
    }
}
