use unicode_xid::UnicodeXID;

/// See https://tc39.github.io/ecma262/#sec-line-terminators
pub fn is_line_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// See https://tc39.github.io/ecma262/#sec-white-space
pub fn is_whitespace(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t' | '\u{000B}' | '\u{000C}' | '\u{00A0}' | '\u{FEFF}'
    ) || (!ch.is_ascii() && ch.is_whitespace() && !is_line_break(ch))
}

/// Test whether a given character code starts an identifier.
#[inline]
pub fn is_ident_start(ch: char) -> bool {
    match ch {
        '$' | '_' | 'A'..='Z' | 'a'..='z' => true,
        _ => !ch.is_ascii() && ch.is_xid_start(),
    }
}

/// Test whether a given character is part of an identifier.
#[inline]
pub fn is_ident_part(ch: char) -> bool {
    match ch {
        '$' | '_' | '0'..='9' | 'A'..='Z' | 'a'..='z' | '\u{200C}' | '\u{200D}' => true,
        _ => !ch.is_ascii() && ch.is_xid_continue(),
    }
}

pub fn is_valid_regex_flag(ch: char) -> bool {
    matches!(ch, 'g' | 'm' | 's' | 'i' | 'y' | 'u')
}
