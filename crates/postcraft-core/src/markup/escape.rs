// SPDX-License-Identifier: AGPL-3.0-or-later
//! Escaping of markup-significant characters in text runs

/// Escape a text run so it reads back as literal text
///
/// Characters that open inline syntax are escaped anywhere; characters that
/// only matter at the start of a line (list markers, heading hashes, quote
/// markers, setext underlines) are escaped when they start the run.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if matches!(ch, '\\' | '*' | '_' | '`' | '[' | ']') {
            out.push('\\');
        }
        out.push(ch);
    }
    let mut out = out.replace("~~", "\\~\\~");

    if let Some(position) = leading_escape(&out) {
        out.insert(position, '\\');
    }
    out
}

/// Byte position at which a backslash must be inserted to neutralise
/// line-start syntax, if any
fn leading_escape(text: &str) -> Option<usize> {
    if text.starts_with('-') || text.starts_with("+ ") || text.starts_with('=') || text.starts_with('>')
    {
        return Some(0);
    }

    let hashes = text.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) && text[hashes..].starts_with(' ') {
        return Some(0);
    }

    let digits = text.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && text[digits..].starts_with(". ") {
        return Some(digits);
    }
    None
}

/// Backslash-escape parentheses in a link destination
pub fn escape_href(href: &str) -> String {
    let mut out = String::with_capacity(href.len());
    for ch in href.chars() {
        if matches!(ch, '(' | ')') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
