//! Output text normalization.
//!
//! Every reference goes through [`sanitize`]; every text goes through [`sanitize`]
//! followed by [`format_text`].

use std::sync::LazyLock;

use regex::Regex;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9 .:,?!()']").expect("valid sanitizer pattern"));

const TRANSLITERATIONS: &[(char, &str)] = &[
    ('Ä', "Ae"),
    ('Ö', "Oe"),
    ('Ü', "Ue"),
    ('ä', "ae"),
    ('ö', "oe"),
    ('ü', "ue"),
    ('ß', "ss"),
];

/// Transliterate German umlauts and `ß`, then drop everything outside
/// ASCII letters, digits, space and `. : , ? ! ( ) '`.
pub fn sanitize(input: &str) -> String {
    let mut transliterated = String::with_capacity(input.len());
    for ch in input.chars() {
        match TRANSLITERATIONS.iter().find(|(from, _)| *from == ch) {
            Some((_, to)) => transliterated.push_str(to),
            None => transliterated.push(ch),
        }
    }
    DISALLOWED.replace_all(&transliterated, "").into_owned()
}

/// Trim, capitalize the first character and force terminal punctuation.
///
/// A trailing comma becomes `...`; anything else not ending in `.`, `!` or `?`
/// gets a period.
pub fn format_text(input: &str) -> String {
    let trimmed = input.trim();
    let mut chars = trimmed.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut out: String = first.to_uppercase().collect();
    out.push_str(chars.as_str());

    if out.ends_with(',') {
        out.pop();
        let kept = out.trim_end().len();
        out.truncate(kept);
        out.push_str("...");
    } else if !out.ends_with(['.', '!', '?']) {
        out.push('.');
    }
    out
}

/// Convenience for the text column: sanitize then format.
pub fn clean_text(input: &str) -> String {
    format_text(&sanitize(input))
}
