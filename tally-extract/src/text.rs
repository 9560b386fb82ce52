//! Small string helpers shared by the parsers.

/// Parse a captured amount like "1,234.56". Thousands separators are dropped.
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    let v: f64 = cleaned.parse().ok()?;
    v.is_finite().then_some(v)
}

/// Word-wise title case: a letter is upper-cased when it starts a word,
/// lower-cased otherwise. Apostrophes do not start a word ("Mcdonald's").
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev: Option<char> = None;
    for c in s.chars() {
        let starts_word = match prev {
            None => true,
            Some(p) => !p.is_alphabetic() && p != '\'',
        };
        if c.is_alphabetic() {
            if starts_word {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// First line with non-whitespace content, trimmed
pub fn first_non_blank_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}

/// At most `n` characters (not bytes)
pub fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
