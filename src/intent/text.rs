// Word-level view over a query, keeping byte offsets into the source text

use crate::tools::parse_number;

/// A whitespace-delimited token.
#[derive(Debug, Clone)]
pub(crate) struct Word<'a> {
    /// The token exactly as written.
    pub raw: &'a str,
    /// The token with surrounding punctuation removed.
    pub text: &'a str,
    pub lower: String,
    /// Byte range of `raw` in the source.
    pub start: usize,
    pub end: usize,
}

impl Word<'_> {
    /// True when the token closes a sentence or clause (`.`, `;`, `!`, `?`).
    pub fn ends_sentence(&self) -> bool {
        self.raw.ends_with(['.', ';', '!', '?'])
    }

    pub fn is_number(&self) -> bool {
        parse_number(self.text).is_some()
    }

    pub fn is(&self, candidates: &[&str]) -> bool {
        candidates.contains(&self.lower.as_str())
    }
}

pub(crate) fn words(source: &str) -> Vec<Word<'_>> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in source.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push(make_word(source, s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push(make_word(source, s, source.len()));
    }
    out
}

fn make_word(source: &str, start: usize, end: usize) -> Word<'_> {
    let raw = &source[start..end];
    let text = raw.trim_matches(|c: char| !(c.is_alphanumeric() || c == '_'));
    Word {
        raw,
        text,
        lower: text.to_lowercase(),
        start,
        end,
    }
}

/// Index of the first occurrence of a (possibly multi-word) phrase.
pub(crate) fn find_phrase(words: &[Word<'_>], phrase: &str) -> Option<usize> {
    let parts: Vec<&str> = phrase.split_whitespace().collect();
    if parts.is_empty() || parts.len() > words.len() {
        return None;
    }
    (0..=words.len() - parts.len()).find(|&i| {
        parts
            .iter()
            .enumerate()
            .all(|(k, part)| words[i + k].lower == *part)
    })
}

/// Source text covered by `words[from..to]`.
pub(crate) fn span<'a>(source: &'a str, words: &[Word<'a>], from: usize, to: usize) -> &'a str {
    if from >= to || to > words.len() {
        return "";
    }
    &source[words[from].start..words[to - 1].end]
}

/// Trim whitespace, trailing separators, dangling connectors and quotes.
pub(crate) fn clean_value(value: &str) -> &str {
    let mut v = value.trim();
    loop {
        let before = v;
        v = v.trim_end_matches([',', ';', '.', '!', '?']).trim();
        for connector in [" and", " with", " then"] {
            if v.len() > connector.len()
                && v.is_char_boundary(v.len() - connector.len())
                && v[v.len() - connector.len()..].eq_ignore_ascii_case(connector)
            {
                v = v[..v.len() - connector.len()].trim_end();
            }
        }
        if v == before {
            break;
        }
    }
    let quotes: &[char] = &['"', '\'', '\u{201c}', '\u{201d}'];
    v.trim_matches(quotes).trim()
}
