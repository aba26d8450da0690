//! Play-URL normalization
//!
//! Upstream catalogues deliver play URLs in a few shapes:
//!
//! - a bare URL: `https://cdn/a.m3u8`
//! - a tagged URL: `HD$https://cdn/a.m3u8`
//! - several tagged lines joined by `#`: `Line 1$https://a#Line 2$https://b`
//!
//! Everything here is pure and total: unrecognized input falls back to the
//! trimmed raw string.

const LINE_SEPARATOR: char = '#';
const LABEL_SEPARATOR: char = '$';

/// One labelled source line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLine<'a> {
    pub label: &'a str,
    pub url: &'a str,
}

/// Split a raw play string into its labelled lines.
///
/// A string without any `$` is a single unlabelled line, so `#` fragments in
/// plain URLs are left alone.
pub fn lines(raw: &str) -> Vec<SourceLine<'_>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    if !raw.contains(LABEL_SEPARATOR) {
        return vec![SourceLine { label: "", url: raw }];
    }

    raw.split(LINE_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| match segment.split_once(LABEL_SEPARATOR) {
            Some((label, url)) => {
                let url = url.trim();
                (!url.is_empty()).then_some(SourceLine { label: label.trim(), url })
            }
            None => Some(SourceLine { label: "", url: segment }),
        })
        .collect()
}

/// Resolve the default (first) playable URL.
pub fn resolve(raw: &str) -> String {
    resolve_line(raw, 0)
}

/// Resolve a specific line, falling back to the first line when `index` is
/// out of range and to the trimmed input when nothing parses.
pub fn resolve_line(raw: &str, index: usize) -> String {
    playable_line(raw, index).unwrap_or_else(|| raw.trim().to_string())
}

/// Like [`resolve_line`] but `None` when the input holds no playable URL.
pub fn playable_line(raw: &str, index: usize) -> Option<String> {
    let parsed = lines(raw);
    parsed
        .get(index)
        .or_else(|| parsed.first())
        .map(|line| line.url.to_string())
}
