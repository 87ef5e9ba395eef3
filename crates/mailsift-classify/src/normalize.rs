//! Raw-HTML normalization into the lowercase views the extractors consume.
//!
//! Everything here is total: malformed markup degrades to the lowercased raw
//! input instead of failing, so a broken body never aborts a batch.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid regex"));

static BROKEN_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+\d{1,2},\s*\n\s*(\d{4})")
        .expect("valid regex")
});

/// Render a raw HTML body into its two lowercase working views.
///
/// The first is a whitespace-normalized rendering that keeps tag structure
/// (one tag or text run per line); the second is the visible text only, with
/// tags stripped, common entities decoded, and tokens separated by single
/// spaces. Input with no markup comes back lowercased in both views.
#[must_use]
pub fn text_and_html_views(raw: &str) -> (String, String) {
    let lower = raw.to_lowercase();
    (pretty_html(&lower), visible_text(&lower))
}

/// Repair amounts rendered as separately-styled digit spans.
///
/// Strips every tag (replaced by a space) from the raw HTML, then deletes
/// whitespace strictly between two digits, so `<span>3</span><span>0</span>`
/// style layouts reassemble into contiguous numbers.
#[must_use]
pub fn join_digit_split_html(raw: &str) -> String {
    let stripped = TAG_RE.replace_all(raw, " ");
    join_digit_runs(&stripped)
}

/// Rejoin dates broken across lines and flatten remaining line breaks.
///
/// A month-and-day line followed by a 4-digit year on the next line becomes
/// one contiguous date token; any leftover `<br>`, CRLF, or LF turns into a
/// single space. Idempotent: once joined, a second pass is a no-op.
#[must_use]
pub fn join_broken_date_lines(text: &str) -> String {
    let joined = BROKEN_DATE_RE.replace_all(text, "$1 $2");
    joined
        .replace("<br>", " ")
        .replace("\r\n", " ")
        .replace('\n', " ")
}

fn pretty_html(lower: &str) -> String {
    let broken = lower.replace("><", ">\n<");
    broken
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn visible_text(lower: &str) -> String {
    let stripped = TAG_RE.replace_all(lower, " ");
    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Delete whitespace runs whose neighbours on both sides are digits.
fn join_digit_runs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            let mut run = String::new();
            run.push(c);
            while let Some(&next) = chars.peek() {
                if next.is_whitespace() {
                    run.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            let prev_is_digit = out.chars().last().is_some_and(|p| p.is_ascii_digit());
            let next_is_digit = chars.peek().is_some_and(|n| n.is_ascii_digit());
            if !(prev_is_digit && next_is_digit) {
                out.push_str(&run);
            }
        } else {
            out.push(c);
        }
    }

    out
}
