//! Transaction-date extraction.

use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::join_broken_date_lines;
use crate::receipt::RECEIPT_META;

/// Every date shape the pipeline recognizes: `14 nov 2025`, `nov 14, 2025`,
/// `14-nov-25`, `2025-11-14`, `14/11/2025`, and friends. Month names match
/// case-insensitively by 3-letter prefix.
pub(crate) static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\b\d{1,2}[-/ ]?(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*[-/ ]?\d{2,4}\b|\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+\d{1,2},\s*\d{4}\b|\b\d{1,2}\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+\d{4}\b|\b\d{4}[-/]\d{2}[-/]\d{2}\b|\b\d{1,2}[-/]\d{1,2}[-/]\d{2,4}\b)",
    )
    .expect("valid date regex")
});

/// Extract the most trustworthy transaction date from a mail.
///
/// The broken-line-joined HTML view is searched first (0.6 base, +0.2 when
/// the subject carries receipt context), then the joined text view (flat
/// 0.6). When neither view has a date but the subject looks like a receipt,
/// the mail's declared metadata date is trusted at 0.5.
#[must_use]
pub fn extract_date(
    text: &str,
    html: &str,
    meta_date: &str,
    subject: &str,
) -> Option<(String, f64)> {
    let clean_html = join_broken_date_lines(html);
    let clean_text = join_broken_date_lines(text);
    let subject_lower = subject.to_lowercase();
    let subject_context = RECEIPT_META.iter().any(|k| subject_lower.contains(k));

    if let Some(m) = DATE_RE.find(&clean_html) {
        let mut confidence: f64 = 0.6;
        if subject_context {
            confidence += 0.2;
        }
        return Some((m.as_str().to_string(), confidence.min(1.0)));
    }

    if let Some(m) = DATE_RE.find(&clean_text) {
        return Some((m.as_str().to_string(), 0.6));
    }

    if subject_context {
        return Some((meta_date.to_string(), 0.5));
    }

    None
}
