//! Amount extraction: digit-join repair, strict range validation, and
//! contextual candidate scoring.

use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::join_digit_split_html;

const MIN_AMOUNT: f64 = 10.0;
const MAX_AMOUNT: f64 = 100_000_000.0;
const ACCEPT_THRESHOLD: f64 = 0.45;

/// Subject words that mark a receipt context around an amount.
const SUBJECT_CONTEXT: &[&str] = &["invoice", "receipt", "order", "payment"];

/// Body words that mark financial context around an amount.
const BODY_CONTEXT: &[&str] = &["total", "amount", "paid", "charged", "transaction"];

static AMOUNT_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // INR, prefixed and suffixed.
        r"(?i)(?:rs\.?|inr|₹)\s*([0-9]{1,3}(?:[, ]?[0-9]{2,3})*(?:\.[0-9]{1,2})?)",
        r"(?i)([0-9]{1,3}(?:[, ]?[0-9]{2,3})*(?:\.[0-9]{1,2})?)\s*(?:rs\.?|inr|₹)",
        // USD, prefixed and suffixed.
        r"(?i)(?:usd|us\$|\$)\s*([0-9]{1,3}(?:[, ]?[0-9]{2,3})*(?:\.[0-9]{1,2})?)",
        r"(?i)([0-9]{1,3}(?:[, ]?[0-9]{2,3})*(?:\.[0-9]{1,2})?)\s*(?:usd|us\$|\$)",
        // Bare labelled forms.
        r"(?i)\btotal[: ]*([0-9]{1,3}(?:[, ]?[0-9]{2,3})*(?:\.[0-9]{1,2})?)\b",
        r"(?i)\bamount(?: paid| due| charged)?[: ]*([0-9]{1,3}(?:[, ]?[0-9]{2,3})*(?:\.[0-9]{1,2})?)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid amount regex"))
    .collect()
});

/// Where a candidate amount was found. The HTML view is the more reliable
/// source and scores higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateSource {
    Html,
    Text,
}

#[derive(Debug, Clone)]
struct Candidate {
    source: CandidateSource,
    cleaned: String,
    value: f64,
}

/// Extract the best-scoring monetary amount from a mail.
///
/// Candidates are gathered from the digit-joined HTML first and the plain
/// text second, filtered through [`is_valid_amount`], then scored by source
/// and context. Returns the amount as a decimal string with a confidence in
/// `[0, 1]` rounded to 3 decimals, or `None` if the best candidate stays
/// below the acceptance threshold.
#[must_use]
pub fn extract_amount(text: &str, html: &str, subject: &str) -> Option<(String, f64)> {
    let subject_lower = subject.to_lowercase();
    let text_lower = text.to_lowercase();
    let normalized_html = join_digit_split_html(html);

    let mut candidates = Vec::new();
    collect_candidates(&normalized_html, CandidateSource::Html, &mut candidates);
    collect_candidates(&text_lower, CandidateSource::Text, &mut candidates);

    if candidates.is_empty() {
        return None;
    }

    let subject_context = SUBJECT_CONTEXT.iter().any(|k| subject_lower.contains(k));
    let body_context = BODY_CONTEXT.iter().any(|k| text_lower.contains(k));

    let mut best: Option<(&Candidate, f64)> = None;
    for candidate in &candidates {
        let mut score = match candidate.source {
            CandidateSource::Html => 0.4,
            CandidateSource::Text => 0.3,
        };
        if subject_context {
            score += 0.3;
        }
        if body_context {
            score += 0.2;
        }
        // Percentages are discounts, not charges.
        if text_lower.contains(&format!("{}%", candidate.cleaned)) {
            score -= 0.5;
        }
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }

    let (candidate, score) = best?;
    if score < ACCEPT_THRESHOLD {
        return None;
    }

    Some((format_amount(candidate.value), round3(score.min(1.0))))
}

/// Strict sanity filter for detected amounts: numeric, and within the
/// plausible range for a single charge.
#[must_use]
pub fn is_valid_amount(amt: &str) -> bool {
    let Ok(value) = amt.parse::<f64>() else {
        return false;
    };
    (MIN_AMOUNT..=MAX_AMOUNT).contains(&value)
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn collect_candidates(haystack: &str, source: CandidateSource, out: &mut Vec<Candidate>) {
    for re in AMOUNT_RES.iter() {
        for caps in re.captures_iter(haystack) {
            let Some(m) = caps.get(1) else { continue };
            let cleaned = m.as_str().replace([',', ' '], "");
            if !is_valid_amount(&cleaned) {
                continue;
            }
            let Ok(value) = cleaned.parse::<f64>() else {
                continue;
            };
            out.push(Candidate {
                source,
                cleaned,
                value,
            });
        }
    }
}

/// Render an amount the way it is persisted: integral values keep one
/// trailing decimal place, fractional values print as parsed.
fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
