//! Receipt detection, type labelling, and non-receipt negation confidence.
//!
//! Receipt detection is an additive evidence score over independent signals;
//! no single keyword is enough on its own, and promotional wording pushes a
//! mail back below the line.

use std::sync::LazyLock;

use regex::Regex;

use mailsift_core::MailType;

use crate::amount::{extract_amount, round3};
use crate::date::DATE_RE;

/// Receipt-metadata keywords shared by the date fallback and the negation
/// scorer.
pub(crate) const RECEIPT_META: &[&str] = &[
    "invoice",
    "receipt",
    "payment",
    "purchase",
    "order",
    "transaction",
];

const RECURRING_KEYWORDS: &[&str] = &[
    "subscription",
    "renewal",
    "auto-debit",
    "recurring",
    "billing cycle",
    "renews on",
    "auto-renew",
];

const SUBJECT_RECEIPT_KEYWORDS: &[&str] = &[
    "invoice",
    "payment",
    "receipt",
    "order",
    "transaction",
    "confirmed",
    "thank you",
    "you've made a purchase",
    "purchase",
];

const BODY_CONFIRMATION_KEYWORDS: &[&str] = &[
    "payment",
    "transaction",
    "order",
    "billed",
    "charged",
    "thank",
    "purchase",
    "purchased",
];

const PROMO_WORDS: &[&str] = &["offer", "save", "discount", "sale", "cashback"];

/// Scores of 3 and above are receipts; 2 is treated as suspicious and not
/// counted.
const RECEIPT_SCORE_THRESHOLD: i32 = 3;

static ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(order id|transaction id|txn id|utr|folio|invoice number|invoice no)")
        .expect("valid id regex")
});

/// Decide whether a mail evidences a completed financial transaction.
///
/// Signals: a confidently extracted amount (+2), a date shape anywhere in
/// the raw views (+1), an order/transaction ID label (+1), a receipt keyword
/// in the subject (+1), a confirmation keyword in the body (+1), and a
/// promotional word in subject or body (−1 each).
#[must_use]
pub fn is_receipt(text: &str, html: &str, subject: &str) -> bool {
    let text_lower = text.to_lowercase();
    let subject_lower = subject.to_lowercase();

    let mut score = 0_i32;

    if let Some((_, confidence)) = extract_amount(text, html, subject) {
        if confidence >= 0.4 {
            score += 2;
        }
    }

    if DATE_RE.is_match(html) || DATE_RE.is_match(&text_lower) {
        score += 1;
    }

    if ID_RE.is_match(&text_lower) {
        score += 1;
    }

    if SUBJECT_RECEIPT_KEYWORDS
        .iter()
        .any(|k| subject_lower.contains(k))
    {
        score += 1;
    }

    if BODY_CONFIRMATION_KEYWORDS
        .iter()
        .any(|k| text_lower.contains(k))
    {
        score += 1;
    }

    if PROMO_WORDS.iter().any(|w| subject_lower.contains(w)) {
        score -= 1;
    }
    if PROMO_WORDS.iter().any(|w| text_lower.contains(w)) {
        score -= 1;
    }

    score >= RECEIPT_SCORE_THRESHOLD
}

/// Label a mail `subscription`, `purchase`, or `others`.
///
/// Recurring wording anywhere in the text forces `subscription` before any
/// receipt scoring runs; otherwise non-receipts are `others` and receipts
/// default to `purchase`.
#[must_use]
pub fn classify_type(text: &str, html: &str, subject: &str) -> MailType {
    let text_lower = text.to_lowercase();

    if RECURRING_KEYWORDS.iter().any(|k| text_lower.contains(k)) {
        return MailType::Subscription;
    }

    if !is_receipt(text, html, subject) {
        return MailType::Others;
    }

    MailType::Purchase
}

/// Confidence that a non-receipt call is correct.
///
/// Built from a signal set disjoint from the receipt score: no receipt
/// wording in the subject (+0.4), no extractable amount (+0.4), no ID label
/// (+0.2). Clamped to `[0, 1]`, rounded to 3 decimals.
#[must_use]
pub fn negation_confidence(text: &str, html: &str, subject: &str) -> f64 {
    let subject_lower = subject.to_lowercase();
    let text_lower = text.to_lowercase();

    let mut score: f64 = 0.0;

    if !RECEIPT_META.iter().any(|k| subject_lower.contains(k)) {
        score += 0.4;
    }

    if extract_amount(text, html, subject).is_none() {
        score += 0.4;
    }

    if !ID_RE.is_match(&text_lower) {
        score += 0.2;
    }

    round3(score.min(1.0))
}
