//! Billing-frequency extraction for subscription mails.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use mailsift_core::Frequency;

/// Direct keyword families, strongest signal first hit wins. Order matters:
/// families are probed in this sequence and the first matching family ends
/// the scan.
static FREQ_PATTERNS: LazyLock<Vec<(Frequency, Vec<Regex>)>> = LazyLock::new(|| {
    let compile = |patterns: &[&str]| -> Vec<Regex> {
        patterns
            .iter()
            .map(|p| Regex::new(p).expect("valid frequency regex"))
            .collect()
    };
    vec![
        (
            Frequency::Weekly,
            compile(&[
                r"\bweekly\b",
                r"\bevery week\b",
                r"\bper week\b",
                r"\brenews weekly\b",
                r"\b7 days\b",
                r"/\s*week",
                r"\bwk\b",
            ]),
        ),
        (
            Frequency::Monthly,
            compile(&[
                r"\bmonthly\b",
                r"\bevery month\b",
                r"\bper month\b",
                r"\bbilled monthly\b",
                r"\brenews monthly\b",
                r"/\s*mo\b",
                r"/\s*mon\b",
                r"\b30 days\b",
                r"\bevery 30 days\b",
            ]),
        ),
        (
            Frequency::Yearly,
            compile(&[
                r"\byearly\b",
                r"\bannual\b",
                r"\bannually\b",
                r"\bper year\b",
                r"\bbilled yearly\b",
                r"\brenews yearly\b",
                r"/\s*yr\b",
                r"/\s*year\b",
                r"\b12 months\b",
            ]),
        ),
        (
            Frequency::Quarterly,
            compile(&[r"\bquarterly\b", r"\bevery 3 months\b", r"\b3 months\b"]),
        ),
        (
            Frequency::SemiAnnual,
            compile(&[r"\bsemi[- ]?annual\b", r"\bevery 6 months\b", r"\b6 months\b"]),
        ),
    ]
});

static PRICE_PER_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\s*(mo|mon|month)").expect("valid regex"));
static PRICE_PER_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\s*(yr|year)").expect("valid regex"));
static PRICE_PER_WEEK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\s*wk").expect("valid regex"));

static DATE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2}[-/]\d{1,2}[-/]\d{2,4})\b").expect("valid regex"));

/// Infer the billing frequency from mail text.
///
/// Detection tiers, first hit wins: direct keyword families (0.9), pricing
/// shorthand like `₹199/month` (0.85), a `renews on` co-occurrence check
/// (0.7), and finally the day gap between the first two `D/M/YYYY` tokens
/// (0.75). Tokens that fail to parse silently end the interval tier; nothing
/// detected yields `None`.
#[must_use]
pub fn extract_frequency(text: &str) -> Option<(Frequency, f64)> {
    let text = text.to_lowercase();

    for (frequency, patterns) in FREQ_PATTERNS.iter() {
        if patterns.iter().any(|re| re.is_match(&text)) {
            return Some((*frequency, 0.9));
        }
    }

    if PRICE_PER_MONTH_RE.is_match(&text) {
        return Some((Frequency::Monthly, 0.85));
    }
    if PRICE_PER_YEAR_RE.is_match(&text) {
        return Some((Frequency::Yearly, 0.85));
    }
    if PRICE_PER_WEEK_RE.is_match(&text) {
        return Some((Frequency::Weekly, 0.85));
    }

    if text.contains("renews on") && text.contains("month") {
        return Some((Frequency::Monthly, 0.7));
    }
    if text.contains("renews on") && text.contains("year") {
        return Some((Frequency::Yearly, 0.7));
    }

    interval_frequency(&text).map(|frequency| (frequency, 0.75))
}

/// Infer a frequency from the gap between the first two date tokens, e.g. a
/// current and a next billing date 30 days apart.
fn interval_frequency(text: &str) -> Option<Frequency> {
    let mut tokens = DATE_TOKEN_RE.find_iter(text).map(|m| m.as_str());
    let first = tokens.next()?;
    let second = tokens.next()?;

    let d1 = NaiveDate::parse_from_str(first, "%d/%m/%Y").ok()?;
    let d2 = NaiveDate::parse_from_str(second, "%d/%m/%Y").ok()?;

    match (d2 - d1).num_days().abs() {
        27..=33 => Some(Frequency::Monthly),
        350..=380 => Some(Frequency::Yearly),
        6..=8 => Some(Frequency::Weekly),
        _ => None,
    }
}
