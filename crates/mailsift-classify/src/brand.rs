//! Registry-driven brand matching with a merchant-over-gateway rule and
//! layered inference fallbacks.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use mailsift_core::{BrandRegistry, ScoreWeights};

/// Minimum weighted score for a registry match to count.
const SCORE_THRESHOLD: f64 = 0.35;

const REGISTRY_CONFIDENCE: f64 = 0.95;
const OVERRIDE_CONFIDENCE: f64 = 0.98;
const SENDER_CONFIDENCE: f64 = 0.75;
const PHRASE_CONFIDENCE: f64 = 0.6;
const LOGO_CONFIDENCE: f64 = 0.7;

const FALLBACK_CATEGORY: &str = "others";

/// Payment processors that must yield to the underlying merchant whenever
/// one is detectable in the same mail.
const GATEWAYS: &[&str] = &[
    "razorpay",
    "stripe",
    "cashfree",
    "ccavenue",
    "payu",
    "paypal",
    "google_play",
];

/// Mailbox labels that say nothing about the brand behind a sender address.
const GENERIC_SENDER_LABELS: &[&str] = &["mail", "info", "support", "billing", "noreply", "service"];

/// Capitalized phrases that are letterhead boilerplate, not brand names.
const PHRASE_BLACKLIST: &[&str] = &[
    "Dear",
    "Invoice",
    "Order",
    "Payment",
    "Statement",
    "Receipt",
    "Thank",
    "Regards",
];

static SENDER_DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([a-z0-9.-]+)\.(com|in|net|org|co)").expect("valid regex"));

static CAPITALIZED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][A-Za-z0-9& ]+)\b").expect("valid regex"));

static IMG_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid regex"));

static ALT_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)\balt\s*=\s*["']([^"']*)["']"#).expect("valid regex"));

static LETTER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z]").expect("valid regex"));

/// Outcome of brand detection for one mail.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandMatch {
    pub brand: Option<String>,
    pub category: String,
    pub confidence: f64,
}

struct CompiledBrand {
    name: String,
    category: String,
    patterns: Vec<Regex>,
    sender_domains: Vec<String>,
    subject_contains: Vec<String>,
    weights: ScoreWeights,
    priority: i64,
}

/// A brand registry compiled for repeated matching: regexes built once,
/// substring rules pre-lowercased, brands held in deterministic name order.
pub struct BrandMatcher {
    brands: Vec<CompiledBrand>,
}

impl BrandMatcher {
    #[must_use]
    pub fn new(registry: &BrandRegistry) -> Self {
        let brands = registry
            .brands
            .iter()
            .map(|(name, rule)| CompiledBrand {
                name: name.clone(),
                category: rule.category.clone(),
                patterns: compile_patterns(name, &rule.patterns),
                sender_domains: rule
                    .sender_domains
                    .iter()
                    .map(|d| d.to_lowercase())
                    .collect(),
                subject_contains: rule
                    .subject_contains
                    .iter()
                    .map(|s| s.to_lowercase())
                    .collect(),
                weights: rule.score_weights,
                priority: rule.priority,
            })
            .collect();
        Self { brands }
    }

    /// Identify the brand behind a mail.
    ///
    /// Tries the weighted registry match first (confirming at 0.95, or 0.98
    /// when a merchant overrides a gateway), then falls back through
    /// sender-domain inference (0.75), capitalized-phrase inference (0.6),
    /// and logo alt-text inference (0.7) — the phrase scan is deliberately
    /// tried before the logo scan. No tier succeeding means no brand at 0.0.
    #[must_use]
    pub fn detect(&self, text: &str, raw_html: &str, sender: &str, subject: &str) -> BrandMatch {
        if let Some(winner) = self.weighted_match(text, sender, subject) {
            if GATEWAYS.contains(&winner.name.as_str()) {
                if let Some(merchant) = self.first_merchant_in_text(text) {
                    return BrandMatch {
                        brand: Some(merchant.name.clone()),
                        category: merchant.category.clone(),
                        confidence: OVERRIDE_CONFIDENCE,
                    };
                }
            }
            return BrandMatch {
                brand: Some(winner.name.clone()),
                category: winner.category.clone(),
                confidence: REGISTRY_CONFIDENCE,
            };
        }

        if let Some(brand) = brand_from_sender(sender) {
            return BrandMatch {
                brand: Some(brand),
                category: FALLBACK_CATEGORY.to_string(),
                confidence: SENDER_CONFIDENCE,
            };
        }

        let combined = format!("{subject} {text}");
        if let Some(brand) = brand_from_text(&combined) {
            return BrandMatch {
                brand: Some(brand),
                category: FALLBACK_CATEGORY.to_string(),
                confidence: PHRASE_CONFIDENCE,
            };
        }

        if let Some(brand) = brand_from_html(raw_html) {
            return BrandMatch {
                brand: Some(brand),
                category: FALLBACK_CATEGORY.to_string(),
                confidence: LOGO_CONFIDENCE,
            };
        }

        BrandMatch {
            brand: None,
            category: FALLBACK_CATEGORY.to_string(),
            confidence: 0.0,
        }
    }

    /// Score every brand and keep the best. At most one contribution per
    /// signal category; strictly greater score wins, exact ties fall to
    /// strictly greater priority, and remaining ties keep the earlier brand
    /// in name order.
    fn weighted_match(&self, text: &str, sender: &str, subject: &str) -> Option<&CompiledBrand> {
        let sender_lower = sender.to_lowercase();
        let subject_lower = subject.to_lowercase();

        let mut best_brand: Option<&CompiledBrand> = None;
        let mut best_score = 0.0_f64;
        let mut best_priority = -1_i64;

        for brand in &self.brands {
            let mut score = 0.0;

            if brand.patterns.iter().any(|re| re.is_match(text)) {
                score += brand.weights.pattern;
            }
            if brand
                .sender_domains
                .iter()
                .any(|d| sender_lower.contains(d))
            {
                score += brand.weights.sender;
            }
            if brand
                .subject_contains
                .iter()
                .any(|s| subject_lower.contains(s))
            {
                score += brand.weights.subject;
            }

            if score > best_score || (score == best_score && brand.priority > best_priority) {
                best_score = score;
                best_priority = brand.priority;
                best_brand = Some(brand);
            }
        }

        if best_score < SCORE_THRESHOLD {
            return None;
        }

        best_brand
    }

    /// First non-gateway brand (in name order) whose pattern appears in the
    /// text.
    fn first_merchant_in_text(&self, text: &str) -> Option<&CompiledBrand> {
        self.brands.iter().find(|brand| {
            !GATEWAYS.contains(&brand.name.as_str())
                && brand.patterns.iter().any(|re| re.is_match(text))
        })
    }
}

fn compile_patterns(brand: &str, patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| {
            match RegexBuilder::new(p).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!(brand, pattern = p.as_str(), error = %e, "skipping unparseable brand pattern");
                    None
                }
            }
        })
        .collect()
}

/// Infer a brand from the sender address: the domain label immediately left
/// of a known top-level suffix, unless it is a generic mailbox label.
fn brand_from_sender(sender: &str) -> Option<String> {
    let sender = sender.to_lowercase();
    let caps = SENDER_DOMAIN_RE.captures(&sender)?;
    let domain = caps.get(1)?.as_str();
    let label = domain.rsplit('.').next()?;

    if GENERIC_SENDER_LABELS.contains(&label) {
        return None;
    }

    Some(label.to_string())
}

/// Infer a brand from the first capitalized phrase that is not boilerplate.
fn brand_from_text(text: &str) -> Option<String> {
    CAPITALIZED_RE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|phrase| !PHRASE_BLACKLIST.contains(phrase))
        .map(ToString::to_string)
}

/// Infer a brand from an image alt attribute that looks like a logo label:
/// at most four words, at least one letter.
fn brand_from_html(raw_html: &str) -> Option<String> {
    for tag in IMG_TAG_RE.find_iter(raw_html) {
        let Some(caps) = ALT_ATTR_RE.captures(tag.as_str()) else {
            continue;
        };
        let alt = caps.get(1).map_or("", |m| m.as_str()).trim();
        if alt.split_whitespace().count() <= 4 && LETTER_RE.is_match(alt) {
            return Some(alt.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(yaml: &str) -> BrandMatcher {
        let registry: BrandRegistry = serde_yaml::from_str(yaml).expect("valid test registry");
        BrandMatcher::new(&registry)
    }

    // -----------------------------------------------------------------------
    // weighted registry matching
    // -----------------------------------------------------------------------

    #[test]
    fn pattern_match_confirms_at_registry_confidence() {
        let m = matcher(
            "brands:\n  netflix:\n    category: entertainment\n    patterns: [netflix]\n",
        );
        let got = m.detect("your netflix plan was renewed", "", "", "");
        assert_eq!(got.brand.as_deref(), Some("netflix"));
        assert_eq!(got.category, "entertainment");
        assert!((got.confidence - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn score_exactly_at_threshold_is_accepted() {
        let m = matcher(
            "brands:\n  acme:\n    category: others\n    patterns: [acme]\n    score_weights:\n      pattern: 0.35\n",
        );
        let got = m.detect("acme order shipped", "", "", "");
        assert_eq!(got.brand.as_deref(), Some("acme"));
    }

    #[test]
    fn score_just_below_threshold_is_rejected() {
        let m = matcher(
            "brands:\n  acme:\n    category: others\n    patterns: [acme]\n    score_weights:\n      pattern: 0.349\n",
        );
        let got = m.detect("acme order shipped", "", "", "");
        assert_eq!(got.brand, None);
        assert_eq!(got.category, "others");
        assert!((got.confidence - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sender_and_subject_signals_add_up() {
        let m = matcher(
            "brands:\n  zomato:\n    category: food\n    sender_domains: [zomato.com]\n    subject_contains: [zomato]\n",
        );
        // 0.3 + 0.2 = 0.5 without any pattern hit.
        let got = m.detect("", "", "noreply@zomato.com", "Your Zomato order");
        assert_eq!(got.brand.as_deref(), Some("zomato"));
    }

    #[test]
    fn higher_priority_wins_an_exact_tie() {
        let m = matcher(
            "brands:\n  acme:\n    category: others\n    patterns: [shipped]\n  blaster:\n    category: others\n    patterns: [shipped]\n    priority: 5\n",
        );
        let got = m.detect("your parcel shipped", "", "", "");
        assert_eq!(got.brand.as_deref(), Some("blaster"));
    }

    #[test]
    fn equal_score_and_priority_keep_name_order() {
        let m = matcher(
            "brands:\n  zeta:\n    category: others\n    patterns: [shipped]\n  alpha:\n    category: others\n    patterns: [shipped]\n",
        );
        let got = m.detect("your parcel shipped", "", "", "");
        assert_eq!(got.brand.as_deref(), Some("alpha"));
    }

    #[test]
    fn unparseable_pattern_is_skipped_not_fatal() {
        let m = matcher(
            "brands:\n  acme:\n    category: others\n    patterns: [\"[unclosed\", acme]\n",
        );
        let got = m.detect("acme order shipped", "", "", "");
        assert_eq!(got.brand.as_deref(), Some("acme"));
    }

    // -----------------------------------------------------------------------
    // gateway override
    // -----------------------------------------------------------------------

    #[test]
    fn merchant_overrides_gateway_at_fixed_confidence() {
        let m = matcher(
            "brands:\n  netflix:\n    category: entertainment\n    patterns: [netflix]\n  stripe:\n    category: payments\n    patterns: [stripe]\n    sender_domains: [stripe.com]\n",
        );
        let got = m.detect(
            "stripe receipt for your netflix plan",
            "",
            "receipts@stripe.com",
            "",
        );
        assert_eq!(got.brand.as_deref(), Some("netflix"));
        assert_eq!(got.category, "entertainment");
        assert!((got.confidence - 0.98).abs() < f64::EPSILON);
    }

    #[test]
    fn gateway_stands_when_no_merchant_pattern_matches() {
        let m = matcher(
            "brands:\n  netflix:\n    category: entertainment\n    patterns: [netflix]\n  stripe:\n    category: payments\n    patterns: [stripe]\n",
        );
        let got = m.detect("stripe receipt for your gym", "", "", "");
        assert_eq!(got.brand.as_deref(), Some("stripe"));
        assert!((got.confidence - 0.95).abs() < f64::EPSILON);
    }

    // -----------------------------------------------------------------------
    // fallback chain
    // -----------------------------------------------------------------------

    #[test]
    fn sender_domain_fallback_strips_subdomains() {
        let m = matcher("brands: {}\n");
        let got = m.detect("", "", "billing@mail.flipkart.com", "");
        assert_eq!(got.brand.as_deref(), Some("flipkart"));
        assert_eq!(got.category, "others");
        assert!((got.confidence - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn generic_sender_label_is_not_a_brand() {
        let m = matcher("brands: {}\n");
        let got = m.detect("", "", "noreply@mail.com", "");
        assert_eq!(got.brand, None);
    }

    #[test]
    fn capitalized_phrase_fallback_skips_blacklist() {
        assert_eq!(brand_from_text("Dear"), None);
        assert_eq!(
            brand_from_text("Spotify AB billed you"),
            Some("Spotify AB billed you".to_string())
        );
        assert_eq!(brand_from_text("nothing capitalized here"), None);
    }

    #[test]
    fn phrase_fallback_reads_subject_before_body_text() {
        let m = matcher("brands: {}\n");
        // The greedy phrase scan runs over subject + text; punctuation in the
        // body stops it at the subject phrase.
        let got = m.detect("- monthly digest below", "", "", "Acme Labs statement");
        assert_eq!(got.brand.as_deref(), Some("Acme Labs statement"));
        assert!((got.confidence - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn logo_alt_text_is_the_last_inference() {
        let m = matcher("brands: {}\n");
        let html = r#"<img src="banner.png"><img src="logo.png" alt="Acme Corp">"#;
        let got = m.detect("all lowercase body", html, "", "");
        assert_eq!(got.brand.as_deref(), Some("Acme Corp"));
        assert!((got.confidence - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn wordy_alt_text_is_not_a_logo() {
        assert_eq!(
            brand_from_html(r#"<img alt="a very long promotional banner headline">"#),
            None
        );
        assert_eq!(brand_from_html(r#"<img alt="12345">"#), None);
        assert_eq!(brand_from_html(r#"<img alt="Acme">"#), Some("Acme".to_string()));
    }

    #[test]
    fn nothing_matches_nothing() {
        let m = matcher("brands: {}\n");
        let got = m.detect("plain words only", "", "", "");
        assert_eq!(got.brand, None);
        assert_eq!(got.category, "others");
        assert!((got.confidence - 0.0).abs() < f64::EPSILON);
    }
}
