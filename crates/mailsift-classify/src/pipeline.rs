//! Per-mail classification pipeline.

use mailsift_core::{BrandRegistry, Classification, ExtractedFields, MailRecord, MailType};

use crate::amount::{extract_amount, round3};
use crate::brand::BrandMatcher;
use crate::date::extract_date;
use crate::frequency::extract_frequency;
use crate::normalize::text_and_html_views;
use crate::receipt::{classify_type, negation_confidence};

/// A compiled, reusable classifier.
///
/// Built once per registry (brand regexes are compiled at construction) and
/// then shared: `classify` is a pure function of the mail, so a batch may be
/// mapped over concurrently through a shared reference without any locking.
pub struct Classifier {
    matcher: BrandMatcher,
}

impl Classifier {
    #[must_use]
    pub fn new(registry: &BrandRegistry) -> Self {
        Self {
            matcher: BrandMatcher::new(registry),
        }
    }

    /// Classify one mail into its derived record.
    ///
    /// Runs the stages in fixed order: normalize the body, identify the
    /// brand (the raw body is kept for the HTML fallbacks), label the type,
    /// then extract amount, date, and — for subscriptions — frequency. For
    /// `others` mails the overall confidence is the negation confidence; for
    /// the rest it is the mean of the amount and date confidences, with the
    /// frequency confidence deliberately left out of the average.
    #[must_use]
    pub fn classify(&self, mail: &MailRecord) -> Classification {
        let sender = mail.sender.to_lowercase();
        let subject = mail.subject.to_lowercase();
        let (html, text) = text_and_html_views(&mail.body);

        let brand = self.matcher.detect(&text, &mail.body, &sender, &subject);
        let mail_type = classify_type(&text, &html, &subject);

        tracing::debug!(
            brand = brand.brand.as_deref().unwrap_or("-"),
            mail_type = %mail_type,
            "classified mail"
        );

        if mail_type == MailType::Others {
            return Classification {
                brand: brand.brand,
                category: brand.category,
                mail_type,
                fields: ExtractedFields::Others {},
                overall_confidence: negation_confidence(&text, &html, &subject),
            };
        }

        let (amount, amount_confidence) = match extract_amount(&text, &html, &subject) {
            Some((amount, confidence)) => (Some(amount), confidence),
            None => (None, 0.0),
        };
        let (date, date_confidence) = match extract_date(&text, &html, &mail.meta_date, &subject) {
            Some((date, confidence)) => (Some(date), confidence),
            None => (None, 0.0),
        };

        let overall_confidence = round3((amount_confidence + date_confidence) / 2.0);

        let fields = if mail_type == MailType::Subscription {
            let (frequency, frequency_confidence) = match extract_frequency(&text) {
                Some((frequency, confidence)) => (Some(frequency), confidence),
                None => (None, 0.0),
            };
            ExtractedFields::Subscription {
                amount,
                amount_confidence,
                start_date: date,
                start_date_confidence: date_confidence,
                frequency,
                frequency_confidence,
            }
        } else {
            ExtractedFields::Purchase {
                amount,
                amount_confidence,
                date,
                date_confidence,
            }
        };

        Classification {
            brand: brand.brand,
            category: brand.category,
            mail_type,
            fields,
            overall_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use mailsift_core::Frequency;

    use super::*;

    fn classifier(yaml: &str) -> Classifier {
        let registry: BrandRegistry = serde_yaml::from_str(yaml).expect("valid test registry");
        Classifier::new(&registry)
    }

    fn mail(sender: &str, subject: &str, meta_date: &str, body: &str) -> MailRecord {
        MailRecord {
            sender: sender.to_string(),
            subject: subject.to_string(),
            meta_date: meta_date.to_string(),
            body: body.to_string(),
        }
    }

    const SHOP_REGISTRY: &str = "brands:\n  flipkart:\n    category: shopping\n    sender_domains: [flipkart.com]\n";

    #[test]
    fn order_confirmation_becomes_a_purchase() {
        let c = classifier(SHOP_REGISTRY);
        let got = c.classify(&mail(
            "billing@flipkart.com",
            "Your order confirmation",
            "Fri, 14 Nov 2025",
            "Total: Rs. 1500",
        ));

        assert_eq!(got.brand.as_deref(), Some("flipkart"));
        assert_eq!(got.mail_type, MailType::Purchase);
        let ExtractedFields::Purchase {
            amount,
            amount_confidence,
            date,
            date_confidence,
        } = got.fields
        else {
            panic!("expected purchase fields");
        };
        assert_eq!(amount.as_deref(), Some("1500.0"));
        assert!((amount_confidence - 0.9).abs() < f64::EPSILON);
        // No date in the body; the receipt-like subject trusts the header.
        assert_eq!(date.as_deref(), Some("Fri, 14 Nov 2025"));
        assert!((date_confidence - 0.5).abs() < f64::EPSILON);
        assert!((got.overall_confidence - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn promotional_blast_is_rejected_with_high_negation_confidence() {
        let c = classifier(SHOP_REGISTRY);
        let got = c.classify(&mail(
            "deals@shopmax.com",
            "50% OFF sale this week!",
            "",
            "<p>Save big on everything!</p>",
        ));

        assert_eq!(got.mail_type, MailType::Others);
        assert!(matches!(got.fields, ExtractedFields::Others {}));
        assert!(
            got.overall_confidence >= 0.8,
            "negation confidence too low: {}",
            got.overall_confidence
        );
    }

    #[test]
    fn renewal_mail_becomes_a_subscription_with_frequency() {
        let c = classifier(
            "brands:\n  netflix:\n    category: entertainment\n    patterns: [netflix]\n",
        );
        let body = "Your Netflix subscription renewal: Rs. 649 was charged on 14/11/2025. \
                    Next billing date: 14/12/2025.";
        let got = c.classify(&mail("info@netflix.com", "Payment receipt", "", body));

        assert_eq!(got.brand.as_deref(), Some("netflix"));
        assert_eq!(got.mail_type, MailType::Subscription);
        let ExtractedFields::Subscription {
            amount,
            amount_confidence,
            start_date,
            start_date_confidence,
            frequency,
            frequency_confidence,
        } = got.fields
        else {
            panic!("expected subscription fields");
        };
        assert_eq!(amount.as_deref(), Some("649.0"));
        assert!((amount_confidence - 0.9).abs() < f64::EPSILON);
        assert_eq!(start_date.as_deref(), Some("14/11/2025"));
        assert!((start_date_confidence - 0.8).abs() < f64::EPSILON);
        assert_eq!(frequency, Some(Frequency::Monthly));
        assert!((frequency_confidence - 0.75).abs() < f64::EPSILON);
        // Frequency confidence is not averaged in.
        assert!((got.overall_confidence - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn recurring_wording_overrides_a_non_receipt() {
        let c = classifier("brands: {}\n");
        let got = c.classify(&mail("", "", "", "your auto-renew preference was updated"));
        assert_eq!(got.mail_type, MailType::Subscription);
    }

    #[test]
    fn classification_is_deterministic() {
        let c = classifier(SHOP_REGISTRY);
        let record = mail(
            "billing@flipkart.com",
            "Your order confirmation",
            "Fri, 14 Nov 2025",
            "<div>Total: <span>1</span><span>5</span><span>0</span><span>0</span> Rs</div>",
        );
        let first = serde_json::to_string(&c.classify(&record)).unwrap();
        let second = serde_json::to_string(&c.classify(&record)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn gateway_mail_reports_the_merchant() {
        let c = classifier(
            "brands:\n  spotify:\n    category: entertainment\n    patterns: [spotify]\n  razorpay:\n    category: payments\n    patterns: [razorpay]\n    sender_domains: [razorpay.com]\n",
        );
        let got = c.classify(&mail(
            "no-reply@razorpay.com",
            "Payment successful",
            "",
            "razorpay payment for spotify premium, total rs. 119",
        ));
        assert_eq!(got.brand.as_deref(), Some("spotify"));
        assert_eq!(got.category, "entertainment");
    }
}
