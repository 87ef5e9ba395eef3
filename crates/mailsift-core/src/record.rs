use serde::{Deserialize, Serialize};

/// One raw mail, as handed to the classification pipeline.
///
/// `meta_date` is the free-text date header from the mail's metadata; it is
/// not guaranteed to parse and is only used as a last-resort date fallback.
/// `body` is raw HTML, possibly malformed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailRecord {
    pub sender: String,
    pub subject: String,
    pub meta_date: String,
    pub body: String,
}

/// Terminal classification label for a mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailType {
    Purchase,
    Subscription,
    Others,
}

impl std::fmt::Display for MailType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MailType::Purchase => write!(f, "purchase"),
            MailType::Subscription => write!(f, "subscription"),
            MailType::Others => write!(f, "others"),
        }
    }
}

/// Billing frequency of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Monthly,
    Yearly,
    Quarterly,
    SemiAnnual,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Yearly => write!(f, "yearly"),
            Frequency::Quarterly => write!(f, "quarterly"),
            Frequency::SemiAnnual => write!(f, "semi_annual"),
        }
    }
}

/// Extraction results whose presence depends on the classified type.
///
/// `others` mails carry no extracted fields at all; `purchase` mails carry an
/// amount and a transaction date; `subscription` mails carry an amount, a
/// start date, and a billing frequency. Extractors that found nothing leave
/// the value absent with its confidence at `0.0`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ExtractedFields {
    Others {},
    Purchase {
        amount: Option<String>,
        amount_confidence: f64,
        date: Option<String>,
        date_confidence: f64,
    },
    Subscription {
        amount: Option<String>,
        amount_confidence: f64,
        start_date: Option<String>,
        start_date_confidence: f64,
        frequency: Option<Frequency>,
        frequency_confidence: f64,
    },
}

/// Derived fields produced by one classification pass over a mail.
///
/// Annotated exactly once, in fixed order (brand, type, extracted fields,
/// overall confidence), then handed back for persistence. For `others` mails
/// `overall_confidence` is the negation confidence — the certainty that the
/// non-receipt call is correct; for the other types it is the mean of the
/// amount and date confidences.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub brand: Option<String>,
    pub category: String,
    #[serde(rename = "type")]
    pub mail_type: MailType,
    #[serde(flatten)]
    pub fields: ExtractedFields,
    pub overall_confidence: f64,
}
