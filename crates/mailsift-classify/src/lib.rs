//! Heuristic classification pipeline for receipt and subscription mail.
//!
//! Normalizes raw HTML bodies into lowercase text and HTML views, matches a
//! read-only brand registry with weighted scoring, extracts amount, date,
//! and billing frequency, and labels each mail `purchase`, `subscription`,
//! or `others` with calibrated confidences. Pattern matching only: no model,
//! no network. Every stage is a pure function of the mail, so batches can be
//! processed in any order or in parallel.

pub mod amount;
pub mod brand;
pub mod date;
pub mod frequency;
pub mod normalize;
pub mod pipeline;
pub mod receipt;

pub use amount::{extract_amount, is_valid_amount};
pub use brand::{BrandMatch, BrandMatcher};
pub use date::extract_date;
pub use frequency::extract_frequency;
pub use normalize::{join_broken_date_lines, join_digit_split_html, text_and_html_views};
pub use pipeline::Classifier;
pub use receipt::{classify_type, is_receipt, negation_confidence};
