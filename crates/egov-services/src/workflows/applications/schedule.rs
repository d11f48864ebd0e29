//! Reference-number and schedule generation applied at submission time.
//!
//! All lookups key off the lower-cased service type. Unknown service types
//! fall through to defaults rather than failing, so a new service can be
//! onboarded before its tables are extended.

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use rand::Rng;

/// Short reference prefix for a service type.
pub fn service_prefix(service_type: &str) -> &'static str {
    match service_type.trim().to_lowercase().as_str() {
        "smart id" | "smart id renewal" | "smart id application" => "ID",
        "passport" | "passport application" => "PA",
        "learner's licence" | "learners licence application" => "LL",
        "driving licence" | "driving license renewal" => "DL",
        "birth certificate" => "BC",
        "tax return" | "tax return filing" => "TAX",
        "business license" | "business license application" => "BUS",
        "vehicle registration" => "VR",
        _ => "APP",
    }
}

/// Human-shareable reference code: prefix plus a random four-digit suffix.
///
/// Uniqueness is NOT guaranteed here; the lifecycle service retries on a
/// storage conflict with a freshly generated code.
pub fn generate_reference_number(service_type: &str) -> String {
    let suffix = rand::thread_rng().gen_range(1000..=9999);
    format!("{}{}", service_prefix(service_type), suffix)
}

/// Workflow step label an application starts in.
pub fn initial_step(service_type: &str) -> &'static str {
    match service_type.trim().to_lowercase().as_str() {
        "smart id" | "smart id renewal" | "smart id application" => "Document Verification",
        "passport" | "passport application" => "Application Review",
        "learner's licence" | "learners licence application" => "Appointment Scheduled",
        "tax return" | "tax return filing" => "Document Verification",
        _ => "Submitted",
    }
}

/// Advertised processing time in days.
pub fn processing_days(service_type: &str) -> i64 {
    match service_type.trim().to_lowercase().as_str() {
        "smart id" | "smart id renewal" | "smart id application" => 14,
        "passport" | "passport application" => 21,
        "learner's licence" | "learners licence application" => 7,
        "driving licence" | "driving license renewal" => 10,
        "birth certificate" => 14,
        "tax return" | "tax return filing" => 21,
        _ => 14,
    }
}

/// Target completion date: `now` plus the processing window, rolled forward
/// one day at a time until it lands on a weekday. No holiday calendar.
pub fn expected_completion(service_type: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let mut expected = now + Duration::days(processing_days(service_type));
    while matches!(expected.weekday(), Weekday::Sat | Weekday::Sun) {
        expected += Duration::days(1);
    }
    expected
}
