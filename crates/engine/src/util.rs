//! Identifier, clock and text helpers shared by every repository.

use std::fmt::Debug;

use chrono::{DateTime, Months, Utc};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_SUFFIX_LEN: usize = 9;

/// Generates a record identifier: base-36 milliseconds since the epoch
/// followed by a 9 character random base-36 suffix.
///
/// Ids sort roughly by creation time and are unique in practical use; they are
/// not meant to be unguessable.
pub fn generate_id() -> String {
    generate_id_at(Utc::now())
}

pub(crate) fn generate_id_at(at: DateTime<Utc>) -> String {
    let millis = u128::try_from(at.timestamp_millis()).unwrap_or_default();
    let mut id = to_base36(millis);
    let random = to_base36(Uuid::new_v4().as_u128());
    id.extend(random.chars().take(RANDOM_SUFFIX_LEN));
    id
}

fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Last six characters of an id, used in generated descriptions (`Sale #a1b2c3`).
pub(crate) fn short_id(id: &str) -> &str {
    let start = id.len().saturating_sub(6);
    id.get(start..).unwrap_or(id)
}

/// Source of "now" for timestamps and calendar based statistics.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// The host clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a given instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Adds calendar months, clamping to the last day of the target month
/// (Jan 31 + 1 month = Feb 28/29).
pub(crate) fn add_months(at: DateTime<Utc>, months: u32) -> ResultEngine<DateTime<Utc>> {
    at.checked_add_months(Months::new(months))
        .ok_or_else(|| EngineError::InvalidInput(format!("date out of range: {at} + {months}m")))
}

pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// `None` keeps the stored value, `Some("")` clears it.
pub(crate) fn apply_optional_text_patch(
    existing: Option<String>,
    patch: Option<&str>,
) -> Option<String> {
    match patch {
        None => existing,
        Some(value) => normalize_optional_text(Some(value)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn ids_are_unique_and_time_prefixed() {
        let at = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
        let a = generate_id_at(at);
        let b = generate_id_at(at);
        assert_ne!(a, b);
        let prefix = to_base36(at.timestamp_millis() as u128);
        assert!(a.starts_with(&prefix));
        assert_eq!(a.len(), prefix.len() + RANDOM_SUFFIX_LEN);
    }

    #[test]
    fn add_months_clamps_to_month_end() {
        let jan31 = Utc.with_ymd_and_hms(2024, 1, 31, 10, 0, 0).unwrap();
        let feb = add_months(jan31, 1).unwrap();
        assert_eq!(feb, Utc.with_ymd_and_hms(2024, 2, 29, 10, 0, 0).unwrap());
    }

    #[test]
    fn short_id_takes_last_six() {
        assert_eq!(short_id("abcdefghij"), "efghij");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn optional_text_patch_semantics() {
        let existing = Some("old".to_string());
        assert_eq!(apply_optional_text_patch(existing.clone(), None), existing);
        assert_eq!(apply_optional_text_patch(existing.clone(), Some("  ")), None);
        assert_eq!(
            apply_optional_text_patch(existing, Some(" new ")),
            Some("new".to_string())
        );
    }
}
