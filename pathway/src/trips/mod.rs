//! Trip types and operations.
//!
//! A trip is a titled date range owning an ordered list of stops
//! (see [`crate::locations`]). Deleting a trip deletes its stops.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PathwayError, Result};

pub mod crud;
pub mod ffi;

/// Longest title the create form accepts, in characters.
pub const MAX_TITLE_CHARS: usize = 50;

/// Calendar date format used for trip dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A stored trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// ISO 8601 calendar date (YYYY-MM-DD)
    pub start_date: String,
    /// ISO 8601 calendar date (YYYY-MM-DD)
    pub end_date: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Parameters for creating a new trip.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct CreateTripParams {
    pub title: String,
    pub description: Option<String>,
    pub start_date: String,
    pub end_date: String,
}

impl CreateTripParams {
    pub fn new(
        title: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks the store applies before inserting: a non-blank title and two
    /// well-formed dates. Date order is not checked here.
    pub fn check_required(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(PathwayError::invalid("title", "must not be empty"));
        }
        parse_date("start_date", &self.start_date)?;
        parse_date("end_date", &self.end_date)?;
        Ok(())
    }

    /// Full rule set of the create-trip form: required fields, a title of at
    /// most [`MAX_TITLE_CHARS`] characters and an end date not before the start.
    ///
    /// Callers run this before [`crate::TripDatabase::create_trip`]; the store
    /// itself only enforces [`check_required`](Self::check_required).
    pub fn validate(&self) -> Result<()> {
        self.check_required()?;

        let title_chars = self.title.trim().chars().count();
        if title_chars > MAX_TITLE_CHARS {
            return Err(PathwayError::invalid(
                "title",
                format!("{} characters, at most {} allowed", title_chars, MAX_TITLE_CHARS),
            ));
        }

        let start = parse_date("start_date", &self.start_date)?;
        let end = parse_date("end_date", &self.end_date)?;
        if end < start {
            return Err(PathwayError::invalid(
                "end_date",
                "end date cannot be before start date",
            ));
        }

        Ok(())
    }
}

/// Partial update of a trip. `None` leaves a field untouched.
///
/// An empty `description` clears it.
#[derive(Debug, Clone, Default, PartialEq, uniffi::Record)]
pub struct TripUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl TripUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    pub(crate) fn check(&self) -> Result<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(PathwayError::invalid("title", "must not be empty"));
            }
        }
        if let Some(date) = &self.start_date {
            parse_date("start_date", date)?;
        }
        if let Some(date) = &self.end_date {
            parse_date("end_date", date)?;
        }
        Ok(())
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        PathwayError::invalid(
            field,
            format!("'{}' is not a YYYY-MM-DD date: {}", value, e),
        )
    })
}

/// Trim optional text; blank becomes `None`.
pub(crate) fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_required_rejects_blank_title() {
        let params = CreateTripParams::new("   ", "2024-05-01", "2024-05-03");
        let err = params.check_required().unwrap_err();
        assert!(matches!(err, PathwayError::InvalidInput { field: "title", .. }));
    }

    #[test]
    fn test_check_required_rejects_malformed_date() {
        let params = CreateTripParams::new("Cappadocia", "01/05/2024", "2024-05-03");
        let err = params.check_required().unwrap_err();
        assert!(matches!(err, PathwayError::InvalidInput { field: "start_date", .. }));
    }

    #[test]
    fn test_check_required_allows_reversed_dates() {
        let params = CreateTripParams::new("Cappadocia", "2024-05-03", "2024-05-01");
        assert!(params.check_required().is_ok());
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_title_length() {
        let ok = CreateTripParams::new("a".repeat(MAX_TITLE_CHARS), "2024-05-01", "2024-05-01");
        assert!(ok.validate().is_ok());

        let long = CreateTripParams::new(
            "a".repeat(MAX_TITLE_CHARS + 1),
            "2024-05-01",
            "2024-05-01",
        );
        assert!(matches!(
            long.validate(),
            Err(PathwayError::InvalidInput { field: "title", .. })
        ));
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        // 50 two-byte characters
        let title = "ş".repeat(MAX_TITLE_CHARS);
        let params = CreateTripParams::new(title, "2024-05-01", "2024-05-02");
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_update_check() {
        assert!(TripUpdate::default().is_empty());
        assert!(TripUpdate::default().check().is_ok());

        let bad = TripUpdate {
            end_date: Some("tomorrow".to_string()),
            ..Default::default()
        };
        assert!(bad.check().is_err());
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text(Some("  hi ")), Some("hi".to_string()));
        assert_eq!(normalize_text(Some("   ")), None);
        assert_eq!(normalize_text(None), None);
    }
}
