use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::time;

/// One listing exactly as the fetch service reports it.
///
/// Every field is optional on the wire (the source page omits prices on
/// giveaway ads and images on fresh ones), but a listing without a URL has
/// no identity and is discarded before it enters the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

/// A listing as served to consumers.
///
/// The canonical listing URL is the identity: two records with the same
/// `id` are the same listing no matter how the source re-rendered title or
/// price in between.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub id: String,
    pub title: String,
    pub price: String,
    pub location: String,
    pub image_url: String,
    pub detail_text: String,
    pub raw_timestamp: String,
    pub parsed_timestamp: Option<DateTime<Utc>>,
}

impl ListingRecord {
    /// Promote a raw listing into a record, resolving its timestamp against
    /// `now`. Returns `None` for entries without a URL (no dedup key).
    pub fn from_raw<Tz: TimeZone>(raw: RawListing, now: &DateTime<Tz>) -> Option<Self> {
        let id = raw.url.filter(|u| !u.is_empty())?;
        let raw_timestamp = raw.time.unwrap_or_default();
        let parsed_timestamp =
            time::parse(&raw_timestamp, now.clone()).map(|dt| dt.with_timezone(&Utc));

        Some(Self {
            id,
            title: raw.title.unwrap_or_default(),
            price: raw.price.unwrap_or_default(),
            location: raw.location.unwrap_or_default(),
            image_url: raw.image.unwrap_or_default(),
            detail_text: raw.details.unwrap_or_default(),
            raw_timestamp,
            parsed_timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn raw_listing_without_url_is_discarded() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 20, 0, 0).unwrap();

        let raw = RawListing {
            title: Some("BMW 320d".to_string()),
            ..Default::default()
        };
        assert!(ListingRecord::from_raw(raw, &now).is_none());

        let raw = RawListing {
            url: Some(String::new()),
            ..Default::default()
        };
        assert!(ListingRecord::from_raw(raw, &now).is_none());
    }

    #[test]
    fn raw_listing_promotes_with_parsed_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 20, 0, 0).unwrap();

        let raw = RawListing {
            title: Some("BMW 320d".to_string()),
            price: Some("12.500 €".to_string()),
            url: Some("https://example.org/s-anzeige/bmw-320d/123".to_string()),
            time: Some("Heute, 14:05".to_string()),
            ..Default::default()
        };

        let record = ListingRecord::from_raw(raw, &now).unwrap();
        assert_eq!(record.id, "https://example.org/s-anzeige/bmw-320d/123");
        assert_eq!(
            record.parsed_timestamp,
            Some(Utc.with_ymd_and_hms(2024, 1, 10, 14, 5, 0).unwrap())
        );
        // missing fields degrade to empty strings, never to a drop
        assert_eq!(record.location, "");
        assert_eq!(record.detail_text, "");
    }

    #[test]
    fn record_serializes_camel_case() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 20, 0, 0).unwrap();
        let raw = RawListing {
            url: Some("https://example.org/a".to_string()),
            image: Some("https://img.example.org/a.jpg".to_string()),
            ..Default::default()
        };

        let record = ListingRecord::from_raw(raw, &now).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("imageUrl").is_some());
        assert!(json.get("rawTimestamp").is_some());
        assert!(json.get("image_url").is_none());
    }
}
