use serde::{Deserialize, Serialize};

use super::types::ListingRecord;

/// Search criteria, shared verbatim between the pull query string and the
/// push-channel filter message. Field names are the wire vocabulary of the
/// source; absent fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preis_von: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preis_bis: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub km_von: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub km_bis: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ez_von: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ez_bis: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ps_von: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ps_bis: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kraftstoff: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub getriebe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zustand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farbe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundesland: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anbieter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angebot: Option<String>,
}

/// Wire names of every criteria field, one per struct field above.
const CRITERIA_FIELDS: &[&str] = &[
    "marke",
    "modell",
    "preis_von",
    "preis_bis",
    "km_von",
    "km_bis",
    "ez_von",
    "ez_bis",
    "ps_von",
    "ps_bis",
    "kraftstoff",
    "getriebe",
    "zustand",
    "typ",
    "farbe",
    "bundesland",
    "anbieter",
    "angebot",
];

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        *self == FilterSet::default()
    }

    /// Whether `key` names a criteria field. Lets callers tell a bare
    /// criteria object apart from unrelated JSON that happens to be an
    /// object.
    pub fn is_criteria_field(key: &str) -> bool {
        CRITERIA_FIELDS.contains(&key)
    }

    /// Decide whether a single record satisfies these criteria.
    ///
    /// Text criteria match case-insensitively against title, location and
    /// detail text; price bounds against the numeric part of the price
    /// string (a record whose price cannot be read is excluded once price
    /// bounds are set). Mileage, first-registration and power ranges are
    /// enforced at fetch time through the fetch-service query; the record
    /// carries no structured fields to re-check them against.
    pub fn matches_record(&self, record: &ListingRecord) -> bool {
        let haystack = format!(
            "{} {} {}",
            record.title, record.location, record.detail_text
        )
        .to_lowercase();

        let text_criteria = [
            &self.marke,
            &self.modell,
            &self.kraftstoff,
            &self.getriebe,
            &self.zustand,
            &self.typ,
            &self.farbe,
            &self.bundesland,
            &self.anbieter,
            &self.angebot,
        ];
        for criterion in text_criteria.into_iter().flatten() {
            if !haystack.contains(&criterion.to_lowercase()) {
                return false;
            }
        }

        if self.preis_von.is_some() || self.preis_bis.is_some() {
            match extract_price(&record.price) {
                Some(price) => {
                    if let Some(min) = self.preis_von {
                        if price < min {
                            return false;
                        }
                    }
                    if let Some(max) = self.preis_bis {
                        if price > max {
                            return false;
                        }
                    }
                }
                None => return false,
            }
        }

        true
    }
}

/// First integer in a price string, tolerating thousands separators:
/// "12.500 € VB" -> 12500, "Zu verschenken" -> None.
pub fn extract_price(price: &str) -> Option<u32> {
    let mut digits = String::new();
    let mut chars = price.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !digits.is_empty() {
            if c == '.' && chars.peek().map_or(false, |n| n.is_ascii_digit()) {
                continue;
            }
            break;
        }
    }

    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, price: &str, location: &str, details: &str) -> ListingRecord {
        ListingRecord {
            id: format!("https://example.org/{}", title),
            title: title.to_string(),
            price: price.to_string(),
            location: location.to_string(),
            image_url: String::new(),
            detail_text: details.to_string(),
            raw_timestamp: String::new(),
            parsed_timestamp: None,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = FilterSet::default();
        assert!(filter.is_empty());
        assert!(filter.matches_record(&record("BMW 320d", "12.500 €", "Hamburg", "")));
    }

    #[test]
    fn brand_matches_case_insensitively_across_fields() {
        let filter = FilterSet {
            marke: Some("bmw".to_string()),
            ..Default::default()
        };
        assert!(filter.matches_record(&record("BMW 320d Touring", "9.900 €", "Berlin", "")));
        assert!(filter.matches_record(&record("Kombi", "9.900 €", "Berlin", "Gepflegter BMW")));
        assert!(!filter.matches_record(&record("Audi A4", "9.900 €", "Berlin", "")));
    }

    #[test]
    fn price_bounds_use_the_numeric_part() {
        let filter = FilterSet {
            preis_von: Some(5_000),
            preis_bis: Some(15_000),
            ..Default::default()
        };
        assert!(filter.matches_record(&record("BMW", "12.500 € VB", "", "")));
        assert!(!filter.matches_record(&record("BMW", "4.999 €", "", "")));
        assert!(!filter.matches_record(&record("BMW", "15.001 €", "", "")));
        // unreadable price cannot prove the bounds -> excluded
        assert!(!filter.matches_record(&record("BMW", "Zu verschenken", "", "")));
    }

    #[test]
    fn unreadable_price_passes_without_price_bounds() {
        let filter = FilterSet {
            marke: Some("BMW".to_string()),
            ..Default::default()
        };
        assert!(filter.matches_record(&record("BMW", "VB", "", "")));
    }

    #[test]
    fn extract_price_handles_separators() {
        assert_eq!(extract_price("12.500 €"), Some(12_500));
        assert_eq!(extract_price("1.234.567 €"), Some(1_234_567));
        assert_eq!(extract_price("950 € VB"), Some(950));
        assert_eq!(extract_price("1,50 €"), Some(1));
        assert_eq!(extract_price("Zu verschenken"), None);
        assert_eq!(extract_price(""), None);
    }

    #[test]
    fn criteria_field_names_match_the_struct() {
        let full = FilterSet {
            marke: Some("bmw".to_string()),
            modell: Some("320d".to_string()),
            preis_von: Some(1),
            preis_bis: Some(2),
            km_von: Some(3),
            km_bis: Some(4),
            ez_von: Some(2010),
            ez_bis: Some(2020),
            ps_von: Some(100),
            ps_bis: Some(200),
            kraftstoff: Some("diesel".to_string()),
            getriebe: Some("automatik".to_string()),
            zustand: Some("gebraucht".to_string()),
            typ: Some("kombi".to_string()),
            farbe: Some("blau".to_string()),
            bundesland: Some("bayern".to_string()),
            anbieter: Some("privat".to_string()),
            angebot: Some("angebote".to_string()),
        };

        let json = serde_json::to_value(&full).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), CRITERIA_FIELDS.len());
        for key in object.keys() {
            assert!(
                FilterSet::is_criteria_field(key),
                "field {key} missing from CRITERIA_FIELDS"
            );
        }
        assert!(!FilterSet::is_criteria_field("ping"));
    }

    #[test]
    fn query_string_round_trip() {
        let filter: FilterSet =
            serde_json::from_str(r#"{"marke":"bmw","preis_bis":20000}"#).unwrap();
        assert_eq!(filter.marke.as_deref(), Some("bmw"));
        assert_eq!(filter.preis_bis, Some(20_000));
        assert!(!filter.is_empty());

        // absent criteria stay off the wire
        let json = serde_json::to_string(&filter).unwrap();
        assert!(!json.contains("modell"));
    }
}
