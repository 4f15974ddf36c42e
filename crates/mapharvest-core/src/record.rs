use serde::{Deserialize, Serialize};

/// One business harvested from a result card's detail panel.
///
/// `name` is always non-empty for records that leave the harvest loop; the
/// optional fields are `None` when the detail panel had no matching fragment
/// or the fragment sanitized to an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRecord {
    pub name: String,
    pub address: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub location_code: Option<String>,
}

impl BusinessRecord {
    /// Column headers in export order, matching the serialized field names.
    pub const COLUMNS: [&'static str; 5] = ["name", "address", "website", "phone", "locationCode"];

    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            website: None,
            phone: None,
            location_code: None,
        }
    }

    /// Cell values in the same order as [`Self::COLUMNS`]; absent fields are empty.
    #[must_use]
    pub fn cells(&self) -> [&str; 5] {
        [
            self.name.as_str(),
            self.address.as_deref().unwrap_or_default(),
            self.website.as_deref().unwrap_or_default(),
            self.phone.as_deref().unwrap_or_default(),
            self.location_code.as_deref().unwrap_or_default(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_field_names() {
        let record = BusinessRecord {
            location_code: Some("7HQM+2F Dubai".to_string()),
            ..BusinessRecord::named("Jumeirah Clinic")
        };
        let json = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(json["name"], "Jumeirah Clinic");
        assert_eq!(json["locationCode"], "7HQM+2F Dubai");
        assert!(json["address"].is_null());
    }

    #[test]
    fn cells_follow_column_order() {
        let record = BusinessRecord {
            address: Some("1 Beach Rd".to_string()),
            phone: Some("+971 4 000 0000".to_string()),
            ..BusinessRecord::named("Clinic")
        };
        assert_eq!(
            record.cells(),
            ["Clinic", "1 Beach Rd", "", "+971 4 000 0000", ""]
        );
    }
}
