//! Field extraction from a rendered detail panel.
//!
//! The panel exposes a flat list of text fragments, each tagged with a
//! classification attribute (a tooltip such as `Copy address`). A fixed
//! classification → field table decides which fragment fills which field.
//! The business name comes from the panel heading, which is not one of the
//! classified fragments.

use mapharvest_core::BusinessRecord;

use crate::error::PageError;
use crate::page::PageCapability;
use crate::sanitize::sanitize;
use crate::settings::Selectors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Address,
    Website,
    Phone,
    LocationCode,
}

impl FieldKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::Address => "address",
            FieldKey::Website => "website",
            FieldKey::Phone => "phone",
            FieldKey::LocationCode => "locationCode",
        }
    }
}

/// Classification value → field table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    entries: Vec<(String, FieldKey)>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self::new([
            ("Copy address", FieldKey::Address),
            ("Open website", FieldKey::Website),
            ("Copy phone number", FieldKey::Phone),
            ("Copy plus code", FieldKey::LocationCode),
        ])
    }
}

impl FieldMapping {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldKey)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(classification, key)| (classification.into(), key))
                .collect(),
        }
    }

    #[must_use]
    pub fn field_for(&self, classification: &str) -> Option<FieldKey> {
        self.entries
            .iter()
            .find(|(c, _)| c == classification)
            .map(|(_, key)| *key)
    }
}

/// One classified text fragment from the detail panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub classification: Option<String>,
    pub text: String,
}

impl Fragment {
    pub fn new(classification: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            classification: Some(classification.into()),
            text: text.into(),
        }
    }
}

/// The parts of a detail panel that extraction reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailDocument {
    pub heading: Option<String>,
    pub fragments: Vec<Fragment>,
}

impl DetailDocument {
    /// Reads the heading and classified fragments currently on the page.
    ///
    /// # Errors
    ///
    /// Propagates any [`PageError`] from the underlying queries.
    pub async fn read<P>(page: &P, selectors: &Selectors) -> Result<Self, PageError>
    where
        P: PageCapability + ?Sized,
    {
        let heading = page
            .query_all(&selectors.heading, &[])
            .await?
            .into_iter()
            .next()
            .map(|el| el.text);

        let attribute = selectors.classification_attribute.as_str();
        let fragments = page
            .query_all(&selectors.fragments, &[attribute])
            .await?
            .into_iter()
            .map(|el| Fragment {
                classification: el.attribute(attribute).map(str::to_owned),
                text: el.text,
            })
            .collect();

        Ok(Self { heading, fragments })
    }

    /// Whether the heading is present and at least one fragment maps to a field.
    #[must_use]
    pub fn has_content(&self, mapping: &FieldMapping) -> bool {
        self.heading.as_deref().is_some_and(|h| !h.trim().is_empty())
            && self.fragments.iter().any(|f| {
                f.classification
                    .as_deref()
                    .and_then(|c| mapping.field_for(c))
                    .is_some()
            })
    }
}

/// Unsanitized values pulled from a detail panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    /// Heading text; empty when the panel has no heading.
    pub business_name: String,
    pub address: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub location_code: Option<String>,
}

impl RawFields {
    #[must_use]
    pub fn get(&self, key: FieldKey) -> Option<&str> {
        match key {
            FieldKey::Address => self.address.as_deref(),
            FieldKey::Website => self.website.as_deref(),
            FieldKey::Phone => self.phone.as_deref(),
            FieldKey::LocationCode => self.location_code.as_deref(),
        }
    }

    fn slot_mut(&mut self, key: FieldKey) -> &mut Option<String> {
        match key {
            FieldKey::Address => &mut self.address,
            FieldKey::Website => &mut self.website,
            FieldKey::Phone => &mut self.phone,
            FieldKey::LocationCode => &mut self.location_code,
        }
    }

    /// Sanitizes every field and builds a record.
    ///
    /// Returns `None` when the sanitized name is empty. Optional fields that
    /// sanitize to an empty string become `None`.
    #[must_use]
    pub fn into_record(self) -> Option<BusinessRecord> {
        let name = sanitize(Some(&self.business_name));
        if name.is_empty() {
            return None;
        }
        let clean = |value: Option<String>| {
            let cleaned = sanitize(value.as_deref());
            (!cleaned.is_empty()).then_some(cleaned)
        };
        Some(BusinessRecord {
            name,
            address: clean(self.address),
            website: clean(self.website),
            phone: clean(self.phone),
            location_code: clean(self.location_code),
        })
    }
}

/// Maps a detail document onto [`RawFields`].
///
/// When several fragments share a classification the last one wins; each
/// overwrite is logged at debug level.
#[must_use]
pub fn extract(document: &DetailDocument, mapping: &FieldMapping) -> RawFields {
    let mut fields = RawFields {
        business_name: document.heading.clone().unwrap_or_default(),
        ..RawFields::default()
    };

    for fragment in &document.fragments {
        let Some(key) = fragment
            .classification
            .as_deref()
            .and_then(|c| mapping.field_for(c))
        else {
            continue;
        };

        let slot = fields.slot_mut(key);
        if let Some(previous) = slot.as_deref() {
            tracing::debug!(
                field = key.as_str(),
                previous,
                replacement = fragment.text.as_str(),
                "duplicate classified fragment; keeping the later one"
            );
        }
        *slot = Some(fragment.text.clone());
    }

    fields
}
