use mapharvest_core::BusinessRecord;

/// Ordered, optionally capped collection of harvested records.
///
/// Records with an empty name are rejected; nothing else is deduplicated, so
/// visiting the same business twice yields two entries.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    records: Vec<BusinessRecord>,
    cap: Option<usize>,
}

impl ResultSet {
    #[must_use]
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            records: Vec::new(),
            cap,
        }
    }

    #[must_use]
    pub fn cap(&self) -> Option<usize> {
        self.cap
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Slots left before the cap is reached; `None` when uncapped.
    #[must_use]
    pub fn remaining_capacity(&self) -> Option<usize> {
        self.cap.map(|cap| cap.saturating_sub(self.records.len()))
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cap.is_some_and(|cap| self.records.len() >= cap)
    }

    /// Appends `record` unless its name is empty. Returns whether it was kept.
    pub fn push(&mut self, record: BusinessRecord) -> bool {
        if record.name.is_empty() {
            return false;
        }
        self.records.push(record);
        true
    }

    #[must_use]
    pub fn records(&self) -> &[BusinessRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<BusinessRecord> {
        self.records
    }
}
