// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use gridscope_app::{DetailPayload, FieldValue, Fields, Row, RowKey};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// `(key, type, label)` descriptors of the deal grid columns.
const COLUMN_CATALOG: [(&str, &str, &str); 10] = [
    ("id", "int", "ID"),
    ("issuer_name", "string", "Issuer"),
    ("deal_name", "string", "Deal"),
    ("bloomber_id", "string", "Bloomberg ID"),
    ("total", "decimal", "Total"),
    ("industry", "string", "Industry"),
    ("status", "string", "Status"),
    ("analysts", "string[]", "Analysts"),
    ("doc_count", "int", "Docs"),
    ("custom_deal_identifiers", "string[]", "Identifiers"),
];

const ISSUERS: [&str; 10] = [
    "Northwind Capital",
    "Harbor Freight Trust",
    "Summit Energy",
    "Apex Holdings",
    "Bluewater Partners",
    "Cedar Lane Finance",
    "Granite Works",
    "Meridian Health",
    "Orchard Foods",
    "Pioneer Transit",
];

const DEAL_WORDS: [&str; 10] = [
    "Senior", "Secured", "Term", "Bridge", "Revolver", "Tranche", "Notes", "Facility", "Loan",
    "Refi",
];

const INDUSTRIES: [&str; 8] = [
    "Energy",
    "Healthcare",
    "Industrials",
    "Retail",
    "Technology",
    "Transportation",
    "Utilities",
    "Media",
];

const STATUSES: [&str; 5] = ["Draft", "Pending", "Approved", "Closed", "Withdrawn"];

const ANALYSTS: [&str; 8] = [
    "Avery Walker",
    "Jordan Hill",
    "Taylor Evans",
    "Riley Lopez",
    "Morgan Gray",
    "Casey Ward",
    "Quinn Reed",
    "Parker Diaz",
];

const ASSIGNEES: [&str; 3] = ["John Doe", "Jane Smith", "Bob Johnson"];
const PRIORITIES: [&str; 3] = ["Low", "Medium", "High"];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator for grid rows and detail payloads.
#[derive(Debug, Clone)]
pub struct GridFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl GridFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Deal rows keyed `0..count`, one value per catalog column.
    pub fn deal_rows(&mut self, count: usize) -> Vec<Row> {
        (0..count).map(|index| self.deal_row(index)).collect()
    }

    pub fn deal_row(&mut self, index: usize) -> Row {
        let issuer = self.pick(&ISSUERS);
        let first_word = self.pick(&DEAL_WORDS);
        let second_word = self.pick(&DEAL_WORDS);
        let year = 2020 + self.int_range(0, 6);
        let analyst_count = 1 + self.rng.int_n(3);
        let analysts = (0..analyst_count)
            .map(|_| self.pick(&ANALYSTS).to_owned())
            .collect::<Vec<_>>();
        let identifiers = if self.rng.bool() {
            vec![format!("CDI-{:05}", self.int_range(1, 99_999))]
        } else {
            Vec::new()
        };
        let cents = self.int_range(100_000, 500_000_000);

        let fields = Fields::new()
            .with("id", index as i64)
            .with("issuer_name", issuer)
            .with("deal_name", format!("{issuer} {first_word} {second_word} {year}"))
            .with("bloomber_id", format!("BBG{:09}", self.int_range(0, 999_999_999)))
            .with("total", cents as f64 / 100.0)
            .with("industry", self.pick(&INDUSTRIES))
            .with("status", self.pick(&STATUSES))
            .with("analysts", analysts)
            .with("doc_count", self.int_range(0, 40))
            .with("custom_deal_identifiers", identifiers);
        Row::new(index.to_string(), fields)
    }

    /// A needle that usually matches some rows and sometimes matches none.
    pub fn filter_needle(&mut self, rows: &[Row]) -> String {
        if rows.is_empty() || self.rng.int_n(5) == 0 {
            return format!("zz-no-match-{}", self.rng.int_n(1000));
        }
        let row = &rows[self.rng.int_n(rows.len())];
        let values = row
            .fields
            .iter()
            .map(|(_, value)| value.display())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>();
        let Some(text) = values.get(self.rng.int_n(values.len())) else {
            return row.key.to_string();
        };

        let chars = text.chars().collect::<Vec<_>>();
        let start = self.rng.int_n(chars.len());
        let len = 1 + self.rng.int_n((chars.len() - start).min(6));
        chars[start..start + len].iter().collect()
    }

    /// Detail payload shaped like the demo detail service.
    pub fn item_details(&mut self, key: &RowKey, now: OffsetDateTime) -> DetailPayload {
        let created_at = now
            .format(&Rfc3339)
            .unwrap_or_else(|_| now.unix_timestamp().to_string());
        Fields::new()
            .with("description", format!("Detailed description for item {key}"))
            .with("createdAt", created_at)
            .with("rating", self.int_range(1, 6))
            .with("comments", self.int_range(0, 50))
            .with("assignedTo", self.pick(&ASSIGNEES))
            .with("priority", self.pick(&PRIORITIES))
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.rng.int_n(values.len())]
    }

    /// Uniform in `[low, high)`.
    fn int_range(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        low + self.rng.int_n((high - low) as usize) as i64
    }
}

/// The column catalog repeated `copies` times, re-keyed `0..`.
pub fn column_catalog_rows(copies: usize) -> Vec<Row> {
    COLUMN_CATALOG
        .iter()
        .cycle()
        .take(COLUMN_CATALOG.len() * copies)
        .enumerate()
        .map(|(index, (_, kind, label))| {
            Row::new(
                index.to_string(),
                Fields::new().with("type", *kind).with("label", *label),
            )
        })
        .collect()
}

pub fn column_catalog() -> &'static [(&'static str, &'static str, &'static str)] {
    &COLUMN_CATALOG
}

/// Apple / Banana / UniqueString rows keyed `1..=3`.
pub fn fruit_rows() -> Vec<Row> {
    vec![
        Row::new("1", Fields::new().with("label", "Apple")),
        Row::new("2", Fields::new().with("label", "Banana")),
        Row::new("3", Fields::new().with("label", "UniqueString")),
    ]
}

/// Rows with a `type` column, as the container fixture uses.
pub fn typed_rows() -> Vec<Row> {
    vec![
        Row::new("1", Fields::new().with("type", "Type1").with("label", "Label1")),
        Row::new("2", Fields::new().with("type", "Type2").with("label", "Label2")),
    ]
}

pub fn item_details() -> DetailPayload {
    Fields::new().with("detail", "Item Details")
}

pub fn detail_text(payload: &DetailPayload, name: &str) -> Option<String> {
    payload.get(name).map(FieldValue::display)
}

#[cfg(test)]
mod tests {
    use super::{GridFaker, column_catalog, column_catalog_rows, fruit_rows};
    use gridscope_app::{FieldValue, RowKey};
    use std::collections::BTreeSet;
    use time::OffsetDateTime;

    #[test]
    fn same_seed_same_rows() {
        let mut left = GridFaker::new(42);
        let mut right = GridFaker::new(42);
        assert_eq!(left.deal_rows(10), right.deal_rows(10));
    }

    #[test]
    fn zero_seed_is_normalized() {
        assert_eq!(GridFaker::new(0).seed(), 1);
    }

    #[test]
    fn deal_rows_cover_every_field_kind() {
        let mut faker = GridFaker::new(7);
        let rows = faker.deal_rows(25);
        let kinds = rows
            .iter()
            .flat_map(|row| row.fields.iter().map(|(_, value)| value.kind_label()))
            .collect::<BTreeSet<_>>();
        assert_eq!(
            kinds,
            BTreeSet::from(["decimal", "int", "string", "string[]"])
        );

        let keys = rows.iter().map(|row| row.key.clone()).collect::<BTreeSet<_>>();
        assert_eq!(keys.len(), rows.len(), "keys must be unique");
    }

    #[test]
    fn catalog_rows_repeat_with_fresh_keys() {
        let rows = column_catalog_rows(100);
        assert_eq!(rows.len(), 1000);
        assert_eq!(rows[0].key, RowKey::from("0"));
        assert_eq!(rows[999].key, RowKey::from("999"));
        assert_eq!(
            rows[10].fields.get("label"),
            Some(&FieldValue::from(column_catalog()[0].2))
        );
    }

    #[test]
    fn item_details_stay_in_range() {
        let mut faker = GridFaker::new(3);
        for _ in 0..50 {
            let payload = faker.item_details(&RowKey::from("5"), OffsetDateTime::UNIX_EPOCH);
            let Some(FieldValue::Integer(rating)) = payload.get("rating") else {
                panic!("rating should be an integer");
            };
            assert!((1..=5).contains(rating));
            let Some(FieldValue::Integer(comments)) = payload.get("comments") else {
                panic!("comments should be an integer");
            };
            assert!((0..50).contains(comments));
            assert_eq!(
                payload.get("description"),
                Some(&FieldValue::from("Detailed description for item 5"))
            );
            assert_eq!(
                payload.get("createdAt"),
                Some(&FieldValue::from("1970-01-01T00:00:00Z"))
            );
        }
    }

    #[test]
    fn fruit_rows_have_unique_keys() {
        let rows = fruit_rows();
        let keys = rows.iter().map(|row| row.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["1", "2", "3"]);
    }
}
