// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{KEY_FIELD, Row};

/// Rows whose key or any field contains `text` verbatim, in dataset order.
/// Empty `text` keeps every row.
pub fn filter_rows<'a>(rows: &'a [Row], text: &str) -> Vec<&'a Row> {
    if text.is_empty() {
        return rows.iter().collect();
    }
    rows.iter().filter(|row| row_matches(row, text)).collect()
}

pub fn row_matches(row: &Row, text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    row.key.as_str().contains(text)
        || row
            .fields
            .iter()
            .any(|(_, value)| value.display().contains(text))
}

/// `key` first, then field names in first-seen order across rows.
pub fn derive_columns(rows: &[Row]) -> Vec<String> {
    let mut columns = vec![KEY_FIELD.to_owned()];
    for row in rows {
        for name in row.fields.names() {
            if !columns.iter().any(|column| column == name) {
                columns.push(name.to_owned());
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::{derive_columns, filter_rows};
    use crate::{FieldValue, Fields, Row};

    #[test]
    fn key_and_typed_fields_participate() {
        let rows = vec![
            Row::new("deal-9", Fields::new().with("total", 1250.5)),
            Row::new(
                "deal-10",
                Fields::new().with("analysts", vec!["Ann".to_owned(), "Bo".to_owned()]),
            ),
            Row::new("deal-11", Fields::new().with("doc_count", 42_i64)),
        ];

        assert_eq!(filter_rows(&rows, "deal-1").len(), 2);
        assert_eq!(filter_rows(&rows, "250.5")[0].key.as_str(), "deal-9");
        assert_eq!(filter_rows(&rows, "Ann,Bo")[0].key.as_str(), "deal-10");
        assert_eq!(filter_rows(&rows, "42")[0].key.as_str(), "deal-11");
    }

    #[test]
    fn null_cells_never_match_non_empty_text() {
        let rows = vec![
            Row::new("a", Fields::new().with("note", FieldValue::Null)),
            Row::new("b", Fields::new().with("active", false)),
        ];
        assert!(filter_rows(&rows, "null").is_empty());
        assert_eq!(filter_rows(&rows, "").len(), 2);
        assert_eq!(filter_rows(&rows, "fals")[0].key.as_str(), "b");
    }

    #[test]
    fn empty_dataset_yields_empty_view() {
        assert!(filter_rows(&[], "anything").is_empty());
        assert!(filter_rows(&[], "").is_empty());
    }

    #[test]
    fn columns_start_with_key_and_follow_first_seen_order() {
        let rows = vec![
            Row::new("1", Fields::new().with("type", "int").with("label", "ID")),
            Row::new("2", Fields::new().with("label", "Issuer").with("extra", 1_i64)),
        ];
        assert_eq!(derive_columns(&rows), vec!["key", "type", "label", "extra"]);
        assert_eq!(derive_columns(&[]), vec!["key"]);
    }
}
