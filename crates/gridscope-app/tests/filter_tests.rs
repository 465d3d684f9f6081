// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use gridscope_app::{filter_rows, row_matches};
use gridscope_testkit::{GridFaker, column_catalog_rows, fruit_rows};

#[test]
fn unique_string_filter_returns_single_row() {
    let rows = fruit_rows();
    let filtered = filter_rows(&rows, "UniqueString");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].key.as_str(), "3");
    assert_eq!(filtered[0].cell("label").as_deref(), Some("UniqueString"));
}

#[test]
fn empty_filter_is_identity() {
    let rows = fruit_rows();
    let filtered = filter_rows(&rows, "");
    let expected = rows.iter().collect::<Vec<_>>();
    assert_eq!(filtered, expected);
}

#[test]
fn match_is_case_sensitive_substring() {
    let rows = fruit_rows();
    assert!(
        filter_rows(&rows, "apple").is_empty(),
        "lowercase needle must not match Apple"
    );

    let partial = filter_rows(&rows, "nan");
    assert_eq!(partial.len(), 1);
    assert_eq!(partial[0].key.as_str(), "2");
}

#[test]
fn unmatched_filter_yields_empty_view() {
    assert!(filter_rows(&fruit_rows(), "Durian").is_empty());
}

#[test]
fn catalog_filter_hits_every_copy() {
    let rows = column_catalog_rows(100);
    let filtered = filter_rows(&rows, "Bloomberg ID");
    assert_eq!(filtered.len(), 100);
    assert_eq!(filtered[0].key.as_str(), "3");
    assert_eq!(filtered[1].key.as_str(), "13");
}

#[test]
fn filter_partitions_generated_datasets() {
    for seed in 0_u64..25 {
        let mut faker = GridFaker::new(seed);
        let rows = faker.deal_rows(60);
        let needle = faker.filter_needle(&rows);

        let kept = filter_rows(&rows, &needle);
        for row in &kept {
            assert!(row_matches(row, &needle), "seed {seed}: kept row must match");
        }
        for row in &rows {
            let is_kept = kept.iter().any(|kept_row| std::ptr::eq(*kept_row, row));
            assert_eq!(is_kept, row_matches(row, &needle), "seed {seed}: {needle:?}");
        }

        let positions = kept
            .iter()
            .filter_map(|kept_row| rows.iter().position(|row| std::ptr::eq(*kept_row, row)))
            .collect::<Vec<_>>();
        assert_eq!(positions.len(), kept.len());
        assert!(
            positions.windows(2).all(|pair| pair[0] < pair[1]),
            "seed {seed}: order must follow the dataset without duplicates"
        );
    }
}
