//! Integration tests for loading CSV workbooks

use brinson_data::{
    AssetId, CsvWorkbook, DataError, DatasetCache, DatasetLoader, DropReason, FundSpec, GroupKey,
};
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn write(dir: &Path, sheet: &str, contents: &str) {
    fs::write(dir.join(format!("{sheet}.csv")), contents).unwrap();
}

fn sample_workbook(dir: &Path) {
    write(
        dir,
        "prices",
        "Date,Asset ID,Price\n\
         2023-12-31,101,10\n\
         2023-12-31,102,20\n\
         2023-12-31,103,5\n\
         2024-06-30,101,12\n\
         2024-06-30,102,19\n\
         2024-06-30,103,5.5\n",
    );
    write(
        dir,
        "attributes",
        "Asset ID,Asset  Attribute 1,Asset  Attribute 2\n\
         101,Equity,US\n\
         102,Bond,EU\n\
         103,,US\n",
    );
    write(
        dir,
        "benchmark",
        "Asset ID,Holdings\n\
         101.0,100\n\
         102,\"1,000\"\n\
         104,abc\n",
    );
    write(
        dir,
        "funds_20231231",
        "Fund A,,,,Fund B,\n\
         Asset ID,Holdings,,,Asset ID,Holdings\n\
         101,50,,,102,30\n\
         103,20,,,,\n",
    );
}

#[test]
fn test_load_csv_workbook() {
    let dir = tempfile::tempdir().unwrap();
    sample_workbook(dir.path());

    let dataset = DatasetLoader::default()
        .load(&CsvWorkbook::new(dir.path()))
        .unwrap();

    let start = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    assert_eq!(dataset.prices().dates(), vec![start, end]);
    assert_eq!(dataset.prices().price(end, &AssetId::new("103")), Some(5.5));

    // "101.0" in the benchmark joins with "101" in prices
    assert_eq!(dataset.benchmark().get(&AssetId::new("101")), Some(100.0));
    assert_eq!(dataset.benchmark().get(&AssetId::new("102")), Some(1000.0));

    let dropped = dataset.report().dropped();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].sheet, "benchmark");
    assert!(matches!(dropped[0].reason, DropReason::NonNumeric { .. }));

    let sector = dataset
        .attributes()
        .classification("Asset  Attribute 1")
        .unwrap();
    assert_eq!(sector.group_of(&AssetId::new("103")), GroupKey::Unclassified);

    let specs = FundSpec::defaults();
    let (fund_a, report) = dataset.fund_holdings(&specs[0]).unwrap();
    assert_eq!(fund_a.len(), 2);
    assert!(report.is_empty());
    let (fund_b, _) = dataset.fund_holdings(&specs[1]).unwrap();
    assert_eq!(fund_b.get(&AssetId::new("102")), Some(30.0));
}

#[test]
fn test_missing_sheet_names_every_candidate() {
    let dir = tempfile::tempdir().unwrap();
    sample_workbook(dir.path());
    fs::remove_file(dir.path().join("funds_20231231.csv")).unwrap();

    let err = DatasetLoader::default()
        .load(&CsvWorkbook::new(dir.path()))
        .unwrap_err();
    assert!(err.is_missing_sheet());
    assert!(err.to_string().contains("funds_20231231"));
    assert!(err.to_string().contains("funds"));
}

#[test]
fn test_cache_tracks_file_edits() {
    let dir = tempfile::tempdir().unwrap();
    sample_workbook(dir.path());
    let source = CsvWorkbook::new(dir.path());
    let loader = DatasetLoader::default();
    let cache = DatasetCache::new();

    let first = cache.get_or_load(&source, &loader).unwrap();
    let again = cache.get_or_load(&source, &loader).unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    write(dir.path(), "benchmark", "Asset ID,Holdings\n101,1\n");
    let edited = cache.get_or_load(&source, &loader).unwrap();
    assert_ne!(first.fingerprint(), edited.fingerprint());
    assert_eq!(edited.benchmark().len(), 1);
    assert_eq!(cache.stats().misses, 2);
    assert_eq!(cache.len(), 1);
    assert!(cache.get(first.fingerprint()).is_none());
}

#[test]
fn test_conflicting_prices_fail_the_load() {
    let dir = tempfile::tempdir().unwrap();
    sample_workbook(dir.path());
    write(
        dir.path(),
        "prices",
        "Date,Asset ID,Price\n2023-12-31,101,10\n2023-12-31,101,11\n",
    );

    let err = DatasetLoader::default()
        .load(&CsvWorkbook::new(dir.path()))
        .unwrap_err();
    assert!(matches!(err, DataError::ConflictingPrice { .. }));
}
