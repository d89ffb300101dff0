use chrono::NaiveDate;
use std::path::Path;
use weightlog_core::model::cell::CellValue;
use weightlog_core::transfer::{
    SheetTable, WorkbookIo, XlsxWorkbookIo, JOURNAL_COLUMNS, JOURNAL_SHEET, WEIGHT_COLUMNS,
    WEIGHT_SHEET,
};
use weightlog_core::{
    ImportExportReconciler, JournalEntry, Period, RecordStore, TransferCapabilities,
    TransferError, WeightSample,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn reconciler() -> ImportExportReconciler<XlsxWorkbookIo> {
    ImportExportReconciler::xlsx(TransferCapabilities::default())
}

fn weight_sheet(rows: Vec<Vec<CellValue>>) -> SheetTable {
    let mut sheet = SheetTable::new(WEIGHT_SHEET, &WEIGHT_COLUMNS);
    for row in rows {
        sheet.push_row(row);
    }
    sheet
}

fn write_workbook(path: &Path, sheets: &[SheetTable]) {
    XlsxWorkbookIo.write_sheets(path, sheets).unwrap();
}

#[test]
fn export_then_import_round_trips_both_sheets() {
    let dir = tempfile::tempdir().unwrap();
    let source = RecordStore::new(dir.path().join("source.sqlite3"));
    source
        .upsert_weight(&WeightSample::new(day(2024, 1, 5), Period::Morning, 130.2).unwrap())
        .unwrap();
    source
        .upsert_weight(&WeightSample::new(day(2024, 1, 5), Period::Evening, 131.0).unwrap())
        .unwrap();
    source
        .upsert_journal(&JournalEntry::new(day(2024, 1, 5), "粥", ""))
        .unwrap();

    let exported = reconciler()
        .export_store(&source, &dir.path().join("backup"))
        .unwrap();
    assert_eq!(exported.path, dir.path().join("backup.xlsx"));
    assert!(exported.byte_size > 0);
    assert_eq!(exported.weight_rows, 2);
    assert_eq!(exported.journal_rows, 1);

    let weights = XlsxWorkbookIo
        .read_sheet(&exported.path, WEIGHT_SHEET)
        .unwrap()
        .unwrap();
    assert_eq!(weights.header, WEIGHT_COLUMNS.to_vec());
    assert_eq!(weights.rows[0].cells[1], CellValue::text("早晨"));
    assert_eq!(weights.rows[0].row_number, 2);

    let target = RecordStore::new(dir.path().join("target.sqlite3"));
    let imported = reconciler().import(&exported.path, &target).unwrap();
    assert_eq!(imported.accepted_weight_count, 2);
    assert_eq!(imported.accepted_journal_count, 1);
    assert!(imported.warnings.is_empty());

    let restored = target.get_all_weights().unwrap();
    assert_eq!(restored.len(), 2);
    assert_eq!(restored[0].sample.period, Period::Morning);
    assert_eq!(restored[0].sample.value, 130.2);
    let journal = target.get_journal(day(2024, 1, 5)).unwrap().unwrap();
    assert_eq!(journal.entry.food_text, "粥");
    assert_eq!(journal.entry.thoughts_text, "");
}

#[test]
fn import_keeps_valid_rows_and_reports_the_invalid_date() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.xlsx");
    write_workbook(
        &path,
        &[weight_sheet(vec![
            vec!["2024/01/05".into(), "早晨".into(), 65.2.into()],
            vec!["2024/13/40".into(), "晚上".into(), 64.0.into()],
        ])],
    );

    let store = RecordStore::new(dir.path().join("store.sqlite3"));
    store
        .upsert_weight(&WeightSample::new(day(2023, 6, 1), Period::Evening, 99.0).unwrap())
        .unwrap();

    let result = reconciler().import(&path, &store).unwrap();
    assert_eq!(result.accepted_weight_count, 1);
    assert_eq!(result.accepted_journal_count, 0);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("row 3"));
    assert!(result.warnings[0].contains("2024/13/40"));

    let all = store.get_all_weights().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].sample.sample_date, day(2024, 1, 5));
    assert_eq!(all[0].sample.period, Period::Morning);
    assert_eq!(all[0].sample.value, 65.2);
}

#[test]
fn import_with_no_valid_rows_leaves_the_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.xlsx");
    write_workbook(
        &path,
        &[weight_sheet(vec![
            vec!["2024/01/05".into(), "noon".into(), 65.0.into()],
            vec!["2024/01/06".into(), "早晨".into(), 900.0.into()],
        ])],
    );

    let store = RecordStore::new(dir.path().join("store.sqlite3"));
    store
        .upsert_weight(&WeightSample::new(day(2023, 6, 1), Period::Evening, 99.0).unwrap())
        .unwrap();

    let err = reconciler().import(&path, &store).unwrap_err();
    match err {
        TransferError::NothingToImport { warnings } => assert_eq!(warnings.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.count_weights().unwrap(), 1);
}

#[test]
fn columns_are_matched_by_header_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reordered.xlsx");
    let mut sheet = SheetTable::new(WEIGHT_SHEET, &["备注", "体重(斤)", "日期", "时间类型"]);
    sheet.push_row(vec![
        "note".into(),
        120.5.into(),
        "2024-02-01".into(),
        "evening".into(),
    ]);
    let mut journal = SheetTable::new(JOURNAL_SHEET, &JOURNAL_COLUMNS);
    journal.push_row(vec!["2024/02/01".into(), CellValue::Empty, "steady".into()]);
    write_workbook(&path, &[sheet, journal]);

    let store = RecordStore::new(dir.path().join("store.sqlite3"));
    let result = reconciler().import(&path, &store).unwrap();
    assert_eq!(result.accepted_weight_count, 1);
    assert_eq!(result.accepted_journal_count, 1);

    let stored = store.get_all_weights().unwrap().remove(0);
    assert_eq!(stored.sample.period, Period::Evening);
    assert_eq!(stored.sample.value, 120.5);
}

#[test]
fn missing_required_columns_fail_the_whole_import() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("columns.xlsx");
    let mut sheet = SheetTable::new(WEIGHT_SHEET, &["日期", "体重(斤)"]);
    sheet.push_row(vec!["2024/01/05".into(), 65.0.into()]);
    write_workbook(&path, &[sheet]);

    let store = RecordStore::new(dir.path().join("store.sqlite3"));
    let err = reconciler().import(&path, &store).unwrap_err();
    match err {
        TransferError::MissingColumns { sheet, columns } => {
            assert_eq!(sheet, WEIGHT_SHEET);
            assert_eq!(columns, vec!["时间类型".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn a_missing_sheet_reads_as_zero_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal_only.xlsx");
    let mut journal = SheetTable::new(JOURNAL_SHEET, &JOURNAL_COLUMNS);
    journal.push_row(vec!["2024/01/05".into(), "rice".into(), "fine".into()]);
    write_workbook(&path, &[journal]);

    let store = RecordStore::new(dir.path().join("store.sqlite3"));
    let result = reconciler().import(&path, &store).unwrap();
    assert_eq!(result.accepted_weight_count, 0);
    assert_eq!(result.accepted_journal_count, 1);
}

#[test]
fn structural_checks_run_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path().join("store.sqlite3"));

    let missing = reconciler()
        .import(&dir.path().join("absent.xlsx"), &store)
        .unwrap_err();
    assert!(matches!(missing, TransferError::SourceMissing(_)));

    let csv = dir.path().join("data.csv");
    std::fs::write(&csv, "日期,时间类型,体重(斤)\n").unwrap();
    let wrong_extension = reconciler().import(&csv, &store).unwrap_err();
    assert!(matches!(
        wrong_extension,
        TransferError::UnsupportedFormat { .. }
    ));

    let fake = dir.path().join("fake.xlsx");
    std::fs::write(&fake, "definitely not a zip archive").unwrap();
    let bad_magic = reconciler().import(&fake, &store).unwrap_err();
    assert!(matches!(bad_magic, TransferError::UnsupportedFormat { .. }));
}

#[test]
fn a_zip_that_is_not_a_workbook_fails_without_touching_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path().join("store.sqlite3"));
    store
        .upsert_weight(&WeightSample::new(day(2024, 1, 5), Period::Morning, 130.0).unwrap())
        .unwrap();

    // End-of-central-directory record of an archive with no entries.
    let mut empty_zip = b"PK\x05\x06".to_vec();
    empty_zip.extend_from_slice(&[0_u8; 18]);
    let source = dir.path().join("empty.xlsx");
    std::fs::write(&source, &empty_zip).unwrap();

    let err = reconciler().import(&source, &store).unwrap_err();
    assert!(matches!(err, TransferError::Workbook(_)));

    let kept = store.get_all_weights().unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].sample.value, 130.0);
}

#[test]
fn disabled_capabilities_fail_before_any_io() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path().join("store.sqlite3"));
    let reconciler = ImportExportReconciler::xlsx(TransferCapabilities {
        can_read: false,
        can_write: false,
    });

    let import = reconciler
        .import(&dir.path().join("absent.xlsx"), &store)
        .unwrap_err();
    assert!(matches!(import, TransferError::CapabilityUnavailable("read")));

    let weights = [WeightSample::new(day(2024, 1, 5), Period::Morning, 130.0).unwrap()];
    let export = reconciler
        .export(&weights, &[], &dir.path().join("out.xlsx"))
        .unwrap_err();
    assert!(matches!(export, TransferError::CapabilityUnavailable("write")));
    assert!(!dir.path().join("out.xlsx").exists());
    assert!(!dir.path().join("store.sqlite3").exists());
}

#[test]
fn export_refuses_empty_data_and_skips_out_of_range_weights() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("out.xlsx");

    let empty = reconciler().export(&[], &[], &destination).unwrap_err();
    assert!(matches!(empty, TransferError::NothingToExport));

    let weights = [
        WeightSample::new(day(2024, 1, 5), Period::Morning, 130.0).unwrap(),
        WeightSample {
            sample_date: day(2024, 1, 6),
            period: Period::Morning,
            value: 5.0,
        },
    ];
    let result = reconciler().export(&weights, &[], &destination).unwrap();
    assert_eq!(result.weight_rows, 1);
    assert_eq!(result.skipped_weights, 1);

    let journal = XlsxWorkbookIo
        .read_sheet(&destination, JOURNAL_SHEET)
        .unwrap()
        .unwrap();
    assert_eq!(journal.header, JOURNAL_COLUMNS.to_vec());
    assert!(journal.rows.is_empty());
}

#[test]
fn import_result_serializes_for_the_ui() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.xlsx");
    write_workbook(
        &path,
        &[weight_sheet(vec![vec![
            "2024/01/05".into(),
            "晚上".into(),
            "64.5".into(),
        ]])],
    );
    let store = RecordStore::new(dir.path().join("store.sqlite3"));
    let result = reconciler().import(&path, &store).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["accepted_weight_count"], 1);
    assert_eq!(json["accepted_journal_count"], 0);
    assert!(json["warnings"].as_array().unwrap().is_empty());
}
