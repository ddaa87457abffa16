// Dashboard document wire format and sample parsing

use chrono::{DateTime, NaiveDate};
use garage_dashboard::codec::{DocumentCodec, JsonCodec};
use garage_dashboard::models::*;

fn sample_document() -> DashboardData {
    let mut doc = DashboardData::new("42");
    doc.last_update = Some(DateTime::parse_from_rfc3339("2024-03-10T14:30:00-03:00").unwrap());
    doc.apply_day(
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        DailyStats {
            avg_cpu_percent: 12.5,
            avg_ram_percent: 40.0,
            avg_disk_percent: 55.25,
            daily_ingested_gb: 1.5,
            data_points_count: 288,
        },
        CurrentStatus {
            cpu_percent: 10.0,
            ram_percent: 41.0,
            disk_percent: 55.3,
            total_storage_gb: 931.51,
            used_storage_gb: 515.12,
            timestamp_str: Some("2024-03-10 14:25:00".into()),
        },
    );
    doc
}

#[test]
fn test_dashboard_serializes_with_downstream_field_names() {
    let json = String::from_utf8(JsonCodec::default().encode(&sample_document()).unwrap().to_vec())
        .unwrap();
    assert!(json.contains("\"garageId\":\"42\""));
    assert!(json.contains("\"lastUpdate\":\"2024-03-10T14:30:00-03:00\""));
    assert!(json.contains("\"currentStatus\""));
    assert!(json.contains("\"timestampStr\":\"2024-03-10 14:25:00\""));
    assert!(json.contains("\"currentMonthSummary\""));
    assert!(json.contains("\"lastMonthSummary\""));
    assert!(json.contains("\"history\":{\"2024-03-10\":{"));
    assert!(json.contains("\"dailyIngestedGb\":1.5"));
    assert!(json.contains("\"dataPointsCount\":288"));
}

#[test]
fn test_dashboard_json_roundtrip_preserves_document() {
    let codec = JsonCodec::default();
    let doc = sample_document();
    let back = codec.decode(&codec.encode(&doc).unwrap()).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn test_equal_documents_encode_identically() {
    let codec = JsonCodec::default();
    let mut a = sample_document();
    let mut b = sample_document();
    // Insert history in different orders
    let d1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let d2 = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    a.history.insert(d1, DailyStats::default());
    a.history.insert(d2, DailyStats::default());
    b.history.insert(d2, DailyStats::default());
    b.history.insert(d1, DailyStats::default());
    assert_eq!(codec.encode(&a).unwrap(), codec.encode(&b).unwrap());
}

#[test]
fn test_decode_tolerates_unknown_and_missing_fields() {
    let json = r#"{
        "garageId": "7",
        "schemaVersion": 3,
        "currentStatus": { "cpuPercent": 5.5, "extra": true },
        "history": {
            "2024-01-31": { "avgCpuPercent": 1.0, "dailyIngestedGb": 2.0, "peakCpu": 99 }
        }
    }"#;
    let doc = JsonCodec::default().decode(json.as_bytes()).unwrap();
    assert_eq!(doc.entity_id, "7");
    assert!(doc.last_update.is_none());
    assert_eq!(doc.current_status.cpu_percent, 5.5);
    assert!(doc.current_status.timestamp_str.is_none());
    let day = &doc.history[&NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()];
    assert_eq!(day.daily_ingested_gb, 2.0);
    assert_eq!(day.data_points_count, 0);
}

#[test]
fn test_decode_reads_documents_with_millisecond_offsets_and_nulls() {
    let json = r#"{
        "garageId": "9",
        "lastUpdate": "2024-03-10T21:00:01.123-03:00",
        "currentStatus": { "cpuPercent": 0.0, "ramPercent": 0.0, "diskPercent": 0.0,
                           "totalStorageGb": 0.0, "usedStorageGb": 0.0, "timestampStr": null },
        "currentMonthSummary": { "monthName": "MARCH", "totalIngestedGb": 3.2, "projectionGb": 9.92 },
        "lastMonthSummary": { "monthName": null, "totalIngestedGb": 0.0, "projectionGb": 0.0 },
        "history": {}
    }"#;
    let doc = JsonCodec::default().decode(json.as_bytes()).unwrap();
    assert_eq!(doc.entity_id, "9");
    assert_eq!(
        doc.last_update.unwrap().to_rfc3339(),
        "2024-03-10T21:00:01.123-03:00"
    );
    assert_eq!(doc.current_month_summary.month_name.as_deref(), Some("MARCH"));
    assert!(doc.last_month_summary.month_name.is_none());
}

#[test]
fn test_decode_accepts_entity_id_alias() {
    let doc = JsonCodec::default()
        .decode(br#"{"entityId": "site-3"}"#)
        .unwrap();
    assert_eq!(doc.entity_id, "site-3");
}

#[test]
fn test_decode_rejects_non_json() {
    assert!(JsonCodec::default().decode(b"\x00\x01not json").is_err());
    assert!(JsonCodec::default().decode(br#"{"history": []}"#).is_err());
}

#[test]
fn test_pretty_codec_output_decodes() {
    let codec = JsonCodec { pretty: true };
    let body = codec.encode(&sample_document()).unwrap();
    assert!(body.contains(&b'\n'));
    assert_eq!(codec.decode(&body).unwrap(), sample_document());
}

#[test]
fn test_new_document_has_only_identity() {
    let doc = DashboardData::new("1");
    assert_eq!(doc.entity_id, "1");
    assert!(doc.last_update.is_none());
    assert!(doc.history.is_empty());
    assert_eq!(doc.current_status, CurrentStatus::default());
    assert_eq!(doc.current_month_summary, MonthlySummary::default());
}

#[test]
fn test_sample_parses_export_columns() {
    let fields = ["2024-03-10 10:00:00", "g1", "12.5", "2400", " 40.25 ", "1000", "50"];
    let sample = Sample::from_fields(&fields).unwrap();
    assert_eq!(sample.timestamp, "2024-03-10 10:00:00");
    assert_eq!(sample.cpu_percent, 12.5);
    assert_eq!(sample.ram_percent, 40.25);
    assert_eq!(sample.disk_total_bytes, 1000);
    assert_eq!(sample.disk_percent, 50.0);
    assert_eq!(sample.disk_used_bytes(), 500);
}

#[test]
fn test_sample_disk_used_bytes_rounds_to_nearest() {
    let sample = Sample::from_fields(&["t", "g", "0", "0", "0", "5", "12.5"]).unwrap();
    // 5 * 12.5 / 100 = 0.625
    assert_eq!(sample.disk_used_bytes(), 1);
}

#[test]
fn test_sample_reports_missing_and_invalid_columns() {
    assert_eq!(
        Sample::from_fields(&["t", "g", "1", "0", "2", "100"]).unwrap_err(),
        SampleError::MissingColumn(COL_DISK_PERCENT)
    );
    assert_eq!(
        Sample::from_fields(&["t", "g", "x", "0", "2", "100", "3"]).unwrap_err(),
        SampleError::InvalidNumber {
            column: COL_CPU_PERCENT,
            value: "x".into()
        }
    );
    assert!(matches!(
        Sample::from_fields(&["t", "g", "1", "0", "2", "1.5e3", "3"]),
        Err(SampleError::InvalidNumber {
            column: COL_DISK_TOTAL_BYTES,
            ..
        })
    ));
}

#[test]
fn test_sample_rejects_non_finite_percentages() {
    for raw in ["NaN", "nan", "inf", "-inf", "infinity", "1e999"] {
        let fields = ["t", "g", raw, "0", "2", "100", "3"];
        assert_eq!(
            Sample::from_fields(&fields).unwrap_err(),
            SampleError::InvalidNumber {
                column: COL_CPU_PERCENT,
                value: raw.into()
            },
            "{raw}"
        );
    }
    assert!(Sample::from_fields(&["t", "g", "1", "0", "2", "100", "NaN"]).is_err());
    assert!(Sample::from_fields(&["t", "g", "1", "0", "inf", "100", "3"]).is_err());
}

#[test]
fn test_decode_reads_null_numbers_as_zero() {
    let json = r#"{
        "garageId": "4",
        "currentStatus": { "cpuPercent": null, "ramPercent": 12.5, "usedStorageGb": null },
        "currentMonthSummary": { "monthName": "MARCH", "totalIngestedGb": null, "projectionGb": 1.5 },
        "history": {
            "2024-03-09": { "avgCpuPercent": null, "avgRamPercent": 20.0,
                            "dailyIngestedGb": null, "dataPointsCount": 4 }
        }
    }"#;
    let doc = JsonCodec::default().decode(json.as_bytes()).unwrap();
    assert_eq!(doc.current_status.cpu_percent, 0.0);
    assert_eq!(doc.current_status.ram_percent, 12.5);
    assert_eq!(doc.current_month_summary.total_ingested_gb, 0.0);
    assert_eq!(doc.current_month_summary.projection_gb, 1.5);
    let day = &doc.history[&NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()];
    assert_eq!(day.avg_cpu_percent, 0.0);
    assert_eq!(day.avg_ram_percent, 20.0);
    assert_eq!(day.data_points_count, 4);
}
