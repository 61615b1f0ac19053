use arrow::array::{Float32Array, Int16Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;
use raster_hist_core::{
    run_histogram, HistogramParams, ParquetBandSource, RasterHistError, RasterSource, TableFormat,
    TableLabel,
};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// 4x3 elevation raster: band `elevation` (f32, -9999 no-data, one null),
/// band `class` (i16), and a text column.
fn write_fixture() -> NamedTempFile {
    let tmp = tempfile::Builder::new()
        .suffix(".parquet")
        .tempfile()
        .unwrap();
    let schema = Arc::new(Schema::new(vec![
        Field::new("label", DataType::Utf8, true),
        Field::new("elevation", DataType::Float32, true),
        Field::new("class", DataType::Int16, false),
    ]));
    let labels = Arc::new(StringArray::from(vec![Some("a"); 12]));
    let elevation = Arc::new(Float32Array::from(vec![
        Some(0.0),
        Some(10.0),
        Some(20.0),
        Some(30.0),
        Some(-9999.0),
        Some(50.0),
        None,
        Some(70.0),
        Some(80.0),
        Some(90.0),
        Some(100.0),
        Some(-9999.0),
    ]));
    let class = Arc::new(Int16Array::from(vec![1, 1, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4]));
    let batch = RecordBatch::try_new(schema.clone(), vec![labels, elevation, class]).unwrap();
    let props = WriterProperties::builder()
        .set_key_value_metadata(Some(vec![
            KeyValue::new("raster:columns".to_string(), "4".to_string()),
            KeyValue::new("raster:rows".to_string(), "3".to_string()),
            KeyValue::new("raster:nodata".to_string(), "-9999".to_string()),
        ]))
        .build();
    let mut writer = ArrowWriter::try_new(tmp.as_file(), schema, Some(props)).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
    tmp
}

#[test]
fn parquet_band_reads_metadata() {
    let tmp = write_fixture();
    let source = ParquetBandSource::open(tmp.path(), None, 5).unwrap();
    let info = source.info();
    assert_eq!(info.band, "elevation"); // first numeric column
    assert_eq!(info.columns, Some(4));
    assert_eq!(info.rows, Some(3));
    assert_eq!(info.cell_count, Some(12));
    assert_eq!(info.nodata, Some(-9999.0));
}

#[test]
fn parquet_band_blocks_follow_batch_size() {
    let tmp = write_fixture();
    let mut source = ParquetBandSource::open(tmp.path(), Some("class"), 5).unwrap();
    let mut cells = Vec::new();
    while let Some(block) = source.next_block().unwrap() {
        assert!(block.len() <= 5);
        cells.extend(block);
    }
    assert_eq!(cells, vec![1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0, 3.0, 4.0, 4.0, 4.0]);
}

#[test]
fn unknown_or_text_band_rejected() {
    let tmp = write_fixture();
    assert!(matches!(
        ParquetBandSource::open(tmp.path(), Some("missing"), 5),
        Err(RasterHistError::InvalidArgument(_))
    ));
    assert!(matches!(
        ParquetBandSource::open(tmp.path(), Some("label"), 5),
        Err(RasterHistError::InvalidArgument(_))
    ));
}

#[test]
fn run_histogram_end_to_end() {
    let tmp = write_fixture();
    let dir = tempfile::tempdir().unwrap();
    let params = HistogramParams {
        bins: 2,
        batch_size: 4,
        table: Some(dir.path().join("hist.csv")),
        plot: Some(dir.path().join("hist.html")),
        ..HistogramParams::new(tmp.path())
    };
    let report = run_histogram(&params, None).unwrap();
    assert_eq!(report.total_cells, 12);
    assert_eq!(report.nodata_cells, 3);
    assert_eq!(report.sample_count, 9);
    assert_eq!(report.bins.len(), 2);
    // [0,50) holds 0,10,20,30; [50,100] holds 50,70,80,90,100
    assert_eq!(report.bins[0].count, 4);
    assert_eq!(report.bins[1].count, 5);
    assert_eq!(report.bin_width, 50.0);

    let table = std::fs::read_to_string(dir.path().join("hist.csv")).unwrap();
    assert_eq!(table, "CENTER_VALUE,NUM_ELEM\n0-50,4\n50-100,5\n");
    let page = std::fs::read_to_string(dir.path().join("hist.html")).unwrap();
    assert!(page.contains("hist.png"));
    assert!(dir.path().join("hist.png").exists());
}

#[test]
fn integer_band_with_json_center_table() {
    let tmp = write_fixture();
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("class.json");
    let params = HistogramParams {
        band: Some("class".into()),
        bins: 3,
        nodata: Some(4.0), // overrides the file's -9999 sentinel
        table: Some(table.clone()),
        table_format: TableFormat::Json,
        table_label: TableLabel::Center,
        ..HistogramParams::new(tmp.path())
    };
    let report = run_histogram(&params, None).unwrap();
    assert_eq!(report.sample_count, 9);
    assert_eq!(report.nodata_cells, 3);
    let counts: Vec<u64> = report.bins.iter().map(|b| b.count).collect();
    assert_eq!(counts, vec![2, 3, 4]);
    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&table).unwrap()).unwrap();
    assert_eq!(doc.as_array().unwrap().len(), 3);
    assert_eq!(doc[2]["NUM_ELEM"], 4);
    assert!((doc[0]["CENTER_VALUE"].as_f64().unwrap() - (1.0 + 1.0 / 3.0)).abs() < 1e-9);
}

#[test]
fn missing_file_is_io_error() {
    let params = HistogramParams::new("/definitely/not/here.parquet");
    assert!(matches!(run_histogram(&params, None), Err(RasterHistError::Io(_))));
}
