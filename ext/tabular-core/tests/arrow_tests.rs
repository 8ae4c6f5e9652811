mod test_helpers;

use arrow_array::cast::AsArray;
use arrow_array::types::{Int32Type, Int64Type, TimestampMillisecondType};
use arrow_array::{
    Array, ArrayRef, DictionaryArray, Float32Array, Int64Array, RecordBatch, StringArray,
    TimestampMillisecondArray,
};
use arrow_ipc::reader::StreamReader;
use arrow_schema::{DataType, Field, Schema as ArrowSchema, TimeUnit};
use std::io::Cursor;
use std::sync::Arc;
use tabular_core::traits::GraphNode;
use tabular_core::*;
use test_helpers::*;

fn sample_batch() -> RecordBatch {
    let schema = Arc::new(ArrowSchema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new(
            "tag",
            DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8)),
            true,
        ),
        Field::new(
            "at",
            DataType::Timestamp(TimeUnit::Millisecond, None),
            true,
        ),
    ]));
    let tags: DictionaryArray<Int32Type> = vec![Some("red"), None, Some("red")].into_iter().collect();
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![10, 20, 1 << 40])) as ArrayRef,
            Arc::new(tags),
            Arc::new(TimestampMillisecondArray::from(vec![Some(1_000), Some(2_000), None])),
        ],
    )
    .unwrap()
}

#[test]
fn test_arrow_ingest() {
    let delta = materialize_new(TableInput::Arrow(arrow_stream(&[sample_batch()])), &utc_options());

    assert_eq!(delta.row_count, 3);
    assert_eq!(
        delta.output_schema.iter().collect::<Vec<_>>(),
        vec![("id", DType::Int64), ("tag", DType::Str), ("at", DType::Time)]
    );

    let table = &delta.table;
    assert_eq!(table.column("id").unwrap().get(2), Scalar::Int64(1 << 40));
    assert_eq!(table.column("tag").unwrap().get(0), Scalar::Str(Arc::from("red")));
    assert!(!table.column("tag").unwrap().is_valid(1));
    assert_eq!(table.column("at").unwrap().get(1), Scalar::Time(2_000));
    assert!(!table.column("at").unwrap().is_valid(2));
    assert_eq!(table.column(PKEY_COLUMN).unwrap().get(2), Scalar::Int32(2));
}

#[test]
fn test_arrow_update_widens_declared_columns() {
    let mut node = MemoryNode::new();
    let declared = [("id", "integer"), ("tag", "string"), ("at", "datetime")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let delta = materialize(Some(&mut node), ValueInput::schema(declared).into(), &utc_options())
        .unwrap()
        .unwrap();
    node.commit(delta).unwrap();

    let delta = materialize(
        Some(&mut node),
        TableInput::Arrow(arrow_stream(&[sample_batch()])),
        &utc_options().with_update(true),
    )
    .unwrap()
    .unwrap();

    assert_eq!(node.output_schema().dtype("id"), Some(DType::Int64));
    assert_eq!(delta.output_schema.dtype("id"), Some(DType::Int64));
    assert_eq!(delta.table.column("id").unwrap().get(2), Scalar::Int64(1 << 40));
    // key columns are never retyped
    assert_eq!(node.output_schema().dtype(PKEY_COLUMN), Some(DType::Int32));
}

#[test]
fn test_arrow_update_retypes_empty_float32_column() {
    let float_schema = Arc::new(ArrowSchema::new(vec![Field::new("x", DataType::Float32, true)]));
    let empty = RecordBatch::try_new(
        float_schema,
        vec![Arc::new(Float32Array::from(Vec::<f32>::new())) as ArrayRef],
    )
    .unwrap();

    let mut node = MemoryNode::new();
    let delta = materialize(
        Some(&mut node),
        TableInput::Arrow(arrow_stream(&[empty])),
        &utc_options(),
    )
    .unwrap()
    .unwrap();
    assert_eq!(delta.output_schema.dtype("x"), Some(DType::Float32));
    node.commit(delta).unwrap();

    let int_schema = Arc::new(ArrowSchema::new(vec![Field::new("x", DataType::Int64, true)]));
    let batch = RecordBatch::try_new(
        int_schema,
        vec![Arc::new(Int64Array::from(vec![7, 1 << 40])) as ArrayRef],
    )
    .unwrap();
    let delta = materialize(
        Some(&mut node),
        TableInput::Arrow(arrow_stream(&[batch])),
        &utc_options().with_update(true),
    )
    .unwrap()
    .unwrap();

    assert_eq!(node.output_schema().dtype("x"), Some(DType::Int64));
    assert_eq!(delta.table.column("x").unwrap().get(1), Scalar::Int64(1 << 40));
}

#[test]
fn test_arrow_update_keeps_committed_types() {
    let mut node = MemoryNode::new();
    let first = column_input(&[("id", vec![Value::Int(1)]), ("tag", vec![Value::from("a")])]);
    let delta = materialize(Some(&mut node), first.into(), &utc_options())
        .unwrap()
        .unwrap();
    node.commit(delta).unwrap();

    let schema = Arc::new(ArrowSchema::new(vec![Field::new("tag", DataType::Utf8, true)]));
    let batch = RecordBatch::try_new(
        schema,
        vec![Arc::new(StringArray::from(vec!["b", "c"])) as ArrayRef],
    )
    .unwrap();

    let delta = materialize(
        Some(&mut node),
        TableInput::Arrow(arrow_stream(&[batch])),
        &utc_options(),
    )
    .unwrap()
    .unwrap();

    assert!(delta.is_update);
    assert_eq!(
        delta.output_schema.iter().collect::<Vec<_>>(),
        vec![("id", DType::Int32), ("tag", DType::Str)]
    );
    assert_eq!(delta.table.column("tag").unwrap().get(1), Scalar::Str(Arc::from("c")));
    assert_eq!(delta.table.column("id").unwrap().status(0), CellStatus::Cleared);
    assert_eq!(delta.table.column(PKEY_COLUMN).unwrap().get(0), Scalar::Int32(1));
}

#[test]
fn test_empty_arrow_buffer_is_soft_failure() {
    let result = materialize(
        None::<&mut MemoryNode>,
        TableInput::Arrow(bytes::Bytes::new()),
        &utc_options(),
    )
    .unwrap();
    assert!(result.is_none());
}

#[test]
fn test_table_to_arrow_round_trip() {
    let delta = materialize_new(TableInput::Arrow(arrow_stream(&[sample_batch()])), &utc_options());
    let bytes = to_arrow(&delta.table, Window::new(1..3, 0..3)).unwrap();

    let reader = StreamReader::try_new(Cursor::new(bytes), None).unwrap();
    let batches: Vec<RecordBatch> = reader.collect::<std::result::Result<_, _>>().unwrap();
    assert_eq!(batches.len(), 1);

    let batch = &batches[0];
    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.num_columns(), 3);

    let ids = batch.column(0).as_primitive::<Int64Type>();
    assert_eq!(ids.values().to_vec(), vec![20, 1 << 40]);

    let tags = batch.column(1).as_dictionary::<Int32Type>();
    assert!(tags.is_null(0));
    let values = tags.values().as_string::<i32>();
    assert_eq!(values.value(tags.keys().value(1) as usize), "red");

    let at = batch.column(2).as_primitive::<TimestampMillisecondType>();
    assert_eq!(at.value(0), 2_000);
    assert!(at.is_null(1));
}
