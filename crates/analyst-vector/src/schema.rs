use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Columns of the chunk table. `vector` is a fixed-size list of `dim` floats.
pub fn build_chunk_schema(dim: usize) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("document", DataType::Utf8, false),
		Field::new("chunk_index", DataType::Int64, false),
		Field::new("start_char", DataType::Int64, false),
		Field::new("end_char", DataType::Int64, false),
		Field::new("length", DataType::Int64, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim as i32), true),
	]))
}
