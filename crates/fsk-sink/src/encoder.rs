use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use arrow_schema::{Field, Schema};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;

use fsk_accel::{BatchEncoder, DeviceBatch, EncodeSpec};
use fsk_common::{CompressionCodec, FskError, Result};

/// Host-side reference implementation of the batch-encode capability.
///
/// Produces the standard parquet layout through `ArrowWriter`, honoring the
/// job's codec and key/value metadata. A device encoder implements the same
/// trait; this one is the byte-compatibility reference the test suite runs
/// against and the fallback when no accelerator runtime is linked.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowParquetEncoder;

fn parquet_compression(codec: CompressionCodec) -> Compression {
    match codec {
        CompressionCodec::Uncompressed => Compression::UNCOMPRESSED,
        CompressionCodec::Snappy => Compression::SNAPPY,
    }
}

impl BatchEncoder for ArrowParquetEncoder {
    fn encode(&self, batch: &DeviceBatch, spec: &EncodeSpec<'_>, out: &Path) -> Result<u64> {
        let columns = batch.columns()?;
        if columns.num_columns() != spec.column_names.len() {
            return Err(FskError::Encode(format!(
                "column count mismatch: batch has {}, write job expects {}",
                columns.num_columns(),
                spec.column_names.len()
            )));
        }

        // Output files carry the job's column names, not whatever the batch
        // producer labeled its buffers.
        let fields = columns
            .schema()
            .fields()
            .iter()
            .zip(spec.column_names)
            .map(|(field, name)| field.as_ref().clone().with_name(name.clone()))
            .collect::<Vec<Field>>();
        let schema = Arc::new(Schema::new(fields));
        let renamed = RecordBatch::try_new(schema.clone(), columns.columns().to_vec())
            .map_err(|e| FskError::Encode(format!("batch relabel failed: {e}")))?;

        let key_value_metadata = if spec.key_value_metadata.is_empty() {
            None
        } else {
            Some(
                spec.key_value_metadata
                    .iter()
                    .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
                    .collect(),
            )
        };
        let props = WriterProperties::builder()
            .set_compression(parquet_compression(spec.compression))
            .set_key_value_metadata(key_value_metadata)
            .build();

        let file = File::create(out)?;
        let mut writer = ArrowWriter::try_new(file, schema, Some(props))
            .map_err(|e| FskError::Encode(format!("parquet writer init failed: {e}")))?;
        writer
            .write(&renamed)
            .map_err(|e| FskError::Encode(format!("parquet write failed: {e}")))?;
        writer
            .close()
            .map_err(|e| FskError::Encode(format!("parquet writer close failed: {e}")))?;

        Ok(std::fs::metadata(out)?.len())
    }
}
