use arrow::record_batch::RecordBatch;

use fsk_common::{FskError, Result};

/// One accelerator-resident columnar batch, exclusively owned by the task
/// that produced it until handed to the writer.
///
/// The column buffers surface through arrow arrays whose reference counts pin
/// the underlying device allocations; [`DeviceBatch::release`] drops those
/// pins so the accelerator runtime can reclaim the memory. Release is
/// idempotent, and `Drop` releases as a backstop so no exit path leaks device
/// memory.
#[derive(Debug)]
pub struct DeviceBatch {
    columns: Option<RecordBatch>,
    num_rows: usize,
}

impl DeviceBatch {
    #[must_use]
    pub fn new(columns: RecordBatch) -> Self {
        let num_rows = columns.num_rows();
        Self {
            columns: Some(columns),
            num_rows,
        }
    }

    /// Row count, available even after the buffers are released.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Borrows the column buffers for encoding.
    ///
    /// # Errors
    /// Returns an encode error if the buffers were already released; an
    /// encoder must never observe a released batch.
    pub fn columns(&self) -> Result<&RecordBatch> {
        self.columns
            .as_ref()
            .ok_or_else(|| FskError::Encode("batch buffers already released".to_string()))
    }

    /// Hands the column buffers back to the accelerator runtime.
    ///
    /// Safe to call more than once; later calls are no-ops.
    pub fn release(&mut self) {
        self.columns = None;
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.columns.is_none()
    }
}

impl Drop for DeviceBatch {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Int64Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;

    use super::DeviceBatch;

    fn three_row_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, false)]));
        RecordBatch::try_new(
            schema,
            vec![Arc::new(Int64Array::from(vec![1_i64, 2, 3])) as ArrayRef],
        )
        .expect("batch")
    }

    #[test]
    fn release_drops_buffer_pins_and_is_idempotent() {
        let batch = three_row_batch();
        let probe = Arc::downgrade(&batch.column(0).clone());
        let mut device = DeviceBatch::new(batch);

        assert!(!device.is_released());
        device.release();
        device.release();
        assert!(device.is_released());
        assert!(probe.upgrade().is_none(), "release must drop column arcs");
        assert_eq!(device.num_rows(), 3);
        assert!(device.columns().is_err());
    }
}
