use std::path::Path;

use fsk_common::{CompressionCodec, Result};

use crate::batch::DeviceBatch;

/// Column-name/metadata contract handed to the encoder for one batch.
///
/// Names come from the write-job descriptor (not the batch), and the
/// key/value pairs carry format-level hints the write-support contract wants
/// embedded in the file footer.
#[derive(Debug, Clone, Copy)]
pub struct EncodeSpec<'a> {
    /// Output column names, positionally matched to the batch columns.
    pub column_names: &'a [String],
    /// Extra key/value metadata to embed in the encoded file.
    pub key_value_metadata: &'a [(String, String)],
    /// Compression codec the encoded file must carry.
    pub compression: CompressionCodec,
}

/// Black-box batch encode capability.
///
/// Implementations turn one accelerator-resident batch into a fully formed
/// file of the target columnar format at `out`, byte-compatible in structural
/// contract with the engine's default writer. Implementations do not release
/// the batch or touch the accelerator lease; the caller owns both lifecycles.
pub trait BatchEncoder: Send + Sync {
    /// Encodes `batch` to a complete file at `out` and returns the encoded
    /// byte count.
    fn encode(&self, batch: &DeviceBatch, spec: &EncodeSpec<'_>, out: &Path) -> Result<u64>;
}
