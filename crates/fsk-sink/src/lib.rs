//! Accelerated columnar write path for FlashSink.
//!
//! Architecture role:
//! - decides at planning time whether the accelerated writer may replace the
//!   engine's default one
//! - turns accepted configuration into an immutable write-job descriptor and
//!   a per-task writer factory
//! - stages accelerator-encoded batches locally and commits them to their
//!   destination with guaranteed cleanup
//!
//! Key modules:
//! - [`gate`]
//! - [`descriptor`]
//! - [`writer`]
//! - [`staging`]
//! - [`destination`]
//! - [`committer`]
//! - [`encoder`]

pub mod committer;
pub mod descriptor;
pub mod destination;
pub mod encoder;
pub mod gate;
pub mod staging;
pub mod writer;

pub use committer::{DirectCommitter, OutputCommitter, StandardCommitter};
pub use descriptor::{
    BatchWriterFactory, WriteJobConfigurator, WriteJobDescriptor, FORMAT_EXTENSION,
};
#[cfg(feature = "s3")]
pub use destination::ObjectStoreDestination;
pub use destination::{DestinationStore, LocalFsDestination};
pub use encoder::ArrowParquetEncoder;
pub use gate::{can_accelerate, GateDecision, NoVeto, PlanReplacementPolicy};
pub use staging::StagingFile;
pub use writer::{EncodeTiming, StagedBatchWriter, TaskWriteContext};
