//! Accelerator-side leaf components for the FlashSink write path.
//!
//! Architecture role:
//! - owns the device-resident batch handle and its release lifecycle
//! - manages the single shared accelerator via a FIFO lease
//! - defines the batch-encoder capability the write path drives
//!
//! Key modules:
//! - [`batch`]
//! - [`lease`]
//! - [`encoder`]
//! - [`cancel`]

pub mod batch;
pub mod cancel;
pub mod encoder;
pub mod lease;

pub use batch::DeviceBatch;
pub use cancel::CancelToken;
pub use encoder::{BatchEncoder, EncodeSpec};
pub use lease::{AccelLease, AccelLeaseManager};
