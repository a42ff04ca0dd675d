//! Per-task staged batch writer.
//!
//! One writer processes its task's batches strictly sequentially. Every
//! `write_batch` call walks the same path: acquire the shared accelerator,
//! encode the batch into a uniquely named staging file, hand the batch
//! buffers and the accelerator back before any destination I/O, then copy the
//! staged bytes to the final path non-overwriting. Cleanup (batch release,
//! lease release, staging-file deletion) is carried by RAII guards, so it
//! runs on every exit path rather than depending on failure-handling flags.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info_span};

use fsk_accel::{AccelLeaseManager, BatchEncoder, CancelToken, DeviceBatch, EncodeSpec};
use fsk_common::metrics::global_metrics;
use fsk_common::{Result, TaskAttemptId};

use crate::descriptor::WriteJobDescriptor;
use crate::destination::DestinationStore;
use crate::staging::StagingFile;

/// Task identity and cancellation wiring handed to each writer.
#[derive(Debug, Clone)]
pub struct TaskWriteContext {
    /// Attempt-keyed identity of the task this writer serves.
    pub task: TaskAttemptId,
    /// Engine-driven cancellation; interrupts a blocked lease wait.
    pub cancel: CancelToken,
}

/// Accelerator-side encode timing for one committed batch.
///
/// Covers only the encode bracket; the staging-to-destination transfer is
/// observable through metrics but never folded into this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeTiming {
    elapsed_nanos: u64,
}

impl EncodeTiming {
    fn new(elapsed: Duration) -> Self {
        Self {
            elapsed_nanos: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
        }
    }

    /// Elapsed accelerator encode time in nanoseconds.
    #[must_use]
    pub fn elapsed_nanos(&self) -> u64 {
        self.elapsed_nanos
    }
}

/// Writes one task's batches through staging to their destination.
///
/// Constructed by [`crate::descriptor::BatchWriterFactory::create_writer`];
/// the descriptor, lease manager, encoder, and destination store are shared
/// with every other writer of the job.
pub struct StagedBatchWriter {
    descriptor: Arc<WriteJobDescriptor>,
    destination_dir: String,
    file_extension: String,
    ctx: TaskWriteContext,
    lease: Arc<AccelLeaseManager>,
    encoder: Arc<dyn BatchEncoder>,
    destination: Arc<dyn DestinationStore>,
    staging_dir: PathBuf,
    batch_seq: u64,
    batches_written: u64,
}

impl StagedBatchWriter {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        descriptor: Arc<WriteJobDescriptor>,
        destination_dir: String,
        file_extension: String,
        ctx: TaskWriteContext,
        lease: Arc<AccelLeaseManager>,
        encoder: Arc<dyn BatchEncoder>,
        destination: Arc<dyn DestinationStore>,
        staging_dir: PathBuf,
    ) -> Self {
        Self {
            descriptor,
            destination_dir,
            file_extension,
            ctx,
            lease,
            encoder,
            destination,
            staging_dir,
            batch_seq: 0,
            batches_written: 0,
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> &Arc<WriteJobDescriptor> {
        &self.descriptor
    }

    #[must_use]
    pub fn task(&self) -> &TaskAttemptId {
        &self.ctx.task
    }

    /// Batches committed to their destination so far.
    #[must_use]
    pub fn batches_written(&self) -> u64 {
        self.batches_written
    }

    /// Destination path for the batch with sequence number `seq`.
    fn destination_path(&self, seq: u64) -> String {
        format!(
            "{}/part-{:05}-{:04}{}",
            self.destination_dir.trim_end_matches('/'),
            self.ctx.task.task_id.0,
            seq,
            self.file_extension
        )
    }

    /// Encodes one batch on the accelerator and commits it to the
    /// destination, returning the accelerator-side encode time.
    ///
    /// Takes exclusive ownership of `batch`; its buffers are released before
    /// the transfer begins and on every failure path. The accelerator lease
    /// is held only across the encode, never across destination I/O, so a
    /// slow remote copy cannot serialize unrelated tasks.
    ///
    /// # Errors
    /// - [`fsk_common::FskError::Canceled`] when the task is canceled while
    ///   waiting for the accelerator (no staging file is created)
    /// - [`fsk_common::FskError::Encode`] when the encoder fails (batch,
    ///   lease, and staging file released/deleted first)
    /// - [`fsk_common::FskError::Transfer`] when the destination copy fails
    ///   (names the destination path; staging file deleted first)
    pub fn write_batch(&mut self, mut batch: DeviceBatch) -> Result<EncodeTiming> {
        let metrics = global_metrics();
        let task = self.ctx.task;
        let seq = self.batch_seq;
        self.batch_seq += 1;

        let wait_started = Instant::now();
        let mut lease = self.lease.acquire(task, &self.ctx.cancel)?;
        metrics.record_lease_wait(&task, wait_started.elapsed().as_secs_f64());

        let staging = StagingFile::create(
            &self.staging_dir,
            &format!("part-{:05}-{:04}", task.task_id.0, seq),
        )?;

        let encode_started = Instant::now();
        let encode_result = {
            let _span = info_span!(
                "accel_batch_encode",
                query_id = %task.query_id,
                stage_id = %task.stage_id,
                task_id = %task.task_id,
                rows = batch.num_rows()
            )
            .entered();
            self.encoder.encode(
                &batch,
                &EncodeSpec {
                    column_names: self.descriptor.column_names(),
                    key_value_metadata: self.descriptor.key_value_metadata(),
                    compression: self.descriptor.codec(),
                },
                staging.path(),
            )
        };
        let elapsed = encode_started.elapsed();

        // The transfer needs neither the column buffers nor the accelerator;
        // hand both back before any destination I/O, on success and failure
        // alike.
        batch.release();
        lease.release();

        let staged_bytes = match encode_result {
            Ok(bytes) => bytes,
            Err(e) => {
                metrics.inc_encode_failures(&task);
                return Err(e);
            }
        };
        metrics.record_encode(&task, elapsed.as_secs_f64(), staged_bytes);

        let dest = self.destination_path(seq);
        debug!(
            %task,
            staged = %staging.path().display(),
            dest = %dest,
            staged_bytes,
            "transferring staged batch"
        );
        match self.destination.copy_from_local(staging.path(), &dest) {
            Ok(bytes) => {
                metrics.record_transfer(&task, bytes);
                self.batches_written += 1;
                Ok(EncodeTiming::new(elapsed))
            }
            Err(e) => {
                metrics.inc_transfer_failures(&task);
                Err(e)
            }
        }
    }
}
