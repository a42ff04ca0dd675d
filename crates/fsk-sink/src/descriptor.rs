//! Write-job configuration: descriptor construction and the per-task writer
//! factory.
//!
//! The configurator re-validates the gate's hard constraints so a job that
//! skipped (or raced) the planning-time check still fails at configuration
//! time with a descriptive error, never per batch.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use arrow_schema::SchemaRef;
use tracing::warn;

use fsk_accel::{AccelLeaseManager, BatchEncoder, CancelToken};
use fsk_common::{
    CompressionCodec, FskError, Result, SummaryLevel, TaskAttemptId, TimestampPrecision,
    WriteSessionConfig,
};

use crate::committer::{resolve_committer, OutputCommitter};
use crate::destination::DestinationStore;
use crate::writer::{StagedBatchWriter, TaskWriteContext};

/// File extension of the output format.
pub const FORMAT_EXTENSION: &str = ".parquet";

/// Immutable write-job descriptor shared read-only by every task's writer.
#[derive(Debug, Clone)]
pub struct WriteJobDescriptor {
    schema: SchemaRef,
    column_names: Vec<String>,
    codec: CompressionCodec,
    legacy_format: bool,
    timestamp_precision: TimestampPrecision,
    summary_level: SummaryLevel,
    key_value_metadata: Vec<(String, String)>,
}

impl WriteJobDescriptor {
    #[must_use]
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Output column names in schema order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn codec(&self) -> CompressionCodec {
        self.codec
    }

    /// Always false; a descriptor is only constructed after validation.
    #[must_use]
    pub fn legacy_format(&self) -> bool {
        self.legacy_format
    }

    #[must_use]
    pub fn timestamp_precision(&self) -> TimestampPrecision {
        self.timestamp_precision
    }

    /// Effective summary verbosity after committer capability is applied.
    #[must_use]
    pub fn summary_level(&self) -> SummaryLevel {
        self.summary_level
    }

    /// Format-level key/value metadata embedded in every output file.
    #[must_use]
    pub fn key_value_metadata(&self) -> &[(String, String)] {
        &self.key_value_metadata
    }
}

/// Builds write-job descriptors and writer factories from accepted
/// configuration.
///
/// The accelerator lease manager, encoder, and destination store are
/// injected once here and shared by every writer the factory produces.
pub struct WriteJobConfigurator {
    lease: Arc<AccelLeaseManager>,
    encoder: Arc<dyn BatchEncoder>,
    destination: Arc<dyn DestinationStore>,
}

impl WriteJobConfigurator {
    pub fn new(
        lease: Arc<AccelLeaseManager>,
        encoder: Arc<dyn BatchEncoder>,
        destination: Arc<dyn DestinationStore>,
    ) -> Self {
        Self {
            lease,
            encoder,
            destination,
        }
    }

    /// Resolves options against the session, validates the hard constraints,
    /// and returns the immutable descriptor plus a per-task writer factory.
    ///
    /// # Errors
    /// Fails with a configuration error before any task starts when the
    /// codec, legacy flag, timestamp precision, summary level, or committer
    /// is outside the accelerated writer's contract.
    pub fn configure(
        &self,
        session: &WriteSessionConfig,
        options: &HashMap<String, String>,
        schema: SchemaRef,
    ) -> Result<(Arc<WriteJobDescriptor>, BatchWriterFactory)> {
        let resolved = session.with_options(options)?;

        let codec = CompressionCodec::parse(&resolved.compression_codec)?;
        if resolved.legacy_format {
            return Err(FskError::InvalidConfig(
                "legacy file format requested; the accelerated writer only produces the standard layout"
                    .to_string(),
            ));
        }
        let timestamp_precision = TimestampPrecision::parse(&resolved.timestamp_precision)?;
        if timestamp_precision != TimestampPrecision::Micros {
            return Err(FskError::InvalidConfig(format!(
                "unsupported timestamp precision: '{timestamp_precision}' (accelerated writes produce micros only)"
            )));
        }

        let mut summary_level = SummaryLevel::parse(&resolved.summary_level)?;
        let committer = resolve_committer(&resolved.committer)?;
        if summary_level == SummaryLevel::Job && !committer.supports_summaries() {
            // Summaries are best-effort; the write itself proceeds.
            warn!(
                committer = committer.name(),
                "job summary requested but the committer cannot produce one; continuing without"
            );
            summary_level = SummaryLevel::None;
        }

        let column_names = schema
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect::<Vec<_>>();
        let mut key_value_metadata = schema
            .metadata()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Vec<_>>();
        key_value_metadata.sort();

        let descriptor = Arc::new(WriteJobDescriptor {
            schema,
            column_names,
            codec,
            legacy_format: false,
            timestamp_precision,
            summary_level,
            key_value_metadata,
        });

        let factory = BatchWriterFactory {
            descriptor: Arc::clone(&descriptor),
            committer,
            lease: Arc::clone(&self.lease),
            encoder: Arc::clone(&self.encoder),
            destination: Arc::clone(&self.destination),
            staging_dir: resolved.staging_dir,
        };
        Ok((descriptor, factory))
    }
}

/// Per-job factory handed to the task runtime; produces one writer per task.
pub struct BatchWriterFactory {
    descriptor: Arc<WriteJobDescriptor>,
    committer: Arc<dyn OutputCommitter>,
    lease: Arc<AccelLeaseManager>,
    encoder: Arc<dyn BatchEncoder>,
    destination: Arc<dyn DestinationStore>,
    staging_dir: PathBuf,
}

impl std::fmt::Debug for BatchWriterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchWriterFactory")
            .field("descriptor", &self.descriptor)
            .field("staging_dir", &self.staging_dir)
            .finish_non_exhaustive()
    }
}

impl BatchWriterFactory {
    #[must_use]
    pub fn descriptor(&self) -> &Arc<WriteJobDescriptor> {
        &self.descriptor
    }

    /// Committer the host runs the commit protocol with.
    #[must_use]
    pub fn committer(&self) -> &Arc<dyn OutputCommitter> {
        &self.committer
    }

    /// Extension for every output file of this job:
    /// `<codec-extension><format-extension>` (snappy -> `.snappy.parquet`,
    /// uncompressed -> `.parquet`).
    #[must_use]
    pub fn file_extension(&self) -> String {
        format!("{}{FORMAT_EXTENSION}", self.descriptor.codec.extension())
    }

    /// Produces the writer for one task, targeting `destination_dir`.
    #[must_use]
    pub fn create_writer(
        &self,
        destination_dir: impl Into<String>,
        task: TaskAttemptId,
        cancel: CancelToken,
    ) -> StagedBatchWriter {
        StagedBatchWriter::new(
            Arc::clone(&self.descriptor),
            destination_dir.into(),
            self.file_extension(),
            TaskWriteContext { task, cancel },
            Arc::clone(&self.lease),
            Arc::clone(&self.encoder),
            Arc::clone(&self.destination),
            self.staging_dir.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use arrow_schema::{DataType, Field, Schema};

    use fsk_accel::AccelLeaseManager;
    use fsk_common::{SummaryLevel, WriteSessionConfig};

    use crate::destination::LocalFsDestination;
    use crate::encoder::ArrowParquetEncoder;

    use super::WriteJobConfigurator;

    fn configurator() -> WriteJobConfigurator {
        WriteJobConfigurator::new(
            AccelLeaseManager::new(),
            Arc::new(ArrowParquetEncoder),
            Arc::new(LocalFsDestination),
        )
    }

    fn schema() -> arrow_schema::SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, false),
        ]))
    }

    #[test]
    fn snappy_jobs_get_the_codec_extension() {
        let (_descriptor, factory) = configurator()
            .configure(&WriteSessionConfig::default(), &HashMap::new(), schema())
            .expect("configure");
        assert_eq!(factory.file_extension(), ".snappy.parquet");
    }

    #[test]
    fn uncompressed_jobs_get_the_bare_format_extension() {
        let mut options = HashMap::new();
        options.insert("write.compression_codec".to_string(), "none".to_string());
        let (_descriptor, factory) = configurator()
            .configure(&WriteSessionConfig::default(), &options, schema())
            .expect("configure");
        assert_eq!(factory.file_extension(), ".parquet");

        options.insert(
            "write.compression_codec".to_string(),
            "uncompressed".to_string(),
        );
        let (_descriptor, factory) = configurator()
            .configure(&WriteSessionConfig::default(), &options, schema())
            .expect("configure");
        assert_eq!(factory.file_extension(), ".parquet");
    }

    #[test]
    fn unsupported_codec_fails_configuration_before_any_task() {
        let mut options = HashMap::new();
        options.insert("write.compression_codec".to_string(), "GZIP".to_string());
        let err = configurator()
            .configure(&WriteSessionConfig::default(), &options, schema())
            .expect_err("gzip must fail");
        assert!(err.to_string().contains("'gzip'"), "got: {err}");
    }

    #[test]
    fn legacy_format_fails_configuration() {
        let mut options = HashMap::new();
        options.insert("write.legacy_format".to_string(), "true".to_string());
        let err = configurator()
            .configure(&WriteSessionConfig::default(), &options, schema())
            .expect_err("legacy must fail");
        assert!(err.to_string().contains("legacy"), "got: {err}");
    }

    #[test]
    fn millisecond_precision_fails_configuration() {
        let mut options = HashMap::new();
        options.insert(
            "write.timestamp_precision".to_string(),
            "millis".to_string(),
        );
        let err = configurator()
            .configure(&WriteSessionConfig::default(), &options, schema())
            .expect_err("millis must fail");
        assert!(err.to_string().contains("'millis'"), "got: {err}");
    }

    #[test]
    fn summary_request_degrades_to_none_when_committer_cannot_summarize() {
        let mut options = HashMap::new();
        options.insert("write.summary_level".to_string(), "job".to_string());
        options.insert("write.committer".to_string(), "direct".to_string());
        let (descriptor, _factory) = configurator()
            .configure(&WriteSessionConfig::default(), &options, schema())
            .expect("summary degradation must not fail the job");
        assert_eq!(descriptor.summary_level(), SummaryLevel::None);
    }

    #[test]
    fn summary_request_is_honored_by_the_standard_committer() {
        let mut options = HashMap::new();
        options.insert("write.summary_level".to_string(), "job".to_string());
        let (descriptor, _factory) = configurator()
            .configure(&WriteSessionConfig::default(), &options, schema())
            .expect("configure");
        assert_eq!(descriptor.summary_level(), SummaryLevel::Job);
    }

    #[test]
    fn schema_metadata_lands_on_the_descriptor_sorted() {
        let mut metadata = HashMap::new();
        metadata.insert("zz.hint".to_string(), "point".to_string());
        metadata.insert("aa.hint".to_string(), "geometry".to_string());
        let schema = Arc::new(
            Schema::new(vec![Field::new("id", DataType::Int64, false)])
                .with_metadata(metadata),
        );
        let (descriptor, _factory) = configurator()
            .configure(&WriteSessionConfig::default(), &HashMap::new(), schema)
            .expect("configure");
        assert_eq!(
            descriptor.key_value_metadata(),
            &[
                ("aa.hint".to_string(), "geometry".to_string()),
                ("zz.hint".to_string(), "point".to_string()),
            ]
        );
    }
}
