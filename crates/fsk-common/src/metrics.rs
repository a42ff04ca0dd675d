use std::sync::{Arc, OnceLock};

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};

use crate::ids::TaskAttemptId;

/// Write-path metrics registry.
///
/// One instance is shared process-wide via [`global_metrics`]; tests build
/// their own to keep assertions isolated.
#[derive(Clone, Debug)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    registry: Registry,
    accel_encode_seconds: HistogramVec,
    accel_lease_wait_seconds: HistogramVec,
    batches_written: CounterVec,
    bytes_staged: CounterVec,
    bytes_transferred: CounterVec,
    encode_failures: CounterVec,
    transfer_failures: CounterVec,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::new()),
        }
    }

    pub fn record_encode(&self, task: &TaskAttemptId, secs: f64, staged_bytes: u64) {
        let labels = task_labels(task);
        let labels = labels.each_ref().map(String::as_str);
        self.inner
            .accel_encode_seconds
            .with_label_values(&labels)
            .observe(secs.max(0.0));
        self.inner
            .bytes_staged
            .with_label_values(&labels)
            .inc_by(staged_bytes as f64);
    }

    pub fn record_lease_wait(&self, task: &TaskAttemptId, secs: f64) {
        let labels = task_labels(task);
        let labels = labels.each_ref().map(String::as_str);
        self.inner
            .accel_lease_wait_seconds
            .with_label_values(&labels)
            .observe(secs.max(0.0));
    }

    pub fn record_transfer(&self, task: &TaskAttemptId, bytes: u64) {
        let labels = task_labels(task);
        let labels = labels.each_ref().map(String::as_str);
        self.inner
            .batches_written
            .with_label_values(&labels)
            .inc();
        self.inner
            .bytes_transferred
            .with_label_values(&labels)
            .inc_by(bytes as f64);
    }

    pub fn inc_encode_failures(&self, task: &TaskAttemptId) {
        let labels = task_labels(task);
        let labels = labels.each_ref().map(String::as_str);
        self.inner
            .encode_failures
            .with_label_values(&labels)
            .inc();
    }

    pub fn inc_transfer_failures(&self, task: &TaskAttemptId) {
        let labels = task_labels(task);
        let labels = labels.each_ref().map(String::as_str);
        self.inner
            .transfer_failures
            .with_label_values(&labels)
            .inc();
    }

    pub fn render_prometheus(&self) -> String {
        let metric_families = self.inner.registry.gather();
        let mut out = Vec::new();
        let enc = TextEncoder::new();
        if enc.encode(&metric_families, &mut out).is_err() {
            return String::new();
        }
        String::from_utf8_lossy(&out).to_string()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn task_labels(task: &TaskAttemptId) -> [String; 3] {
    [
        task.query_id.to_string(),
        task.stage_id.to_string(),
        task.task_id.to_string(),
    ]
}

impl MetricsInner {
    fn new() -> Self {
        let registry = Registry::new();
        let task_label_names = ["query_id", "stage_id", "task_id"];

        let accel_encode_seconds = histogram_vec(
            &registry,
            "fsk_accel_encode_seconds",
            "Accelerator-side batch encode time",
            &task_label_names,
        );
        let accel_lease_wait_seconds = histogram_vec(
            &registry,
            "fsk_accel_lease_wait_seconds",
            "Time spent waiting for the shared accelerator",
            &task_label_names,
        );
        let batches_written = counter_vec(
            &registry,
            "fsk_sink_batches_written_total",
            "Batches committed to their destination",
            &task_label_names,
        );
        let bytes_staged = counter_vec(
            &registry,
            "fsk_sink_bytes_staged_total",
            "Encoded bytes written to local staging",
            &task_label_names,
        );
        let bytes_transferred = counter_vec(
            &registry,
            "fsk_sink_bytes_transferred_total",
            "Bytes copied from staging to the destination",
            &task_label_names,
        );
        let encode_failures = counter_vec(
            &registry,
            "fsk_sink_encode_failures_total",
            "Batch encode failures",
            &task_label_names,
        );
        let transfer_failures = counter_vec(
            &registry,
            "fsk_sink_transfer_failures_total",
            "Destination copy failures",
            &task_label_names,
        );

        Self {
            registry,
            accel_encode_seconds,
            accel_lease_wait_seconds,
            batches_written,
            bytes_staged,
            bytes_transferred,
            encode_failures,
            transfer_failures,
        }
    }
}

fn counter_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> CounterVec {
    let c = CounterVec::new(Opts::new(name, help), labels).expect("counter vec");
    registry
        .register(Box::new(c.clone()))
        .expect("register counter");
    c
}

fn histogram_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> HistogramVec {
    let h = HistogramVec::new(HistogramOpts::new(name, help), labels).expect("histogram vec");
    registry
        .register(Box::new(h.clone()))
        .expect("register histogram");
    h
}

static GLOBAL_METRICS: OnceLock<MetricsRegistry> = OnceLock::new();

pub fn global_metrics() -> &'static MetricsRegistry {
    GLOBAL_METRICS.get_or_init(MetricsRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::MetricsRegistry;
    use crate::ids::TaskAttemptId;

    #[test]
    fn renders_all_metric_families() {
        let m = MetricsRegistry::new();
        let task = TaskAttemptId::new(7, 1, 3, 0);
        m.record_lease_wait(&task, 0.002);
        m.record_encode(&task, 0.05, 4096);
        m.record_transfer(&task, 4096);
        m.inc_encode_failures(&task);
        m.inc_transfer_failures(&task);
        let text = m.render_prometheus();

        assert!(text.contains("fsk_accel_encode_seconds"));
        assert!(text.contains("fsk_accel_lease_wait_seconds"));
        assert!(text.contains("fsk_sink_batches_written_total"));
        assert!(text.contains("fsk_sink_bytes_staged_total"));
        assert!(text.contains("fsk_sink_bytes_transferred_total"));
        assert!(text.contains("fsk_sink_encode_failures_total"));
        assert!(text.contains("fsk_sink_transfer_failures_total"));
    }
}
