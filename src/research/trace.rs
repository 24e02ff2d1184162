use crate::research::collaborators::{TraceEvent, TraceRecord, TraceSink};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Writes trace records to the `delve::trace` log target.
///
/// With a `trace_url_base` configured, the run-start record also logs a
/// link to the run in an external trace viewer.
#[derive(Debug, Default)]
pub struct LogTraceSink {
    trace_url_base: Option<String>,
}

impl LogTraceSink {
    pub fn new(trace_url_base: Option<String>) -> Self {
        Self { trace_url_base }
    }

    pub fn trace_url(&self, correlation_id: &str) -> Option<String> {
        self.trace_url_base
            .as_ref()
            .map(|base| format!("{}{}", base, correlation_id))
    }
}

impl TraceSink for LogTraceSink {
    fn record(&self, record: TraceRecord) {
        let correlation_id = record.correlation_id.as_ref();
        match &record.event {
            TraceEvent::RunStarted { query } => {
                let url = self.trace_url(correlation_id);
                info!(
                    target: "delve::trace",
                    correlation_id,
                    query = %query,
                    trace_url = url.as_deref().unwrap_or("-"),
                    "run started"
                );
            }
            TraceEvent::StageEntered { stage } => {
                info!(target: "delve::trace", correlation_id, stage = %stage, "stage entered");
            }
            TraceEvent::SearchSettled {
                plan_index,
                succeeded,
            } => {
                info!(
                    target: "delve::trace",
                    correlation_id,
                    plan_index,
                    succeeded,
                    "search settled"
                );
            }
            TraceEvent::DeliveryFailed { reason } => {
                info!(target: "delve::trace", correlation_id, reason = %reason, "delivery failed");
            }
            TraceEvent::RunFinished { stage } => {
                info!(target: "delve::trace", correlation_id, stage = %stage, "run finished");
            }
        }
    }
}

/// Keeps every record in memory, for inspection after a run.
#[derive(Debug, Clone, Default)]
pub struct MemoryTraceSink {
    records: Arc<Mutex<Vec<TraceRecord>>>,
}

impl MemoryTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().clone()
    }

    /// Records belonging to one run
    pub fn for_run(&self, correlation_id: &str) -> Vec<TraceRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.correlation_id.as_ref() == correlation_id)
            .cloned()
            .collect()
    }
}

impl TraceSink for MemoryTraceSink {
    fn record(&self, record: TraceRecord) {
        self.records.lock().push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::session::Stage;

    #[test]
    fn test_trace_url() {
        let sink = LogTraceSink::new(Some("https://traces.example.com/t/".into()));
        assert_eq!(
            sink.trace_url("trace_1").as_deref(),
            Some("https://traces.example.com/t/trace_1")
        );
        assert!(LogTraceSink::default().trace_url("trace_1").is_none());
    }

    #[test]
    fn test_memory_sink_filters_by_run() {
        let sink = MemoryTraceSink::new();
        let a: Arc<str> = "trace_a".into();
        let b: Arc<str> = "trace_b".into();
        sink.record(TraceRecord::new(&a, TraceEvent::StageEntered { stage: Stage::Planning }));
        sink.record(TraceRecord::new(&b, TraceEvent::StageEntered { stage: Stage::Planning }));
        sink.record(TraceRecord::new(&a, TraceEvent::RunFinished { stage: Stage::Done }));

        assert_eq!(sink.records().len(), 3);
        let run_a = sink.for_run("trace_a");
        assert_eq!(run_a.len(), 2);
        assert_eq!(run_a[1].event, TraceEvent::RunFinished { stage: Stage::Done });
    }

    #[test]
    fn test_record_serializes_flat() {
        let id: Arc<str> = "trace_x".into();
        let record = TraceRecord::new(
            &id,
            TraceEvent::SearchSettled {
                plan_index: 2,
                succeeded: false,
            },
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["correlation_id"], "trace_x");
        assert_eq!(value["event"], "search_settled");
        assert_eq!(value["plan_index"], 2);
    }
}
