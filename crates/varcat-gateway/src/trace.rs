// SPDX-License-Identifier: Apache-2.0

use crate::error::GatewayError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Immutable audit record of one gateway operation.
///
/// Built once per request regardless of outcome; a failed operation still
/// produces a trace carrying the timings accumulated up to the failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationTrace {
    pub operation: String,
    pub user: String,
    /// The query as received, before any gateway rewriting.
    pub query: Value,
    pub options: Value,
    pub catalog_ms: u64,
    pub permission_ms: u64,
    pub storage_ms: u64,
    pub total_ms: u64,
    pub num_results: Option<u64>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

/// Accumulator threaded through the gateway pipeline, finalized exactly
/// once into an [`OperationTrace`].
pub struct TraceRecorder {
    operation: String,
    user: String,
    query: Value,
    options: Value,
    started: Instant,
    catalog: Duration,
    permission: Duration,
    storage: Duration,
}

impl TraceRecorder {
    #[must_use]
    pub fn new(operation: impl Into<String>, query: Value, options: Value) -> Self {
        Self {
            operation: operation.into(),
            user: "anonymous".to_string(),
            query,
            options,
            started: Instant::now(),
            catalog: Duration::ZERO,
            permission: Duration::ZERO,
            storage: Duration::ZERO,
        }
    }

    pub fn set_user(&mut self, user: impl Into<String>) {
        self.user = user.into();
    }

    pub fn add_catalog(&mut self, elapsed: Duration) {
        self.catalog += elapsed;
    }

    pub fn add_permission(&mut self, elapsed: Duration) {
        self.permission += elapsed;
    }

    pub fn add_storage(&mut self, elapsed: Duration) {
        self.storage += elapsed;
    }

    #[must_use]
    pub fn success(self, num_results: u64) -> OperationTrace {
        self.into_trace(Some(num_results), None)
    }

    /// Finalize for an operation that succeeded without a known result
    /// count, e.g. an opened row iterator.
    #[must_use]
    pub fn opened(self) -> OperationTrace {
        self.into_trace(None, None)
    }

    #[must_use]
    pub fn failure(self, error: &GatewayError) -> OperationTrace {
        self.into_trace(None, Some(error))
    }

    fn into_trace(self, num_results: Option<u64>, error: Option<&GatewayError>) -> OperationTrace {
        OperationTrace {
            operation: self.operation,
            user: self.user,
            query: self.query,
            options: self.options,
            catalog_ms: self.catalog.as_millis() as u64,
            permission_ms: self.permission.as_millis() as u64,
            storage_ms: self.storage.as_millis() as u64,
            total_ms: self.started.elapsed().as_millis() as u64,
            num_results,
            error_code: error.map(|e| e.code.as_str().to_string()),
            error_message: error.map(|e| e.message.clone()),
        }
    }
}

/// Destination for operation traces. Recording must not fail the request.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, trace: &OperationTrace);
}

/// Sink that emits traces as structured log events.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, trace: &OperationTrace) {
        match &trace.error_code {
            Some(code) => warn!(
                operation = %trace.operation,
                user = %trace.user,
                catalog_ms = trace.catalog_ms,
                permission_ms = trace.permission_ms,
                storage_ms = trace.storage_ms,
                total_ms = trace.total_ms,
                error = %code,
                message = trace.error_message.as_deref().unwrap_or(""),
                "gateway operation failed"
            ),
            None => info!(
                operation = %trace.operation,
                user = %trace.user,
                catalog_ms = trace.catalog_ms,
                permission_ms = trace.permission_ms,
                storage_ms = trace.storage_ms,
                total_ms = trace.total_ms,
                num_results = trace.num_results.unwrap_or(0),
                "gateway operation completed"
            ),
        }
    }
}

/// Sink that keeps every trace in memory, for tests and dev setups.
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<OperationTrace>>,
}

impl MemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<OperationTrace> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, trace: &OperationTrace) {
        self.records.lock().await.push(trace.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_trace_carries_error_and_timings() {
        let mut recorder = TraceRecorder::new("query", Value::Null, Value::Null);
        recorder.add_catalog(Duration::from_millis(5));
        let error = GatewayError::denied("nope");
        let trace = recorder.failure(&error);

        assert_eq!(trace.operation, "query");
        assert_eq!(trace.catalog_ms, 5);
        assert_eq!(trace.num_results, None);
        assert_eq!(trace.error_code.as_deref(), Some("authorization_denied"));
        assert_eq!(trace.error_message.as_deref(), Some("nope"));
    }

    #[tokio::test]
    async fn memory_sink_keeps_traces_in_order() {
        let sink = MemoryAuditSink::new();
        let first = TraceRecorder::new("count", Value::Null, Value::Null).success(3);
        let second = TraceRecorder::new("query", Value::Null, Value::Null).success(1);
        sink.record(&first).await;
        sink.record(&second).await;

        let records = sink.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].operation, "count");
        assert_eq!(records[1].operation, "query");
    }
}
