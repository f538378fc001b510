// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Secure query gateway.
//!
//! Every variant read path passes through [`SecureQueryGateway`]: it
//! resolves the query's study scope, rewrites catalog predicates, enforces
//! sample-level visibility and only then delegates to the storage engine,
//! emitting one audit trace per operation on every exit path.

mod error;
mod gateway;
mod trace;

pub use error::{GatewayError, GatewayErrorCode};
pub use gateway::SecureQueryGateway;
pub use trace::{AuditSink, MemoryAuditSink, OperationTrace, TraceRecorder, TracingAuditSink};

pub const CRATE_NAME: &str = "varcat-gateway";
