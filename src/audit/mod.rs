//! Audit emission
//!
//! The core produces audit events; persisting them is the job of an external
//! collaborator behind [`AuditSink`]. Emission is fire-and-forget through a
//! bounded channel so request paths never wait on the sink.

mod emitter;
mod sink;
mod types;

pub use emitter::AuditEmitter;
pub use sink::{AuditSink, MemoryAuditSink, TracingAuditSink};
pub use types::{AuditEvent, AuditEventType};
