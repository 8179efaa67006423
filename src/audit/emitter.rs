//! Asynchronous audit emitter

use super::sink::AuditSink;
use super::types::AuditEvent;
use crate::config::AuditConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

enum AuditMessage {
    Event(Box<AuditEvent>),
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget producer of audit events
///
/// Events go through a bounded channel to a background task that hands them
/// to the sink. When the buffer is full the event is dropped and counted, or
/// with `drop_on_overflow: false` handed to a task that waits for room. Such
/// a deferred event may reach the sink after events emitted later.
pub struct AuditEmitter {
    sender: Option<mpsc::Sender<AuditMessage>>,
    config: AuditConfig,
    dropped: AtomicU64,
}

impl std::fmt::Debug for AuditEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditEmitter")
            .field("enabled", &self.sender.is_some())
            .field("dropped", &self.dropped_count())
            .finish()
    }
}

impl AuditEmitter {
    /// Create an emitter draining into `sink`
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(config: AuditConfig, sink: Arc<dyn AuditSink>) -> Self {
        if !config.enabled {
            return Self::disabled();
        }

        let (sender, mut receiver) = mpsc::channel::<AuditMessage>(config.buffer_size.max(1));

        tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                match message {
                    AuditMessage::Event(event) => {
                        let event_id = event.id;
                        if let Err(e) = sink.record(*event).await {
                            error!(%event_id, error = %e, "Audit sink rejected event");
                        }
                    }
                    AuditMessage::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("Audit emitter channel closed");
        });

        Self {
            sender: Some(sender),
            config,
            dropped: AtomicU64::new(0),
        }
    }

    /// Emitter that discards everything
    pub fn disabled() -> Self {
        Self {
            sender: None,
            config: AuditConfig {
                enabled: false,
                ..AuditConfig::default()
            },
            dropped: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Queue an event without waiting
    pub fn emit(&self, event: AuditEvent) {
        let Some(sender) = &self.sender else {
            return;
        };

        match sender.try_send(AuditMessage::Event(Box::new(event))) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(message)) => {
                if self.config.drop_on_overflow {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    debug!("Audit buffer full, event dropped");
                    return;
                }
                match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => {
                        let sender = sender.clone();
                        runtime.spawn(async move {
                            if sender.send(message).await.is_err() {
                                error!("Audit channel closed, deferred event dropped");
                            }
                        });
                    }
                    Err(_) => {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        warn!("Audit buffer full outside a runtime, event dropped");
                    }
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                error!("Audit channel closed, event dropped");
            }
        }
    }

    /// Wait until every event queued before this call reached the sink
    pub async fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };
        let (done, wait) = oneshot::channel();
        if sender.send(AuditMessage::Flush(done)).await.is_ok() {
            let _ = wait.await;
        }
    }

    /// Events lost to a full or closed buffer
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
