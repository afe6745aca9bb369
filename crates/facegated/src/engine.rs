use facegate_core::{FaceAnalyzer, Reference, RgbFrame, Strategy, Verdict, VerifyError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Requests queued ahead of the engine thread before callers wait.
const ENGINE_QUEUE_DEPTH: usize = 4;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error("face analysis panicked: {0}")]
    Panicked(String),
    #[error("engine thread exited")]
    ChannelClosed,
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Messages sent from HTTP handlers to the engine thread.
enum EngineRequest {
    Verify {
        probe: RgbFrame,
        reply: oneshot::Sender<Result<Verdict, EngineError>>,
    },
}

/// Clone-safe handle to the engine thread.
///
/// The reference is shared read-only with the thread; readiness and strategy
/// are answered here without a round trip.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
    reference: Arc<dyn Reference>,
    analyzer_loaded: bool,
}

impl EngineHandle {
    /// Verify one probe frame against the reference.
    pub async fn verify(&self, probe: RgbFrame) -> Result<Verdict, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Verify {
                probe,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    pub fn is_ready(&self) -> bool {
        self.reference.is_ready()
    }

    pub fn strategy(&self) -> Strategy {
        self.reference.strategy()
    }

    pub fn analyzer_loaded(&self) -> bool {
        self.analyzer_loaded
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// The thread owns the analyzer (its inference sessions need exclusive
/// access) and serves verification requests one at a time. A panic inside
/// the analyzer fails that request only.
pub fn spawn_engine(
    mut analyzer: Box<dyn FaceAnalyzer>,
    reference: Arc<dyn Reference>,
) -> Result<EngineHandle, EngineError> {
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(ENGINE_QUEUE_DEPTH);
    let analyzer_loaded = analyzer.is_loaded();
    let thread_reference = Arc::clone(&reference);

    std::thread::Builder::new()
        .name("facegate-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Verify { probe, reply } => {
                        let result = panic::catch_unwind(AssertUnwindSafe(|| {
                            thread_reference.verify(analyzer.as_mut(), &probe)
                        }));
                        let result = match result {
                            Ok(outcome) => outcome.map_err(EngineError::from),
                            Err(payload) => {
                                let message = panic_message(payload.as_ref());
                                tracing::error!(error = %message, "face analysis panicked");
                                Err(EngineError::Panicked(message))
                            }
                        };
                        let _ = reply.send(result);
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle {
        tx,
        reference,
        analyzer_loaded,
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
