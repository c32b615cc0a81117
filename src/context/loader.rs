// One-shot context loader and the readiness handle consumers wait on.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use super::{ContextError, PageContext};

pub type ContextResult = Result<Arc<PageContext>, ContextError>;

/// Producer side of the readiness signal. `load` consumes it, so a page
/// resolves its context exactly once.
pub struct ContextLoader {
    tx: watch::Sender<Option<ContextResult>>,
}

/// Consumer side. Cheap to clone; every clone observes the same result.
#[derive(Clone)]
pub struct ContextHandle {
    rx: watch::Receiver<Option<ContextResult>>,
}

impl ContextLoader {
    pub fn new() -> (Self, ContextHandle) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, ContextHandle { rx })
    }

    /// Parse the embedded payload and fire the readiness signal.
    ///
    /// `payload` is the inner text of the context element, `None` when the
    /// page has no such element. The signal fires whether or not parsing
    /// succeeds.
    pub fn load(self, payload: Option<&str>) -> ContextResult {
        let result = match payload {
            Some(raw) => match serde_json::from_str::<PageContext>(raw.trim()) {
                Ok(ctx) => {
                    info!("loaded context {:?}", ctx);
                    Ok(Arc::new(ctx))
                }
                Err(e) => {
                    error!("failed parsing context: {}", e);
                    Err(ContextError::Malformed(e.to_string()))
                }
            },
            None => {
                error!("failed loading context: payload element missing");
                Err(ContextError::Missing)
            }
        };
        self.tx.send_replace(Some(result.clone()));
        result
    }
}

impl ContextHandle {
    /// Wait for the readiness signal and return the load result.
    pub async fn ready(&self) -> ContextResult {
        let mut rx = self.rx.clone();
        loop {
            if let Some(result) = rx.borrow_and_update().clone() {
                return result;
            }
            if rx.changed().await.is_err() {
                // Sender gone; a final value may still have been published.
                return rx.borrow().clone().unwrap_or(Err(ContextError::Abandoned));
            }
        }
    }

    /// The load result, or `None` while the signal has not fired yet.
    pub fn get(&self) -> Option<ContextResult> {
        self.rx.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.rx.borrow().is_some()
    }
}
