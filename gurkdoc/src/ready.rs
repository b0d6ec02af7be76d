//! One-shot readiness signals with bounded waits.
//!
//! A page pass that depends on something loaded elsewhere (the definition
//! table, the math typesetter) holds a [`ReadyHandle`] and awaits it with a
//! timeout. The owner calls [`Ready::provide`] once the value exists.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("timed out after {}ms waiting for {what}", .after.as_millis())]
    Timeout { what: String, after: Duration },
    #[error("{what} will never become ready")]
    Abandoned { what: String },
}

/// Producer side.
pub struct Ready<T> {
    what: String,
    tx: watch::Sender<Option<Arc<T>>>,
}

/// Consumer side; cheap to clone.
pub struct ReadyHandle<T> {
    what: String,
    rx: watch::Receiver<Option<Arc<T>>>,
}

impl<T> Clone for ReadyHandle<T> {
    fn clone(&self) -> Self {
        ReadyHandle {
            what: self.what.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<T> Ready<T> {
    /// `what` names the dependency in errors and logs.
    pub fn new(what: &str) -> Self {
        let (tx, _) = watch::channel(None);
        Ready {
            what: what.to_string(),
            tx,
        }
    }

    pub fn handle(&self) -> ReadyHandle<T> {
        ReadyHandle {
            what: self.what.clone(),
            rx: self.tx.subscribe(),
        }
    }

    pub fn provide(&self, value: T) {
        tracing::debug!(what = %self.what, "ready");
        self.tx.send_replace(Some(Arc::new(value)));
    }
}

impl<T> ReadyHandle<T> {
    /// A handle that is ready from the start.
    pub fn ready(what: &str, value: T) -> Self {
        let ready = Ready::new(what);
        ready.provide(value);
        ready.handle()
    }

    pub fn what(&self) -> &str {
        &self.what
    }

    /// The value, if it has been provided.
    pub fn get(&self) -> Option<Arc<T>> {
        self.rx.borrow().clone()
    }

    /// Wait until the value is provided, at most `timeout`.
    pub async fn wait(&self, timeout: Duration) -> Result<Arc<T>, WaitError> {
        let mut rx = self.rx.clone();
        let waited = tokio::time::timeout(timeout, rx.wait_for(Option::is_some)).await;
        match waited {
            Err(_) => Err(WaitError::Timeout {
                what: self.what.clone(),
                after: timeout,
            }),
            Ok(Err(_)) => Err(self.abandoned()),
            Ok(Ok(value)) => {
                let value: Option<Arc<T>> = (*value).clone();
                value.ok_or_else(|| self.abandoned())
            }
        }
    }

    fn abandoned(&self) -> WaitError {
        WaitError::Abandoned {
            what: self.what.clone(),
        }
    }
}
