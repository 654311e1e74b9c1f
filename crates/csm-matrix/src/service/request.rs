//! Request generations
//!
//! Each channel keeps a counter. Starting a request bumps it, which makes
//! every older token on that channel stale. A stale request ends with
//! `ServiceError::Cancelled` at its next await point.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ServiceError;

/// Independent request streams; a new request only supersedes requests on
/// the same channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Subtree,
    NextPosition,
    Breadcrumbs,
    Standing,
    Eligibility,
    Referrals,
    TaskQueue,
    Submit,
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    channels: Mutex<HashMap<Channel, Arc<AtomicU64>>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, superseding any older one on `channel`.
    pub fn begin(&self, channel: Channel) -> RequestToken {
        let current = Arc::clone(self.channels.lock().entry(channel).or_default());
        let generation = current.fetch_add(1, Ordering::AcqRel) + 1;
        RequestToken {
            channel: Some(channel),
            generation,
            current,
        }
    }

    /// Mark every outstanding request on `channel` stale.
    pub fn cancel(&self, channel: Channel) {
        if let Some(current) = self.channels.lock().get(&channel) {
            current.fetch_add(1, Ordering::AcqRel);
        }
    }
}

/// Handle passed through every service call
#[derive(Clone, Debug)]
pub struct RequestToken {
    channel: Option<Channel>,
    generation: u64,
    current: Arc<AtomicU64>,
}

impl RequestToken {
    /// Token that no other request can supersede.
    pub fn detached() -> Self {
        Self {
            channel: None,
            generation: 0,
            current: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn channel(&self) -> Option<Channel> {
        self.channel
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }

    pub fn check(&self) -> Result<(), ServiceError> {
        if self.is_current() {
            Ok(())
        } else {
            Err(ServiceError::Cancelled)
        }
    }

    /// Await `fut`, then fail if this request went stale meanwhile.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, ServiceError> {
        let out = fut.await;
        self.check()?;
        Ok(out)
    }
}
