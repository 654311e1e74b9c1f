//! Paging over referral sequence numbers
//!
//! Issued sequence numbers are `1..next_ref_no`. After loading up to `last`
//! the next window is `[last + 1, min(last + 1 + batch, next_ref_no))`.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Half-open range of referral sequence numbers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralWindow {
    pub from: u32,
    pub to: u32,
}

impl ReferralWindow {
    /// Window following `last`; pass 0 for the first window.
    pub fn after(last: u32, next_ref_no: u32, batch: u32) -> Self {
        let from = last.saturating_add(1);
        let to = from.saturating_add(batch).min(next_ref_no).max(from);
        Self { from, to }
    }

    pub fn first(next_ref_no: u32, batch: u32) -> Self {
        Self::after(0, next_ref_no, batch)
    }

    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }

    pub fn len(&self) -> u32 {
        self.to - self.from
    }

    pub fn seq_nos(&self) -> Range<u32> {
        self.from..self.to
    }

    /// Last sequence number in the window, the `last` of the next call.
    pub fn last(&self) -> Option<u32> {
        (!self.is_empty()).then(|| self.to - 1)
    }
}
