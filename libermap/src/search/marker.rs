//! Temporary search-result pin.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::coord::Coordinate;
use crate::map::{MapView, MarkerSlot};

/// Default lifetime of a pin before it is removed.
pub const DEFAULT_MARKER_TIMEOUT: Duration = Duration::from_secs(5);

/// The single search pin and its removal timer.
///
/// Every placement gets a sequence number. The timer task only reports the
/// sequence back; [`PinMarker::expire`] ignores reports for anything but the
/// latest placement, so a timer that fires just as it is cancelled cannot
/// remove a newer pin.
#[derive(Debug)]
pub struct PinMarker {
    timeout: Duration,
    pending: Option<(u64, CancellationToken)>,
    next_seq: u64,
}

impl PinMarker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pending: None,
            next_seq: 0,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Place the pin at `position`, replacing any previous pin and its timer.
    ///
    /// The removal timer runs on the current tokio runtime and sends
    /// `expired(seq)` on `tx` when it elapses.
    pub fn place<M, F>(
        &mut self,
        map: &mut dyn MapView,
        position: Coordinate,
        tx: &mpsc::UnboundedSender<M>,
        expired: F,
    ) -> u64
    where
        M: Send + 'static,
        F: FnOnce(u64) -> M + Send + 'static,
    {
        self.cancel_timer();
        map.set_marker(MarkerSlot::Search, Some(position));

        self.next_seq += 1;
        let seq = self.next_seq;
        let token = CancellationToken::new();
        let cancel = token.clone();
        let tx = tx.clone();
        let timeout = self.timeout;

        tokio::spawn(async move {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    trace!(seq, "Pin timer cancelled");
                }

                _ = tokio::time::sleep(timeout) => {
                    let _ = tx.send(expired(seq));
                }
            }
        });

        self.pending = Some((seq, token));
        debug!(seq, %position, "Pin placed");
        seq
    }

    /// Timer report for `seq`. Removes the pin if `seq` is the latest
    /// placement and its timer is still pending.
    pub fn expire(&mut self, map: &mut dyn MapView, seq: u64) -> bool {
        match &self.pending {
            Some((current, _)) if *current == seq => {
                self.pending = None;
                map.set_marker(MarkerSlot::Search, None);
                debug!(seq, "Pin expired");
                true
            }
            _ => {
                trace!(seq, "Stale pin timer ignored");
                false
            }
        }
    }

    /// Remove the pin now and cancel its timer.
    pub fn clear(&mut self, map: &mut dyn MapView) {
        self.cancel_timer();
        map.set_marker(MarkerSlot::Search, None);
    }

    pub fn cancel_timer(&mut self) {
        if let Some((_, token)) = self.pending.take() {
            token.cancel();
        }
    }

    pub fn is_timer_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Default for PinMarker {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_TIMEOUT)
    }
}
