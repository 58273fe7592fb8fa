use std::time::{Duration, Instant};

/// 重新掃描的延遲計時器。 / Restartable delay before a rescan runs.
///
/// Every edit restarts the timer; at most one rescan is pending at a time.
/// The caller's event loop supplies `now`, so the timer never blocks.
#[derive(Debug, Clone)]
pub struct RescanDebouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl RescanDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// 重新啟動計時。 / Restarts the timer, replacing any pending deadline.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// 取消等待中的掃描。 / Cancels the pending rescan, returning whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// 期限已到時回傳 `true` 並清除計時。 / Returns `true` once when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
