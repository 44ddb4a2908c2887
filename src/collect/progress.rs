/// A trait for reporting progress of long-running collection runs.
pub trait Progress: Send + Sync {
    /// Set the phase label for the current operation (e.g., "Discovering", "Collecting").
    fn set_phase(&self, phase: &str);

    /// Report that `completed` of `total` entities have been fully merged.
    ///
    /// `total` is advisory, it comes from a cheap discovery estimate and must
    /// never gate correctness.
    fn advance(&self, completed: u64, total: u64);

    /// Finish and clear the progress indicator.
    fn done(&self);
}

/// A progress reporter that discards all updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn set_phase(&self, _phase: &str) {}
    fn advance(&self, _completed: u64, _total: u64) {}
    fn done(&self) {}
}
