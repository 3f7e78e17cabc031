//! Progress reporting for long running selections.

/// Observer for the progress of a greedy search.
///
/// The selector calls `report` once after every committed selection. The
/// hook is a transparent pass-through and has no effect on control flow.
pub trait ReportProgress {
    fn report(&mut self, n_selected: usize, n_total: usize);
}

/// Progress reporter that swallows all updates.
#[derive(Default)]
pub struct NoProgress;

impl ReportProgress for NoProgress {
    fn report(&mut self, _n_selected: usize, _n_total: usize) {}
}
