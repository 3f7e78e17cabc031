pub mod cur;
pub mod fps;
pub mod greedy;
pub mod orthogonalize;
pub mod progress;

pub mod prelude;
pub mod random_matrix;
pub mod types;

pub(crate) mod compute_svd;

use ndarray::Axis;

/// The number of items a greedy search should select.
#[derive(Clone, Copy, Debug)]
pub enum TargetSize {
    /// Absolute number of items, valid in `[1, n_candidates)`
    COUNT(usize),
    /// Fraction of the candidates in `(0, 1]`, converted by flooring
    FRACTION(f64),
    /// Half of the candidates
    HALF,
}

/// The matrix axis along which items are selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionAxis {
    /// Select columns (features)
    COLUMNS,
    /// Select rows (samples)
    ROWS,
}

impl SelectionAxis {
    /// The ndarray axis that enumerates the candidates.
    pub fn candidate_axis(&self) -> Axis {
        match self {
            SelectionAxis::COLUMNS => Axis(1),
            SelectionAxis::ROWS => Axis(0),
        }
    }
}

pub use cur::CUR;
pub use fps::{FPSStart, FPS};
pub use greedy::{GreedyScorer, GreedySelector, SelectionState, SelectorTraits};
pub use progress::{NoProgress, ReportProgress};
pub use random_matrix::RandomMatrix;
pub use types::{Result, SelectionError};
