//! Convenient re-exports of the crate's public interface.

pub use crate::cur::CUR;
pub use crate::fps::{FPSStart, FPS};
pub use crate::greedy::{GreedyScorer, GreedySelector, SelectionState, SelectorTraits};
pub use crate::orthogonalize::{project_out_column, regress_out_features, regress_out_samples};
pub use crate::progress::{NoProgress, ReportProgress};
pub use crate::random_matrix::RandomMatrix;
pub use crate::types::{Result, SelectionError};
pub use crate::{SelectionAxis, TargetSize};
