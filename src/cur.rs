//! Greedy selection guided by the CUR decomposition.
//!
//! A CUR decomposition approximates a matrix through actual columns and
//! rows of the matrix itself rather than through abstract factors. The
//! greedy variant implemented here ranks every candidate column (or row)
//! by the importance score
//!
//! $\pi_j = \sum_i^k (V)_{ji}^2$
//!
//! over the $k$ leading right singular vectors of the current residual
//! matrix when selecting columns, and the analogous sum over left singular
//! vectors when selecting rows. The two variants are the same algorithm
//! applied to the matrix and its transpose and are covered by one
//! component keyed by the selection axis.
//!
//! In iterative mode (the default) the residual matrix is orthogonalized
//! against every selection before the scores are recomputed, so each pick
//! measures what the remaining candidates add beyond the selected set. An
//! optional target matrix is kept orthogonalized by regression against the
//! selected items.

use crate::compute_svd::truncated_svd;
use crate::greedy::{GreedyScorer, SelectionState};
use crate::orthogonalize::{project_out_column, regress_out_features, regress_out_samples};
use crate::types::{Result, SelectionError};
use crate::SelectionAxis;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use ndarray_linalg::{Lapack, Scalar};
use num::Zero;

/// CUR scoring strategy.
pub struct CUR<A: Scalar> {
    axis: SelectionAxis,
    k: usize,
    iterative: bool,
    tolerance: f64,
    x_current: Array2<A>,
    y_current: Option<Array2<A>>,
    importance: Array1<A::Real>,
    scores: Array1<A::Real>,
}

impl<A: Scalar + Lapack> CUR<A> {
    /// Create a CUR scorer that selects along `axis`.
    pub fn new(axis: SelectionAxis) -> Self {
        CUR {
            axis,
            k: 1,
            iterative: true,
            tolerance: 1E-12,
            x_current: Array2::zeros((0, 0)),
            y_current: None,
            importance: Array1::zeros(0),
            scores: Array1::zeros(0),
        }
    }

    /// Number of singular triplets used for the importance score.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Whether to orthogonalize the residual matrix after every selection.
    pub fn with_iterative(mut self, iterative: bool) -> Self {
        self.iterative = iterative;
        self
    }

    /// Threshold below which importance scores are considered zero.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// The raw importance vector of the current residual state.
    pub fn importance(&self) -> ArrayView1<A::Real> {
        self.importance.view()
    }

    /// The target residual after regression onto the selected items, if
    /// targets were supplied.
    pub fn residual_targets(&self) -> Option<ArrayView2<A>> {
        self.y_current.as_ref().map(|targets| targets.view())
    }

    fn check_k(&self) -> Result<()> {
        if self.k == 0 {
            return Err(SelectionError::InvalidParameter(
                "The number of singular triplets k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn compute_importance(&self, x: ArrayView2<A>) -> Result<Array1<A::Real>> {
        let svd = truncated_svd(x, self.k)?;

        let importance = match self.axis {
            SelectionAxis::COLUMNS => {
                let mut importance = Array1::<A::Real>::zeros(x.ncols());
                for singvec in svd.vt.axis_iter(Axis(0)) {
                    Zip::from(&mut importance)
                        .and(singvec)
                        .for_each(|pi, &component| {
                            *pi += component.re() * component.re();
                        });
                }
                importance
            }
            SelectionAxis::ROWS => {
                let mut importance = Array1::<A::Real>::zeros(x.nrows());
                for singvec in svd.u.axis_iter(Axis(1)) {
                    Zip::from(&mut importance)
                        .and(singvec)
                        .for_each(|pi, &component| {
                            *pi += component.re() * component.re();
                        });
                }
                importance
            }
        };

        Ok(importance)
    }

    /// Recompute the importance of the still eligible candidates from the
    /// residual matrix and force the importance of every selected item to
    /// exactly zero.
    fn recompute_eligible(&mut self, state: &SelectionState<A>) -> Result<()> {
        let n_candidates = self.importance.len();
        let eligible: Vec<usize> = (0..n_candidates)
            .filter(|index| !state.selected_indices().contains(index))
            .collect();

        if !eligible.is_empty() {
            let submatrix = self
                .x_current
                .select(self.axis.candidate_axis(), &eligible);
            let partial = self.compute_importance(submatrix.view())?;
            for (&index, &pi) in eligible.iter().zip(partial.iter()) {
                self.importance[index] = pi;
            }
        }

        for &index in state.selected_indices() {
            self.importance[index] = A::Real::zero();
        }

        Ok(())
    }

    /// Eligibility masking of the score vector, derived directly from the
    /// committed indices: a selected candidate can never win the arg-max
    /// again, independent of the raw importance values.
    fn refresh_scores(&mut self, state: &SelectionState<A>) {
        self.scores = self.importance.clone();
        for &index in state.selected_indices() {
            self.scores[index] = A::Real::zero();
        }
    }

    fn project_out(&mut self, index: usize) {
        let tol = A::real(self.tolerance);
        match self.axis {
            SelectionAxis::COLUMNS => project_out_column(self.x_current.view_mut(), index, tol),
            SelectionAxis::ROWS => {
                project_out_column(self.x_current.view_mut().reversed_axes(), index, tol)
            }
        }
    }

    fn regress_targets(
        &self,
        y: ArrayView2<A>,
        state: &SelectionState<A>,
    ) -> Result<Array2<A>> {
        match self.axis {
            SelectionAxis::COLUMNS => regress_out_features(y, state.selected_data()),
            SelectionAxis::ROWS => {
                let y_ref = state.selected_targets().ok_or_else(|| {
                    SelectionError::InvalidParameter(
                        "Sample selection received targets that were absent when the search state was created"
                            .to_string(),
                    )
                })?;
                regress_out_samples(y, self.x_current.view(), state.selected_data(), y_ref)
            }
        }
    }
}

impl<A: Scalar + Lapack> GreedyScorer for CUR<A> {
    type A = A;

    fn axis(&self) -> SelectionAxis {
        self.axis
    }

    fn initialize(
        &mut self,
        x: ArrayView2<A>,
        y: Option<ArrayView2<A>>,
    ) -> Result<Option<usize>> {
        self.check_k()?;

        self.x_current = x.to_owned();
        self.y_current = y.map(|array| array.to_owned());
        self.importance = self.compute_importance(x)?;
        self.scores = self.importance.clone();

        Ok(None)
    }

    fn reinitialize(
        &mut self,
        x: ArrayView2<A>,
        y: Option<ArrayView2<A>>,
        state: &SelectionState<A>,
    ) -> Result<()> {
        self.check_k()?;

        let n_candidates = x.len_of(self.axis.candidate_axis());

        if self.iterative {
            // Replaying the projections in commitment order reconstructs
            // the residual of the uninterrupted run exactly.
            self.x_current = x.to_owned();
            for &index in state.selected_indices() {
                self.project_out(index);
            }
            self.y_current = match y {
                Some(y) => Some(self.regress_targets(y, state)?),
                None => None,
            };
            self.importance = Array1::zeros(n_candidates);
            self.recompute_eligible(state)?;
        } else {
            // Static scores are derived from the original matrix.
            self.x_current = x.to_owned();
            self.y_current = y.map(|array| array.to_owned());
            self.importance = self.compute_importance(x)?;
        }

        self.refresh_scores(state);
        Ok(())
    }

    fn scores(&self) -> ArrayView1<A::Real> {
        self.scores.view()
    }

    fn update(
        &mut self,
        _x: ArrayView2<A>,
        y: Option<ArrayView2<A>>,
        state: &SelectionState<A>,
        last_selected: usize,
    ) -> Result<()> {
        if self.iterative {
            self.project_out(last_selected);
            if let Some(y) = y {
                self.y_current = Some(self.regress_targets(y, state)?);
            }
            self.recompute_eligible(state)?;
        }

        self.refresh_scores(state);
        Ok(())
    }

    fn default_threshold(&self) -> Option<f64> {
        Some(self.tolerance)
    }
}
