//! Greedy selection through farthest point sampling.
//!
//! Farthest point sampling repeatedly picks the candidate whose minimum
//! squared Euclidean distance to the already selected set is largest. The
//! running minimum distance vector (the "Hausdorff" vector) is maintained
//! incrementally: after a selection only the distances to the new item are
//! computed, through the identity
//!
//! $d(i, s) = \lVert x_i \rVert^2 + \lVert x_s \rVert^2 - 2 \langle x_i, x_s\rangle,$
//!
//! and folded into the vector by an element-wise minimum. This update is
//! the performance critical inner loop of the search.
//!
//! A selected item's own distance collapses to zero, which keeps it from
//! ever winning the arg-max again; no explicit visited set is maintained,
//! so the element-wise minimum must never be skipped.

use crate::greedy::{GreedyScorer, SelectionState};
use crate::types::{Result, SelectionError};
use crate::SelectionAxis;
use ndarray::{Array1, ArrayView1, ArrayView2, Zip};
use ndarray_linalg::{Lapack, Scalar};
use num::{Float, Zero};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Choice of the first item of a farthest point search.
#[derive(Clone, Copy, Debug)]
pub enum FPSStart {
    /// Start from a fixed candidate index
    INDEX(usize),
    /// Start from a uniformly drawn candidate
    RANDOM,
}

/// Farthest point sampling scoring strategy.
pub struct FPS<A: Scalar> {
    axis: SelectionAxis,
    start: FPSStart,
    seed: Option<u64>,
    norms: Array1<A::Real>,
    min_distance: Array1<A::Real>,
}

impl<A: Scalar + Lapack> FPS<A> {
    /// Create an FPS scorer that selects along `axis`, starting at
    /// candidate 0.
    pub fn new(axis: SelectionAxis) -> Self {
        FPS {
            axis,
            start: FPSStart::INDEX(0),
            seed: None,
            norms: Array1::zeros(0),
            min_distance: Array1::zeros(0),
        }
    }

    /// Configure the first selected candidate.
    pub fn with_start(mut self, start: FPSStart) -> Self {
        self.start = start;
        self
    }

    /// Seed the random start draw for reproducible searches.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The running minimum squared distance of every candidate to the
    /// selected set.
    pub fn min_distance(&self) -> ArrayView1<A::Real> {
        self.min_distance.view()
    }

    fn candidate_norms(&self, x: ArrayView2<A>) -> Array1<A::Real> {
        let axis = self.axis.candidate_axis();
        let mut norms = Array1::<A::Real>::zeros(x.len_of(axis));
        for (norm, candidate) in norms.iter_mut().zip(x.axis_iter(axis)) {
            *norm = candidate
                .iter()
                .fold(A::Real::zero(), |acc, item| acc + item.square());
        }
        norms
    }

    fn start_index(&self, n_candidates: usize) -> Result<usize> {
        match self.start {
            FPSStart::INDEX(index) if index < n_candidates => Ok(index),
            FPSStart::INDEX(index) => Err(SelectionError::InvalidParameter(format!(
                "Start index {} is out of range for {} candidates",
                index, n_candidates
            ))),
            FPSStart::RANDOM => Ok(match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed).gen_range(0..n_candidates),
                None => rand::thread_rng().gen_range(0..n_candidates),
            }),
        }
    }

    /// Fold the distances to the item `last_selected` into the running
    /// minimum distance vector.
    fn fold_distances(&mut self, x: ArrayView2<A>, last_selected: usize) {
        let two = A::real(2.0);
        let zero = A::Real::zero();
        let last_norm = self.norms[last_selected];

        let products = match self.axis {
            SelectionAxis::COLUMNS => {
                let reference = x.column(last_selected).mapv(|item| item.conj());
                reference.dot(&x)
            }
            SelectionAxis::ROWS => {
                let reference = x.row(last_selected).mapv(|item| item.conj());
                x.dot(&reference)
            }
        };

        Zip::from(&mut self.min_distance)
            .and(&self.norms)
            .and(&products)
            .for_each(|distance, &norm, &product| {
                let mut candidate = norm + last_norm - two * product.re();
                // Rounding must not push a distance below zero.
                if candidate < zero {
                    candidate = zero;
                }
                if candidate < *distance {
                    *distance = candidate;
                }
            });
    }
}

impl<A: Scalar + Lapack> GreedyScorer for FPS<A> {
    type A = A;

    fn axis(&self) -> SelectionAxis {
        self.axis
    }

    fn initialize(
        &mut self,
        x: ArrayView2<A>,
        _y: Option<ArrayView2<A>>,
    ) -> Result<Option<usize>> {
        let n_candidates = x.len_of(self.axis.candidate_axis());
        self.norms = self.candidate_norms(x);
        let start = self.start_index(n_candidates)?;
        self.min_distance = Array1::from_elem(n_candidates, A::Real::infinity());
        Ok(Some(start))
    }

    fn reinitialize(
        &mut self,
        x: ArrayView2<A>,
        _y: Option<ArrayView2<A>>,
        state: &SelectionState<A>,
    ) -> Result<()> {
        let n_candidates = x.len_of(self.axis.candidate_axis());
        self.norms = self.candidate_norms(x);
        self.min_distance = Array1::from_elem(n_candidates, A::Real::infinity());

        // Replaying the updates in commitment order reconstructs the
        // distance bookkeeping of the uninterrupted run exactly.
        for &index in state.selected_indices() {
            self.fold_distances(x, index);
        }
        Ok(())
    }

    fn scores(&self) -> ArrayView1<A::Real> {
        self.min_distance.view()
    }

    fn update(
        &mut self,
        x: ArrayView2<A>,
        _y: Option<ArrayView2<A>>,
        _state: &SelectionState<A>,
        last_selected: usize,
    ) -> Result<()> {
        self.fold_distances(x, last_selected);
        Ok(())
    }
}
