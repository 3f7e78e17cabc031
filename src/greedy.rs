//! The greedy selection loop.
//!
//! A greedy search repeatedly asks a scoring strategy for the importance of
//! every candidate column or row, commits the arg-max candidate, and lets
//! the strategy fold the selection into its internal state. The search ends
//! when the requested number of items has been committed, or earlier when
//! the best remaining score falls below a configured threshold. The early
//! stop is a successful, smaller result and not an error.
//!
//! The loop is strictly sequential and the selector owns all search state
//! exclusively; `fit` takes `&mut self`, so concurrent searches on one
//! instance are ruled out by the borrow rules.

use crate::progress::{NoProgress, ReportProgress};
use crate::types::{Result, SelectionError};
use crate::{SelectionAxis, TargetSize};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};
use ndarray_linalg::{Lapack, Scalar};
use num::traits::cast::cast;
use num::Float;

impl TargetSize {
    /// Resolve the configured size against the number of candidates.
    pub fn resolve(&self, n_candidates: usize) -> Result<usize> {
        match *self {
            TargetSize::COUNT(count) => {
                if count >= 1 && count < n_candidates {
                    Ok(count)
                } else {
                    Err(SelectionError::InvalidParameter(format!(
                        "An absolute number of items must lie in [1, {}), got {}",
                        n_candidates, count
                    )))
                }
            }
            TargetSize::FRACTION(fraction) => {
                if fraction > 0.0 && fraction <= 1.0 {
                    Ok((fraction * n_candidates as f64) as usize)
                } else {
                    Err(SelectionError::InvalidParameter(format!(
                        "A fraction of items must lie in (0, 1], got {}",
                        fraction
                    )))
                }
            }
            TargetSize::HALF => Ok(n_candidates / 2),
        }
    }
}

/// A pluggable scoring strategy driven by [`GreedySelector`].
///
/// The selector calls `initialize` (or `reinitialize` on a warm start) once
/// per fit, then alternates between `scores` and `update` until the target
/// count or the score threshold is reached.
pub trait GreedyScorer {
    type A: Scalar + Lapack;

    /// The axis along which candidates are enumerated.
    fn axis(&self) -> SelectionAxis;

    /// Reset the internal state for a fresh search.
    ///
    /// May return the index of a start item the selector has to commit
    /// before the main loop begins.
    fn initialize(
        &mut self,
        x: ArrayView2<Self::A>,
        y: Option<ArrayView2<Self::A>>,
    ) -> Result<Option<usize>>;

    /// Rebuild the internal state from a previously completed search.
    ///
    /// The state is reconstructed, not approximated, so the continuation
    /// follows the same trajectory as an uninterrupted run. The caller must
    /// supply the same `x` and `y` as the earlier search; this is not
    /// verified and violating it silently produces incorrect results.
    fn reinitialize(
        &mut self,
        x: ArrayView2<Self::A>,
        y: Option<ArrayView2<Self::A>>,
        state: &SelectionState<Self::A>,
    ) -> Result<()>;

    /// The current score of every candidate.
    fn scores(&self) -> ArrayView1<<Self::A as Scalar>::Real>;

    /// Fold the most recent selection into the internal state.
    fn update(
        &mut self,
        x: ArrayView2<Self::A>,
        y: Option<ArrayView2<Self::A>>,
        state: &SelectionState<Self::A>,
        last_selected: usize,
    ) -> Result<()>;

    /// The stopping threshold the scorer asks for when the caller does not
    /// configure one.
    fn default_threshold(&self) -> Option<f64> {
        None
    }
}

/// Bookkeeping of the selections committed so far.
///
/// Indices are append-only and unique; the selected data matrix holds the
/// chosen columns or rows in commitment order and always has exactly
/// `n_selected` filled slots outside an in-flight iteration.
pub struct SelectionState<A: Scalar> {
    axis: SelectionAxis,
    selected: Vec<usize>,
    x_selected: Array2<A>,
    y_selected: Option<Array2<A>>,
}

impl<A: Scalar> SelectionState<A> {
    fn new(
        axis: SelectionAxis,
        x: ArrayView2<A>,
        y: Option<ArrayView2<A>>,
        capacity: usize,
    ) -> Self {
        let x_selected = match axis {
            SelectionAxis::COLUMNS => Array2::<A>::zeros((x.nrows(), capacity)),
            SelectionAxis::ROWS => Array2::<A>::zeros((capacity, x.ncols())),
        };

        let y_selected = match (axis, y) {
            (SelectionAxis::ROWS, Some(y)) => Some(Array2::<A>::zeros((capacity, y.ncols()))),
            _ => None,
        };

        SelectionState {
            axis,
            selected: Vec::with_capacity(capacity),
            x_selected,
            y_selected,
        }
    }

    fn grow(&mut self, capacity: usize) {
        let n = self.selected.len();

        match self.axis {
            SelectionAxis::COLUMNS => {
                let mut buffer = Array2::<A>::zeros((self.x_selected.nrows(), capacity));
                buffer
                    .slice_mut(s![.., 0..n])
                    .assign(&self.x_selected.slice(s![.., 0..n]));
                self.x_selected = buffer;
            }
            SelectionAxis::ROWS => {
                let mut buffer = Array2::<A>::zeros((capacity, self.x_selected.ncols()));
                buffer
                    .slice_mut(s![0..n, ..])
                    .assign(&self.x_selected.slice(s![0..n, ..]));
                self.x_selected = buffer;

                if let Some(targets) = self.y_selected.take() {
                    let mut grown = Array2::<A>::zeros((capacity, targets.ncols()));
                    grown
                        .slice_mut(s![0..n, ..])
                        .assign(&targets.slice(s![0..n, ..]));
                    self.y_selected = Some(grown);
                }
            }
        }
    }

    fn commit(&mut self, x: ArrayView2<A>, y: Option<ArrayView2<A>>, index: usize) {
        debug_assert!(!self.selected.contains(&index));

        let slot = self.selected.len();
        match self.axis {
            SelectionAxis::COLUMNS => {
                self.x_selected.column_mut(slot).assign(&x.column(index));
            }
            SelectionAxis::ROWS => {
                self.x_selected.row_mut(slot).assign(&x.row(index));
                if let (Some(targets), Some(y)) = (self.y_selected.as_mut(), y) {
                    targets.row_mut(slot).assign(&y.row(index));
                }
            }
        }
        self.selected.push(index);
    }

    /// Shrink the preallocated buffers to the number of items actually
    /// committed, after an early stop.
    fn truncate(&mut self) {
        let n = self.selected.len();
        self.x_selected = match self.axis {
            SelectionAxis::COLUMNS => self.x_selected.slice(s![.., 0..n]).to_owned(),
            SelectionAxis::ROWS => self.x_selected.slice(s![0..n, ..]).to_owned(),
        };
        if let Some(targets) = self.y_selected.take() {
            self.y_selected = Some(targets.slice_move(s![0..n, ..]));
        }
    }

    /// The number of committed selections.
    pub fn n_selected(&self) -> usize {
        self.selected.len()
    }

    /// The committed indices in selection order.
    pub fn selected_indices(&self) -> &[usize] {
        &self.selected
    }

    /// The selected columns or rows in selection order.
    pub fn selected_data(&self) -> ArrayView2<A> {
        let n = self.selected.len();
        match self.axis {
            SelectionAxis::COLUMNS => self.x_selected.slice(s![.., 0..n]),
            SelectionAxis::ROWS => self.x_selected.slice(s![0..n, ..]),
        }
    }

    /// The target rows of the selected samples, if targets were supplied.
    pub fn selected_targets(&self) -> Option<ArrayView2<A>> {
        let n = self.selected.len();
        self.y_selected
            .as_ref()
            .map(|targets| targets.slice(s![0..n, ..]))
    }

    fn support_mask(&self, n_candidates: usize) -> Array1<bool> {
        let mut mask = Array1::from_elem(n_candidates, false);
        for &index in &self.selected {
            mask[index] = true;
        }
        mask
    }
}

/// The public lifecycle of a selector.
pub trait SelectorTraits {
    type A: Scalar;

    /// Run a greedy search over `x`, or continue an earlier one.
    ///
    /// With `warm_start` the previous selections are kept and the search is
    /// extended towards the (larger) configured target, reproducing the
    /// trajectory of an uninterrupted run. The caller must pass the same
    /// `x` and `y` as before.
    fn fit(
        &mut self,
        x: ArrayView2<Self::A>,
        y: Option<ArrayView2<Self::A>>,
        warm_start: bool,
    ) -> Result<()>;

    /// Whether a search has completed on this selector.
    fn is_fitted(&self) -> bool;

    /// The boolean support mask over all candidates.
    fn support(&self) -> Result<ArrayView1<bool>>;

    /// The committed indices in selection order.
    fn selected_indices(&self) -> Result<&[usize]>;

    /// The selected columns or rows in selection order.
    fn selected_data(&self) -> Result<ArrayView2<Self::A>>;

    /// The number of committed selections.
    fn n_selected(&self) -> usize;
}

/// Drives the iterate, score, pick, commit loop of a greedy search.
pub struct GreedySelector<S: GreedyScorer> {
    scorer: S,
    target: TargetSize,
    score_threshold: Option<f64>,
    progress: Box<dyn ReportProgress>,
    state: Option<SelectionState<S::A>>,
    support: Option<Array1<bool>>,
}

impl<S: GreedyScorer> GreedySelector<S> {
    /// Create a selector around a scoring strategy.
    ///
    /// The stopping threshold defaults to whatever the scorer asks for.
    pub fn new(scorer: S, target: TargetSize) -> Self {
        let score_threshold = scorer.default_threshold();
        GreedySelector {
            scorer,
            target,
            score_threshold,
            progress: Box::new(NoProgress),
            state: None,
            support: None,
        }
    }

    /// Override the stopping threshold.
    pub fn with_threshold(mut self, threshold: Option<f64>) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// Install a progress reporting hook.
    pub fn with_progress(mut self, progress: Box<dyn ReportProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// Change the target size, typically before a warm start continuation.
    pub fn set_target(&mut self, target: TargetSize) {
        self.target = target;
    }

    /// Immutable access to the scoring strategy.
    pub fn scorer(&self) -> &S {
        &self.scorer
    }
}

impl<S: GreedyScorer> SelectorTraits for GreedySelector<S> {
    type A = S::A;

    fn fit(
        &mut self,
        x: ArrayView2<S::A>,
        y: Option<ArrayView2<S::A>>,
        warm_start: bool,
    ) -> Result<()> {
        let axis = self.scorer.axis();
        let n_candidates = x.len_of(axis.candidate_axis());
        let n_iterations = self.target.resolve(n_candidates)?;

        self.support = None;

        if warm_start {
            let state = match self.state.as_mut() {
                Some(state) if state.n_selected() > 0 => state,
                _ => return Err(SelectionError::NotInitialized),
            };
            if n_iterations < state.n_selected() {
                return Err(SelectionError::InvalidParameter(format!(
                    "Cannot warm start towards {} items with {} already selected",
                    n_iterations,
                    state.n_selected()
                )));
            }
            state.grow(n_iterations);
            self.scorer.reinitialize(x, y, state)?;
        } else {
            let mut state = SelectionState::new(axis, x, y, n_iterations);
            if let Some(start) = self.scorer.initialize(x, y)? {
                if n_iterations > 0 {
                    state.commit(x, y, start);
                    self.scorer.update(x, y, &state, start)?;
                }
            }
            self.state = Some(state);
        }

        let state = match self.state.as_mut() {
            Some(state) => state,
            None => return Err(SelectionError::NotInitialized),
        };

        while state.n_selected() < n_iterations {
            match best_candidate(self.scorer.scores(), self.score_threshold) {
                Some(index) => {
                    state.commit(x, y, index);
                    self.scorer.update(x, y, &*state, index)?;
                    self.progress.report(state.n_selected(), n_iterations);
                }
                None => {
                    log::warn!(
                        "Score threshold reached, terminating search at {} / {} selections",
                        state.n_selected(),
                        n_iterations
                    );
                    state.truncate();
                    break;
                }
            }
        }

        self.support = Some(state.support_mask(n_candidates));
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.support.is_some()
    }

    fn support(&self) -> Result<ArrayView1<bool>> {
        self.support
            .as_ref()
            .map(|mask| mask.view())
            .ok_or(SelectionError::NotFitted)
    }

    fn selected_indices(&self) -> Result<&[usize]> {
        match (&self.support, &self.state) {
            (Some(_), Some(state)) => Ok(state.selected_indices()),
            _ => Err(SelectionError::NotFitted),
        }
    }

    fn selected_data(&self) -> Result<ArrayView2<S::A>> {
        match (&self.support, &self.state) {
            (Some(_), Some(state)) => Ok(state.selected_data()),
            _ => Err(SelectionError::NotFitted),
        }
    }

    fn n_selected(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.n_selected())
    }
}

/// Arg-max over the score vector, ties broken by the lowest index.
///
/// Returns `None` when a threshold is configured and no candidate reaches
/// it, which signals the early stop.
fn best_candidate<R: Float>(scores: ArrayView1<R>, threshold: Option<f64>) -> Option<usize> {
    let mut best = 0;
    let mut best_score = R::neg_infinity();

    for (index, &score) in scores.iter().enumerate() {
        if score > best_score {
            best_score = score;
            best = index;
        }
    }

    if let Some(threshold) = threshold {
        if let Some(threshold) = cast::<f64, R>(threshold) {
            if best_score < threshold {
                return None;
            }
        }
    }

    Some(best)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::prelude::*;
    use std::collections::HashSet;

    fn assert_valid_selection(indices: &[usize], expected: usize, n_candidates: usize) {
        assert_eq!(indices.len(), expected);
        let unique: HashSet<usize> = indices.iter().cloned().collect();
        assert_eq!(unique.len(), expected);
        for &index in indices {
            assert!(index < n_candidates);
        }
    }

    #[test]
    fn target_size_resolution() {
        assert_eq!(TargetSize::COUNT(3).resolve(10).unwrap(), 3);
        assert_eq!(TargetSize::FRACTION(0.5).resolve(10).unwrap(), 5);
        assert_eq!(TargetSize::FRACTION(1.0).resolve(10).unwrap(), 10);
        assert_eq!(TargetSize::HALF.resolve(11).unwrap(), 5);

        assert!(matches!(
            TargetSize::COUNT(0).resolve(10),
            Err(SelectionError::InvalidParameter(_))
        ));
        assert!(matches!(
            TargetSize::COUNT(10).resolve(10),
            Err(SelectionError::InvalidParameter(_))
        ));
        assert!(matches!(
            TargetSize::FRACTION(0.0).resolve(10),
            Err(SelectionError::InvalidParameter(_))
        ));
        assert!(matches!(
            TargetSize::FRACTION(1.5).resolve(10),
            Err(SelectionError::InvalidParameter(_))
        ));
    }

    macro_rules! selection_count_tests {
        ($($name:ident: $scalar:ty, $axis:expr, $dim:expr, $count:expr,)*) => {
            $(
            #[test]
            fn $name() {
                let mut rng = rand::thread_rng();
                let mat = <$scalar>::random_gaussian($dim, &mut rng);
                let n_candidates = mat.len_of($axis.candidate_axis());

                let mut fps = GreedySelector::new(
                    FPS::<$scalar>::new($axis),
                    TargetSize::COUNT($count),
                );
                fps.fit(mat.view(), None, false).unwrap();
                assert_valid_selection(fps.selected_indices().unwrap(), $count, n_candidates);

                let mut cur = GreedySelector::new(
                    CUR::<$scalar>::new($axis),
                    TargetSize::COUNT($count),
                );
                cur.fit(mat.view(), None, false).unwrap();
                assert_valid_selection(cur.selected_indices().unwrap(), $count, n_candidates);

                let n_support = cur.support().unwrap().iter().filter(|&&flag| flag).count();
                assert_eq!(n_support, $count);
            }
            )*
        };
    }

    selection_count_tests! {
        test_selection_count_columns_f32: f32, SelectionAxis::COLUMNS, (20, 12), 5,
        test_selection_count_columns_f64: f64, SelectionAxis::COLUMNS, (20, 12), 5,
        test_selection_count_rows_f64: f64, SelectionAxis::ROWS, (15, 8), 6,
    }

    #[test]
    fn selected_data_matches_indices() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_gaussian((10, 8), &mut rng);

        let mut selector =
            GreedySelector::new(FPS::<f64>::new(SelectionAxis::COLUMNS), TargetSize::COUNT(4));
        selector.fit(mat.view(), None, false).unwrap();

        let data = selector.selected_data().unwrap();
        assert_eq!(data.ncols(), 4);
        for (slot, &index) in selector.selected_indices().unwrap().iter().enumerate() {
            assert_eq!(data.column(slot), mat.column(index));
        }
    }

    macro_rules! warm_start_tests {
        ($($name:ident: $scorer:expr, $dim:expr, $first:expr, $second:expr,)*) => {
            $(
            #[test]
            fn $name() {
                let mut rng = rand::thread_rng();
                let mat = f64::random_gaussian($dim, &mut rng);

                let mut direct = GreedySelector::new($scorer, TargetSize::COUNT($second));
                direct.fit(mat.view(), None, false).unwrap();

                let mut resumed = GreedySelector::new($scorer, TargetSize::COUNT($first));
                resumed.fit(mat.view(), None, false).unwrap();
                resumed.set_target(TargetSize::COUNT($second));
                resumed.fit(mat.view(), None, true).unwrap();

                assert_eq!(
                    direct.selected_indices().unwrap(),
                    resumed.selected_indices().unwrap()
                );
            }
            )*
        };
    }

    warm_start_tests! {
        test_warm_start_matches_direct_fps:
            FPS::<f64>::new(SelectionAxis::COLUMNS), (25, 16), 4, 10,
        test_warm_start_matches_direct_fps_rows:
            FPS::<f64>::new(SelectionAxis::ROWS), (18, 9), 3, 8,
        test_warm_start_matches_direct_cur:
            CUR::<f64>::new(SelectionAxis::COLUMNS), (25, 16), 4, 10,
        test_warm_start_matches_direct_cur_rows:
            CUR::<f64>::new(SelectionAxis::ROWS), (18, 9), 3, 8,
        test_warm_start_matches_direct_cur_static:
            CUR::<f64>::new(SelectionAxis::COLUMNS).with_iterative(false), (25, 16), 4, 10,
    }

    #[test]
    fn warm_start_without_prior_search_fails() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_gaussian((10, 6), &mut rng);

        let mut selector =
            GreedySelector::new(FPS::<f64>::new(SelectionAxis::COLUMNS), TargetSize::COUNT(3));
        assert!(matches!(
            selector.fit(mat.view(), None, true),
            Err(SelectionError::NotInitialized)
        ));
    }

    #[test]
    fn warm_start_towards_smaller_target_fails() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_gaussian((10, 6), &mut rng);

        let mut selector =
            GreedySelector::new(FPS::<f64>::new(SelectionAxis::COLUMNS), TargetSize::COUNT(4));
        selector.fit(mat.view(), None, false).unwrap();

        selector.set_target(TargetSize::COUNT(2));
        assert!(matches!(
            selector.fit(mat.view(), None, true),
            Err(SelectionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn accessors_fail_before_fit() {
        let selector =
            GreedySelector::new(FPS::<f64>::new(SelectionAxis::COLUMNS), TargetSize::COUNT(3));
        assert!(!selector.is_fitted());
        assert!(matches!(selector.support(), Err(SelectionError::NotFitted)));
        assert!(matches!(
            selector.selected_indices(),
            Err(SelectionError::NotFitted)
        ));
        assert!(matches!(
            selector.selected_data(),
            Err(SelectionError::NotFitted)
        ));
        assert_eq!(selector.n_selected(), 0);
    }

    #[test]
    fn unreachable_threshold_commits_nothing() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_gaussian((12, 8), &mut rng);

        let mut selector =
            GreedySelector::new(CUR::<f64>::new(SelectionAxis::COLUMNS), TargetSize::COUNT(5))
                .with_threshold(Some(1E9));
        selector.fit(mat.view(), None, false).unwrap();

        assert!(selector.is_fitted());
        assert_eq!(selector.n_selected(), 0);
        assert_eq!(selector.selected_indices().unwrap().len(), 0);
        assert_eq!(selector.selected_data().unwrap().ncols(), 0);
        assert!(selector.support().unwrap().iter().all(|&flag| !flag));
    }

    #[test]
    fn progress_hook_sees_every_commit() {
        use std::cell::RefCell;
        use std::rc::Rc;

        struct Recorder(Rc<RefCell<Vec<(usize, usize)>>>);

        impl ReportProgress for Recorder {
            fn report(&mut self, n_selected: usize, n_total: usize) {
                self.0.borrow_mut().push((n_selected, n_total));
            }
        }

        let mut rng = rand::thread_rng();
        let mat = f64::random_gaussian((10, 8), &mut rng);
        let record = Rc::new(RefCell::new(Vec::new()));

        let mut selector =
            GreedySelector::new(FPS::<f64>::new(SelectionAxis::COLUMNS), TargetSize::COUNT(4))
                .with_progress(Box::new(Recorder(record.clone())));
        selector.fit(mat.view(), None, false).unwrap();

        // The seeded start item is committed outside of the loop.
        assert_eq!(*record.borrow(), vec![(2, 4), (3, 4), (4, 4)]);
    }
}
