//! Orthogonalization primitives for greedy selection.
//!
//! These routines remove the linear contribution of already selected
//! columns or rows from the remaining data. `project_out_column` operates
//! on columns; row oriented callers pass a transposed view. The target
//! matrix variants remove the span of the selected items from a target
//! matrix by linear regression.

use crate::types::Result;
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Axis};
use ndarray_linalg::{Lapack, LeastSquaresSvd, Norm, Scalar};

/// Project the normalized column `c` of `x` out of every column of `x`.
///
/// After the call every column of `x` is orthogonal to the original column
/// `c`, and column `c` itself is numerically zero. A column whose norm is
/// below `tol` defines no stable direction and is skipped.
pub fn project_out_column<A: Scalar + Lapack>(mut x: ArrayViewMut2<A>, c: usize, tol: A::Real) {
    let col = x.column(c).to_owned();
    let norm = col.norm_l2();

    if norm < tol {
        log::warn!("Reference column {} is numerically zero and was skipped", c);
        return;
    }

    let dir = col.mapv(|item| item / A::from_real(norm));
    let coeffs = dir.mapv(|item| item.conj()).dot(&x);
    let update = dir.insert_axis(Axis(1)).dot(&coeffs.insert_axis(Axis(0)));

    x -= &update;
}

/// Residual of `y` after least squares regression onto the columns of
/// `x_selected`.
pub fn regress_out_features<A: Scalar + Lapack>(
    y: ArrayView2<A>,
    x_selected: ArrayView2<A>,
) -> Result<Array2<A>> {
    let coeffs = x_selected.least_squares(&y)?.solution;
    Ok(y.to_owned() - x_selected.dot(&coeffs))
}

/// Residual of `y` after subtracting the prediction of a least squares
/// model fitted on the selected rows.
///
/// `x_ref` and `y_ref` hold the data and targets of the selected rows. The
/// system `x_ref w = y_ref` is solved in the least squares sense and the
/// prediction of `w` on `x` is removed from `y`.
pub fn regress_out_samples<A: Scalar + Lapack>(
    y: ArrayView2<A>,
    x: ArrayView2<A>,
    x_ref: ArrayView2<A>,
    y_ref: ArrayView2<A>,
) -> Result<Array2<A>> {
    let coeffs = x_ref.least_squares(&y_ref)?.solution;
    Ok(y.to_owned() - x.dot(&coeffs))
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::random_matrix::RandomMatrix;
    use ndarray::{s, Axis};
    use ndarray_linalg::Norm;

    macro_rules! project_out_column_tests {
        ($($name:ident: $scalar:ty, $dim:expr, $col:expr, $tol:expr,)*) => {
            $(
            #[test]
            fn $name() {
                let mut rng = rand::thread_rng();
                let mat = <$scalar>::random_gaussian($dim, &mut rng);
                let reference = mat.column($col).to_owned();

                let mut projected = mat.clone();
                project_out_column(projected.view_mut(), $col, $tol);

                // The reference column itself vanishes.
                assert!(projected.column($col).norm_l2() < $tol);

                // Every remaining column is orthogonal to the reference.
                for col in projected.axis_iter(Axis(1)) {
                    let overlap = reference.dot(&col);
                    assert!(overlap.abs() < $tol);
                }
            }
            )*
        };
    }

    project_out_column_tests! {
        test_project_out_column_f32: f32, (20, 6), 2, 1E-3,
        test_project_out_column_f64: f64, (20, 6), 2, 1E-10,
        test_project_out_first_column_f64: f64, (50, 10), 0, 1E-10,
    }

    #[test]
    fn zero_column_is_skipped() {
        let mut rng = rand::thread_rng();
        let mut mat = f64::random_gaussian((10, 4), &mut rng);
        mat.column_mut(2).fill(0.0);
        let expected = mat.clone();

        project_out_column(mat.view_mut(), 2, 1E-12);

        // Nothing changed and nothing turned into NaN.
        assert_eq!(mat, expected);
    }

    #[test]
    fn feature_regression_residual_is_orthogonal() {
        let mut rng = rand::thread_rng();
        let x_selected = f64::random_gaussian((30, 4), &mut rng);
        let y = f64::random_gaussian((30, 2), &mut rng);

        let residual = regress_out_features(y.view(), x_selected.view()).unwrap();

        let overlap = x_selected.t().dot(&residual);
        for &item in overlap.iter() {
            assert!(item.abs() < 1E-10);
        }
    }

    #[test]
    fn sample_regression_residual_vanishes_on_reference_rows() {
        let mut rng = rand::thread_rng();
        let x = f64::random_gaussian((12, 6), &mut rng);
        let y = f64::random_gaussian((12, 2), &mut rng);

        // An underdetermined reference system is interpolated exactly, so
        // the residual must vanish on the reference rows themselves.
        let x_ref = x.slice(s![0..3, ..]);
        let y_ref = y.slice(s![0..3, ..]);

        let residual = regress_out_samples(y.view(), x.view(), x_ref, y_ref).unwrap();

        for &item in residual.slice(s![0..3, ..]).iter() {
            assert!(item.abs() < 1E-8);
        }
    }
}
