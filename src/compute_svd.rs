//! A simple wrapper for truncated SVD computation.

use crate::types::Result;
use ndarray::{s, Array1, Array2, ArrayView2};
use ndarray_linalg::{JobSvd, Lapack, SVDDCInto, Scalar};

pub(crate) struct SVDData<A: Scalar> {
    /// The matrix of left singular vectors, one column per triplet
    pub u: Array2<A>,
    /// The singular values in descending order
    pub s: Array1<A::Real>,
    /// The matrix of right singular vectors, one row per triplet
    pub vt: Array2<A>,
}

/// Compute the `k` leading singular triplets of `arr`.
///
/// The decomposition is computed densely through the divide and conquer
/// Lapack routine and truncated afterwards. `k` is clamped to the number
/// of available triplets.
pub(crate) fn truncated_svd<A: Scalar + Lapack>(
    arr: ArrayView2<A>,
    k: usize,
) -> Result<SVDData<A>> {
    let (u, s, vt) = arr.to_owned().svddc_into(JobSvd::Some)?;

    // JobSvd::Some always produces both singular vector matrices.
    let u = u.unwrap();
    let vt = vt.unwrap();

    let k = k.min(s.len());

    Ok(SVDData {
        u: u.slice_move(s![.., 0..k]),
        s: s.slice_move(s![0..k]),
        vt: vt.slice_move(s![0..k, ..]),
    })
}
