//! Generation of random test matrices.

use ndarray::{Array, Array2};
use ndarray_linalg::{JobSvd, Lapack, SVDDCInto, Scalar};
use num::traits::cast::cast;
use num::Float;
use rand::Rng;
use rand_distr::{Distribution, Normal};

pub trait RandomMatrix
where
    Self: Scalar + Lapack,
{
    /// Generate a random Gaussian matrix.
    ///
    /// # Arguments
    ///
    /// * `dimension`: Tuple (rows, cols) specifying the number of rows and columns.
    /// * `rng`: The random number generator to use.
    fn random_gaussian<R: Rng>(dimension: (usize, usize), rng: &mut R) -> Array2<Self>;

    /// Generate a random matrix with orthogonal rows or columns.
    ///
    /// A normally distributed (m, n) matrix is drawn and orthogonalized.
    /// If m > n the returned matrix has orthogonal columns, otherwise it
    /// has orthogonal rows.
    ///
    /// # Arguments
    ///
    /// * `dimension`: Tuple (rows, cols) specifying the number of rows and columns.
    /// * `rng`: The random number generator to use.
    fn random_orthogonal_matrix<R: Rng>(dimension: (usize, usize), rng: &mut R) -> Array2<Self> {
        let mut m = dimension.0;
        let mut n = dimension.1;

        // Orthogonalize a long and skinny matrix, transpose afterwards if
        // the caller asked for the wide shape.
        if dimension.1 > dimension.0 {
            std::mem::swap(&mut m, &mut n);
        }

        let mat = Self::random_gaussian((m, n), rng);

        let (u, _, _) = mat
            .svddc_into(JobSvd::Some)
            .expect("`random_orthogonal_matrix`: SVD computation failed.");

        if dimension.1 > dimension.0 {
            u.unwrap().t().map(|item| item.conj())
        } else {
            u.unwrap()
        }
    }

    /// Generate a random approximate low-rank matrix.
    ///
    /// The singular values are logarithmically distributed between
    /// `sigma_max` and `sigma_min`, so the numerical rank is controlled by
    /// the ratio of the two.
    ///
    /// # Arguments
    ///
    /// * `dimension`: Tuple (rows, cols) specifying the number of rows and columns.
    /// * `sigma_max`: Maximum singular value.
    /// * `sigma_min`: Minimum singular value.
    /// * `rng`: The random number generator to use.
    fn random_approximate_low_rank_matrix<R: Rng>(
        dimension: (usize, usize),
        sigma_max: f64,
        sigma_min: f64,
        rng: &mut R,
    ) -> Array2<Self> {
        assert!(
            sigma_min < sigma_max,
            "`sigma_min` must be smaller than `sigma_max`"
        );
        assert!(sigma_min > 0.0, "`sigma_min` must be positive.");

        let min_dim = std::cmp::min(dimension.0, dimension.1);

        let u = Self::random_orthogonal_matrix((dimension.0, min_dim), rng);
        let vt = Self::random_orthogonal_matrix((min_dim, dimension.1), rng);
        let singvals = Array::geomspace(sigma_min, sigma_max, min_dim)
            .unwrap()
            .map(|&item| cast::<f64, Self>(item).unwrap());
        let sigma = Array2::from_diag(&singvals);
        u.dot(&sigma.dot(&vt))
    }

    /// Generate a random matrix of exact rank `rank` as the product of two
    /// Gaussian factors.
    ///
    /// # Arguments
    ///
    /// * `dimension`: Tuple (rows, cols) specifying the number of rows and columns.
    /// * `rank`: The rank of the product. Must not exceed either dimension.
    /// * `rng`: The random number generator to use.
    fn random_low_rank_matrix<R: Rng>(
        dimension: (usize, usize),
        rank: usize,
        rng: &mut R,
    ) -> Array2<Self> {
        assert!(
            rank <= std::cmp::min(dimension.0, dimension.1),
            "`rank` must not exceed either dimension."
        );
        let left = Self::random_gaussian((dimension.0, rank), rng);
        let right = Self::random_gaussian((rank, dimension.1), rng);
        left.dot(&right)
    }
}

impl RandomMatrix for f64 {
    fn random_gaussian<R: Rng>(dimension: (usize, usize), rng: &mut R) -> Array2<f64> {
        random_gaussian_real::<f64, R>(dimension, rng)
    }
}

impl RandomMatrix for f32 {
    fn random_gaussian<R: Rng>(dimension: (usize, usize), rng: &mut R) -> Array2<f32> {
        random_gaussian_real::<f32, R>(dimension, rng)
    }
}

fn random_gaussian_real<T: Float, R: Rng>(dimension: (usize, usize), rng: &mut R) -> Array2<T> {
    let mut mat = Array2::<T>::zeros(dimension);
    let normal = Normal::new(0.0, 1.0).unwrap();
    mat.map_inplace(|item| *item = cast::<f64, T>(normal.sample(rng)).unwrap());
    mat
}

#[cfg(test)]
mod tests {

    use super::*;
    use ndarray_linalg::SVDDC;

    #[test]
    fn low_rank_matrix_has_requested_rank() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_low_rank_matrix((20, 15), 5, &mut rng);

        let (_, s, _) = mat.svddc(JobSvd::None).unwrap();

        // Five nonzero singular values, the rest at noise level.
        assert!(s[4] > 1E-8);
        assert!(s[5] < 1E-10 * s[0]);
    }

    #[test]
    fn orthogonal_matrix_has_orthonormal_columns() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_orthogonal_matrix((20, 5), &mut rng);

        let gram = mat.t().dot(&mat);
        for ((row, col), &item) in gram.indexed_iter() {
            let expected = if row == col { 1.0 } else { 0.0 };
            assert!((item - expected).abs() < 1E-10);
        }
    }
}
