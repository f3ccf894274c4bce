//! "Same" sized convolution of 2D planes with à trous kernels.
//!
//! Planes are row-major slices of `rows * cols` samples. Output rows are
//! computed in parallel on the current rayon pool.

use rayon::prelude::*;

use crate::{border::BoundaryMode, filter::AtrousFilter, float::StarletFloat};

/// Selects how a plane is smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ConvolutionPath {
    /// One 1D pass along each axis.
    #[default]
    Separable,
    /// A single pass with the outer-product 2D kernel.
    Direct2d,
}

/// Smooths `plane` with `filter` along the chosen path.
pub fn smooth<T: StarletFloat>(
    plane: &[T],
    dims: (usize, usize),
    filter: &AtrousFilter<T>,
    mode: BoundaryMode,
    path: ConvolutionPath,
) -> Vec<T> {
    match path {
        ConvolutionPath::Separable => convolve_separable(plane, dims, filter, mode),
        ConvolutionPath::Direct2d => convolve_2d(plane, dims, filter, mode),
    }
}

/// Convolves along axis 0, then along axis 1.
///
/// # Examples
///
/// ```
/// use starlet_rs::border::BoundaryMode;
/// use starlet_rs::convolve::convolve_separable;
/// use starlet_rs::filter::{AtrousFilter, FilterFamily};
///
/// let filter = AtrousFilter::<f64>::new(FilterFamily::Linear, 0);
/// let plane = vec![2.0; 12];
/// let smoothed = convolve_separable(&plane, (3, 4), &filter, BoundaryMode::Mirror);
/// assert!(smoothed.iter().all(|&x| (x - 2.0).abs() < 1e-12));
/// ```
pub fn convolve_separable<T: StarletFloat>(
    plane: &[T],
    dims: (usize, usize),
    filter: &AtrousFilter<T>,
    mode: BoundaryMode,
) -> Vec<T> {
    let tmp = convolve_axis0(plane, dims, filter, mode);
    convolve_axis1(&tmp, dims, filter, mode)
}

fn convolve_axis0<T: StarletFloat>(
    plane: &[T],
    (rows, cols): (usize, usize),
    filter: &AtrousFilter<T>,
    mode: BoundaryMode,
) -> Vec<T> {
    assert_eq!(plane.len(), rows * cols);
    let taps: Vec<_> = filter.nonzero_taps().collect();

    let mut output = vec![T::zero(); rows * cols];
    output
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(r, out_row)| {
            for &(offset, weight) in &taps {
                let src = mode.index(r as isize - offset, rows);
                let src_row = &plane[src * cols..(src + 1) * cols];
                for (o, &x) in out_row.iter_mut().zip(src_row) {
                    *o += weight * x;
                }
            }
        });

    output
}

fn convolve_axis1<T: StarletFloat>(
    plane: &[T],
    (rows, cols): (usize, usize),
    filter: &AtrousFilter<T>,
    mode: BoundaryMode,
) -> Vec<T> {
    assert_eq!(plane.len(), rows * cols);
    let taps: Vec<_> = filter.nonzero_taps().collect();

    let mut output = vec![T::zero(); rows * cols];
    output
        .par_chunks_mut(cols)
        .zip(plane.par_chunks(cols))
        .for_each(|(out_row, in_row)| {
            for (c, o) in out_row.iter_mut().enumerate() {
                let mut acc = T::zero();
                for &(offset, weight) in &taps {
                    acc += weight * in_row[mode.index(c as isize - offset, cols)];
                }
                *o = acc;
            }
        });

    output
}

/// Convolves with the outer-product 2D kernel in a single pass.
///
/// Matches [`convolve_separable`] up to floating point rounding.
pub fn convolve_2d<T: StarletFloat>(
    plane: &[T],
    (rows, cols): (usize, usize),
    filter: &AtrousFilter<T>,
    mode: BoundaryMode,
) -> Vec<T> {
    assert_eq!(plane.len(), rows * cols);

    let len = filter.len();
    let center = filter.center() as isize;
    let kernel: Vec<_> = filter
        .outer()
        .into_iter()
        .enumerate()
        .filter(|(_, w)| !w.is_zero())
        .map(|(i, w)| ((i / len) as isize - center, (i % len) as isize - center, w))
        .collect();

    let mut output = vec![T::zero(); rows * cols];
    output
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(r, out_row)| {
            for (c, o) in out_row.iter_mut().enumerate() {
                let mut acc = T::zero();
                for &(dr, dc, weight) in &kernel {
                    let src_r = mode.index(r as isize - dr, rows);
                    let src_c = mode.index(c as isize - dc, cols);
                    acc += weight * plane[src_r * cols + src_c];
                }
                *o = acc;
            }
        });

    output
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;
    use crate::filter::FilterFamily;

    fn random_plane(rows: usize, cols: usize, seed: u64) -> Vec<f64> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..rows * cols).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    #[test]
    fn impulse_response_is_outer_kernel() {
        let filter = AtrousFilter::<f64>::new(FilterFamily::BSpline, 1);
        let (rows, cols) = (11, 11);
        let mut plane = vec![0.0; rows * cols];
        plane[5 * cols + 5] = 1.0;

        let out = convolve_separable(&plane, (rows, cols), &filter, BoundaryMode::Mirror);
        let kernel = filter.outer();
        for r in 1..10 {
            for c in 1..10 {
                let expected = kernel[(r - 1) * 9 + (c - 1)];
                assert!((out[r * cols + c] - expected).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn mirror_boundary_at_edge() {
        let filter = AtrousFilter::<f64>::new(FilterFamily::Linear, 0);
        let plane = [1.0, 2.0, 3.0, 4.0];
        let out = convolve_axis1(&plane, (1, 4), &filter, BoundaryMode::Mirror);
        // (x[1] + 2 x[0] + x[1]) / 4
        assert!((out[0] - 1.5).abs() < 1e-15);
        assert!((out[1] - 2.0).abs() < 1e-15);
        assert!((out[3] - 3.5).abs() < 1e-15);

        let out = convolve_axis1(&plane, (1, 4), &filter, BoundaryMode::Nearest);
        assert!((out[0] - 1.25).abs() < 1e-15);
        assert!((out[3] - 3.75).abs() < 1e-15);
    }

    #[test]
    fn separable_matches_direct_2d() {
        let (rows, cols) = (13, 9);
        let plane = random_plane(rows, cols, 7);

        for mode in [BoundaryMode::Mirror, BoundaryMode::Nearest, BoundaryMode::Reflect] {
            for scale in 0..4 {
                let filter = AtrousFilter::new(FilterFamily::BSpline, scale);
                let a = smooth(&plane, (rows, cols), &filter, mode, ConvolutionPath::Separable);
                let b = smooth(&plane, (rows, cols), &filter, mode, ConvolutionPath::Direct2d);
                for (x, y) in a.iter().zip(&b) {
                    assert!((x - y).abs() < 1e-12, "{mode} scale {scale}: {x} vs {y}");
                }
            }
        }
    }

    #[test]
    fn constant_plane_is_fixed_point() {
        let filter = AtrousFilter::<f32>::new(FilterFamily::BSpline, 2);
        let plane = vec![0.5f32; 6 * 5];
        let out = convolve_2d(&plane, (6, 5), &filter, BoundaryMode::Mirror);
        assert!(out.iter().all(|&x| (x - 0.5).abs() < 1e-6));
    }
}
