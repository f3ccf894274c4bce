//! Single plane starlet decomposition and synthesis.

use crate::{
    border::BoundaryMode,
    config::Generation,
    convolve::{smooth, ConvolutionPath},
    filter::FilterBank,
    float::StarletFloat,
};

/// Largest number of detail levels a `rows x cols` plane supports,
/// `floor(log2(min(rows, cols)))`.
///
/// # Examples
///
/// ```
/// use starlet_rs::transformations::atrous::max_levels;
///
/// assert_eq!(max_levels(4, 4), 2);
/// assert_eq!(max_levels(64, 100), 6);
/// assert_eq!(max_levels(1, 8), 0);
/// ```
pub fn max_levels(rows: usize, cols: usize) -> usize {
    rows.min(cols).max(1).ilog2() as usize
}

/// Number of planes produced for a request of `n_scales` on a
/// `rows x cols` plane.
pub fn effective_scales(n_scales: usize, rows: usize, cols: usize) -> usize {
    n_scales.saturating_sub(1).min(max_levels(rows, cols)) + 1
}

/// Smoothing settings shared by the forward and inverse passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Smoothing {
    pub mode: BoundaryMode,
    pub path: ConvolutionPath,
}

/// Decomposes `plane` into `bank.levels()` detail planes followed by the
/// coarse plane, returned back to back in one buffer.
///
/// # Examples
///
/// ```
/// use starlet_rs::border::BoundaryMode;
/// use starlet_rs::config::Generation;
/// use starlet_rs::convolve::ConvolutionPath;
/// use starlet_rs::filter::{FilterBank, FilterFamily};
/// use starlet_rs::transformations::atrous::{decompose_plane, Smoothing};
///
/// let bank = FilterBank::<f64>::new(FilterFamily::BSpline, 2);
/// let smoothing = Smoothing { mode: BoundaryMode::Mirror, path: ConvolutionPath::Separable };
/// let plane: Vec<f64> = (0..64).map(|x| x as f64).collect();
///
/// let cube = decompose_plane(&plane, (8, 8), &bank, Generation::First, smoothing);
/// assert_eq!(cube.len(), 3 * 64);
///
/// for i in 0..64 {
///     let sum = cube[i] + cube[64 + i] + cube[128 + i];
///     assert!((sum - plane[i]).abs() < 1e-12);
/// }
/// ```
pub fn decompose_plane<T: StarletFloat>(
    plane: &[T],
    dims: (usize, usize),
    bank: &FilterBank<T>,
    generation: Generation,
    smoothing: Smoothing,
) -> Vec<T> {
    let plane_len = dims.0 * dims.1;
    assert_eq!(plane.len(), plane_len);

    let levels = bank.levels();
    let mut cube = Vec::with_capacity((levels + 1) * plane_len);
    let mut c = plane.to_vec();

    for i in 0..levels {
        let filter = bank.get(i);
        let c_next = smooth(&c, dims, filter, smoothing.mode, smoothing.path);

        match generation {
            Generation::First => {
                cube.extend(c.iter().zip(&c_next).map(|(&a, &b)| a - b));
            }
            Generation::Second => {
                let h = smooth(&c_next, dims, filter, smoothing.mode, smoothing.path);
                cube.extend(c.iter().zip(&h).map(|(&a, &b)| a - b));
            }
        }

        c = c_next;
    }

    cube.extend_from_slice(&c);
    cube
}

/// Sums all planes of a cube.
pub fn reconstruct_fast<T: StarletFloat>(cube: &[T], plane_len: usize) -> Vec<T> {
    assert_eq!(cube.len() % plane_len, 0);

    let mut image = vec![T::zero(); plane_len];
    for plane in cube.chunks_exact(plane_len) {
        for (o, &x) in image.iter_mut().zip(plane) {
            *o += x;
        }
    }

    image
}

/// Recursive synthesis: starting from the coarse plane, each step smooths
/// the running estimate with the filter of the next finer scale and adds
/// that scale's detail plane.
///
/// Exact for second generation cubes.
pub fn reconstruct_recursive<T: StarletFloat>(
    cube: &[T],
    dims: (usize, usize),
    bank: &FilterBank<T>,
    smoothing: Smoothing,
) -> Vec<T> {
    let plane_len = dims.0 * dims.1;
    let levels = bank.levels();
    assert_eq!(cube.len(), (levels + 1) * plane_len);

    let plane = |i: usize| &cube[i * plane_len..(i + 1) * plane_len];
    let mut c_j = plane(levels).to_vec();

    for scale in (0..levels).rev() {
        let c_new = smooth(&c_j, dims, bank.get(scale), smoothing.mode, smoothing.path);
        c_j = c_new
            .iter()
            .zip(plane(scale))
            .map(|(&a, &w)| a + w)
            .collect();
    }

    c_j
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;
    use crate::filter::FilterFamily;

    const SMOOTHING: Smoothing = Smoothing {
        mode: BoundaryMode::Mirror,
        path: ConvolutionPath::Separable,
    };

    fn random_plane<T: StarletFloat>(len: usize, seed: u64) -> Vec<T> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..len)
            .map(|_| T::from_f64_c(rng.gen_range(0.0..10.0)))
            .collect()
    }

    #[test]
    fn level_caps() {
        assert_eq!(effective_scales(20, 4, 4), 3);
        assert_eq!(effective_scales(3, 4, 4), 3);
        assert_eq!(effective_scales(2, 4, 4), 2);
        assert_eq!(effective_scales(6, 32, 16), 5);
        assert_eq!(effective_scales(6, 64, 64), 6);
    }

    #[test]
    fn first_generation_telescopes() {
        let dims = (16, 12);
        let plane = random_plane::<f64>(dims.0 * dims.1, 3);
        let bank = FilterBank::new(FilterFamily::Linear, 3);

        let cube = decompose_plane(&plane, dims, &bank, Generation::First, SMOOTHING);
        let image = reconstruct_fast(&cube, dims.0 * dims.1);
        for (a, b) in image.iter().zip(&plane) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn second_generation_recursive_inverse() {
        let dims = (16, 16);
        let plane = random_plane::<f64>(dims.0 * dims.1, 11);
        let bank = FilterBank::new(FilterFamily::BSpline, 4);

        let cube = decompose_plane(&plane, dims, &bank, Generation::Second, SMOOTHING);
        let image = reconstruct_recursive(&cube, dims, &bank, SMOOTHING);
        for (a, b) in image.iter().zip(&plane) {
            assert!((a - b).abs() < 1e-10);
        }

        // The plain sum is biased for this convention.
        let summed = reconstruct_fast(&cube, dims.0 * dims.1);
        let bias = summed
            .iter()
            .zip(&plane)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        assert!(bias > 1e-6);
    }

    #[test]
    fn coarse_plane_is_last_smoothing() {
        let dims = (8, 8);
        let plane = random_plane::<f64>(64, 5);
        let bank = FilterBank::new(FilterFamily::BSpline, 2);

        let cube = decompose_plane(&plane, dims, &bank, Generation::First, SMOOTHING);
        let c1 = smooth(&plane, dims, bank.get(0), SMOOTHING.mode, SMOOTHING.path);
        let c2 = smooth(&c1, dims, bank.get(1), SMOOTHING.mode, SMOOTHING.path);
        assert_eq!(&cube[128..], &c2[..]);
    }

    #[test]
    fn zero_plane_decomposes_to_zero() {
        let dims = (8, 4);
        let bank = FilterBank::<f32>::new(FilterFamily::BSpline, 2);
        for generation in [Generation::First, Generation::Second] {
            let cube = decompose_plane(&[0.0; 32], dims, &bank, generation, SMOOTHING);
            assert!(cube.iter().all(|&x| x == 0.0));
        }
    }
}
