//! Smoothing kernels of the à trous algorithm.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::{error::StarletError, float::StarletFloat};

/// Family of the base smoothing kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FilterFamily {
    /// Cubic B-spline kernel `[1, 4, 6, 4, 1] / 16`.
    #[default]
    BSpline,
    /// Linear kernel `[1, 2, 1] / 4`.
    Linear,
}

impl FilterFamily {
    /// Returns the undilated kernel.
    pub fn base_kernel<T: StarletFloat>(self) -> Vec<T> {
        let taps: &[f64] = match self {
            FilterFamily::BSpline => &[1.0 / 16.0, 1.0 / 4.0, 3.0 / 8.0, 1.0 / 4.0, 1.0 / 16.0],
            FilterFamily::Linear => &[1.0 / 4.0, 1.0 / 2.0, 1.0 / 4.0],
        };

        taps.iter().map(|&t| T::from_f64_c(t)).collect()
    }
}

impl Display for FilterFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterFamily::BSpline => f.write_str("bspline"),
            FilterFamily::Linear => f.write_str("linear"),
        }
    }
}

impl FromStr for FilterFamily {
    type Err = StarletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bspline" | "b3spline" | "b3-spline" => Ok(FilterFamily::BSpline),
            "linear" => Ok(FilterFamily::Linear),
            _ => Err(StarletError::UnsupportedFilter { name: s.into() }),
        }
    }
}

/// Dilated 1D smoothing kernel for one scale.
///
/// At scale `i` the base taps are separated by `2^i - 1` zeros ("holes").
#[derive(Debug, Clone, PartialEq)]
pub struct AtrousFilter<T> {
    taps: Vec<T>,
    scale: usize,
    family: FilterFamily,
}

impl<T: StarletFloat> AtrousFilter<T> {
    /// Builds the kernel of `family` dilated for scale index `scale`.
    ///
    /// # Examples
    ///
    /// ```
    /// use starlet_rs::filter::{AtrousFilter, FilterFamily};
    ///
    /// let filter = AtrousFilter::<f64>::new(FilterFamily::BSpline, 1);
    /// assert_eq!(filter.len(), 9);
    /// assert_eq!(
    ///     filter.taps(),
    ///     [0.0625, 0.0, 0.25, 0.0, 0.375, 0.0, 0.25, 0.0, 0.0625]
    /// );
    /// ```
    pub fn new(family: FilterFamily, scale: usize) -> Self {
        let base = family.base_kernel::<T>();
        let step = 1usize << scale;
        let len = base.len() + (base.len() - 1) * (step - 1);

        let mut taps = vec![T::zero(); len];
        for (k, &tap) in base.iter().enumerate() {
            taps[k * step] = tap;
        }

        Self {
            taps,
            scale,
            family,
        }
    }

    /// Kernel taps, holes included.
    pub fn taps(&self) -> &[T] {
        &self.taps
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn scale(&self) -> usize {
        self.scale
    }

    pub fn family(&self) -> FilterFamily {
        self.family
    }

    /// Index of the centre tap.
    pub fn center(&self) -> usize {
        self.taps.len() / 2
    }

    /// Iterates over the non-zero taps as `(offset from centre, weight)`.
    pub fn nonzero_taps(&self) -> impl Iterator<Item = (isize, T)> + '_ {
        let center = self.center() as isize;
        self.taps
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_zero())
            .map(move |(i, &t)| (i as isize - center, t))
    }

    /// Row-major outer product of the kernel with itself, the equivalent
    /// 2D kernel.
    pub fn outer(&self) -> Vec<T> {
        self.taps
            .iter()
            .flat_map(|&r| self.taps.iter().map(move |&c| r * c))
            .collect()
    }
}

/// Filters for scales `0..levels` of one family.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBank<T> {
    filters: Vec<AtrousFilter<T>>,
}

impl<T: StarletFloat> FilterBank<T> {
    pub fn new(family: FilterFamily, levels: usize) -> Self {
        let filters = (0..levels).map(|i| AtrousFilter::new(family, i)).collect();
        Self { filters }
    }

    /// Number of detail levels covered.
    pub fn levels(&self) -> usize {
        self.filters.len()
    }

    /// Filter of scale `scale`.
    pub fn get(&self, scale: usize) -> &AtrousFilter<T> {
        &self.filters[scale]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dilation_length_and_positions() {
        for (family, n) in [(FilterFamily::BSpline, 5usize), (FilterFamily::Linear, 3)] {
            for scale in 0..6 {
                let filter = AtrousFilter::<f64>::new(family, scale);
                let step = 1 << scale;
                assert_eq!(filter.len(), n + (n - 1) * (step - 1));

                let positions: Vec<_> = filter
                    .taps()
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| **t != 0.0)
                    .map(|(i, _)| i)
                    .collect();
                let expected: Vec<_> = (0..n).map(|k| k * step).collect();
                assert_eq!(positions, expected);
                assert_eq!(*positions.last().unwrap(), filter.len() - 1);
            }
        }
    }

    #[test]
    fn bspline_scale_one() {
        let filter = AtrousFilter::<f32>::new(FilterFamily::BSpline, 1);
        assert_eq!(filter.len(), 9);
        assert_eq!(filter.center(), 4);

        let taps: Vec<_> = filter.nonzero_taps().collect();
        assert_eq!(
            taps,
            [(-4, 0.0625), (-2, 0.25), (0, 0.375), (2, 0.25), (4, 0.0625)]
        );
    }

    #[test]
    fn kernels_are_normalised() {
        for family in [FilterFamily::BSpline, FilterFamily::Linear] {
            let filter = AtrousFilter::<f64>::new(family, 3);
            let sum: f64 = filter.taps().iter().sum();
            assert!((sum - 1.0).abs() < 1e-15);

            let outer_sum: f64 = filter.outer().iter().sum();
            assert!((outer_sum - 1.0).abs() < 1e-14);
        }
    }

    #[test]
    fn outer_product_layout() {
        let filter = AtrousFilter::<f64>::new(FilterFamily::Linear, 0);
        assert_eq!(
            filter.outer(),
            [
                0.0625, 0.125, 0.0625, //
                0.125, 0.25, 0.125, //
                0.0625, 0.125, 0.0625
            ]
        );
    }

    #[test]
    fn family_names() {
        assert_eq!("Bspline".parse::<FilterFamily>().unwrap(), FilterFamily::BSpline);
        assert_eq!("linear".parse::<FilterFamily>().unwrap(), FilterFamily::Linear);
        assert!(matches!(
            "haar".parse::<FilterFamily>(),
            Err(StarletError::UnsupportedFilter { name }) if name == "haar"
        ));
        assert_eq!(FilterFamily::BSpline.to_string(), "bspline");
    }

    #[test]
    fn bank_covers_requested_levels() {
        let bank = FilterBank::<f32>::new(FilterFamily::BSpline, 4);
        assert_eq!(bank.levels(), 4);
        assert_eq!(bank.get(3).len(), 5 + 4 * 7);
        assert_eq!(bank.get(0).scale(), 0);
    }
}
