//! Construction-time configuration of a [`Starlet`](crate::starlet::Starlet).

use crate::{
    border::BoundaryMode, convolve::ConvolutionPath, error::StarletError, filter::FilterFamily,
};

/// Convention used to compute the detail planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Generation {
    /// `w_i = c_i - c_{i+1}`.
    #[default]
    First,
    /// `w_i = c_i - h_i * c_{i+1}`, the difference against a twice
    /// smoothed signal.
    Second,
}

/// Position of the slice axis of a rank 3 image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum StackLayout {
    /// Slice axis is the one with the smallest extent, the leading axis on ties.
    #[default]
    Auto,
    /// `(K, H, W)`.
    SlicesFirst,
    /// `(H, W, K)`.
    SlicesLast,
}

impl StackLayout {
    /// Resolves the slice axis for an image of dims `dims`.
    pub fn slice_axis(self, dims: &[usize; 3]) -> usize {
        match self {
            StackLayout::SlicesFirst => 0,
            StackLayout::SlicesLast => 2,
            StackLayout::Auto => {
                if dims[0] <= dims[2] {
                    0
                } else {
                    2
                }
            }
        }
    }
}

/// Settings of the spectral norm power iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerIterationCfg {
    /// Maximum number of operator applications.
    pub num_iter: usize,
    /// Relative change below which the iteration stops.
    pub tol: f64,
    /// Seed of the starting image, drawn from entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for PowerIterationCfg {
    fn default() -> Self {
        Self {
            num_iter: 20,
            tol: 1e-10,
            seed: None,
        }
    }
}

impl PowerIterationCfg {
    pub fn validate(&self) -> Result<(), StarletError> {
        if self.num_iter == 0 {
            return Err(StarletError::InvalidIterationCount);
        }
        if !self.tol.is_finite() || self.tol < 0.0 {
            return Err(StarletError::InvalidTolerance { tol: self.tol });
        }
        Ok(())
    }
}

/// Transform configuration, fixed for the lifetime of a facade.
///
/// # Examples
///
/// ```
/// use starlet_rs::config::{Generation, StarletConfig};
/// use starlet_rs::filter::FilterFamily;
///
/// let cfg = StarletConfig::new()
///     .with_generation(Generation::Second)
///     .with_filter(FilterFamily::Linear)
///     .with_parallelism(2);
/// assert!(cfg.validate().is_ok());
/// assert!(!cfg.uses_fast_inverse());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarletConfig {
    pub generation: Generation,
    /// Reconstruct first generation cubes by summing their planes.
    pub fast_inverse: bool,
    pub boundary: BoundaryMode,
    pub filter: FilterFamily,
    pub path: ConvolutionPath,
    /// Number of worker threads used for convolution and slice fan-out.
    pub parallelism: usize,
    pub stack_layout: StackLayout,
    pub power_iteration: PowerIterationCfg,
}

impl Default for StarletConfig {
    fn default() -> Self {
        Self {
            generation: Generation::First,
            fast_inverse: true,
            boundary: BoundaryMode::Mirror,
            filter: FilterFamily::BSpline,
            path: ConvolutionPath::Separable,
            parallelism: 1,
            stack_layout: StackLayout::Auto,
            power_iteration: PowerIterationCfg::default(),
        }
    }
}

impl StarletConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generation(mut self, generation: Generation) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_fast_inverse(mut self, fast_inverse: bool) -> Self {
        self.fast_inverse = fast_inverse;
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_filter(mut self, filter: FilterFamily) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_path(mut self, path: ConvolutionPath) -> Self {
        self.path = path;
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_stack_layout(mut self, stack_layout: StackLayout) -> Self {
        self.stack_layout = stack_layout;
        self
    }

    pub fn with_power_iteration(mut self, power_iteration: PowerIterationCfg) -> Self {
        self.power_iteration = power_iteration;
        self
    }

    /// Whether reconstruction takes the plane summation shortcut.
    ///
    /// Only first generation cubes telescope back to the image.
    pub fn uses_fast_inverse(&self) -> bool {
        self.fast_inverse && self.generation == Generation::First
    }

    /// Validate the configuration parameters.
    pub fn validate(&self) -> Result<(), StarletError> {
        if self.parallelism == 0 {
            return Err(StarletError::InvalidParallelism { got: 0 });
        }
        self.power_iteration.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = StarletConfig::default();
        assert_eq!(cfg.generation, Generation::First);
        assert!(cfg.uses_fast_inverse());
        assert_eq!(cfg.boundary, BoundaryMode::Mirror);
        assert_eq!(cfg.filter, FilterFamily::BSpline);
        assert_eq!(cfg.power_iteration.num_iter, 20);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn fast_inverse_requires_first_generation() {
        let cfg = StarletConfig::new().with_generation(Generation::Second);
        assert!(cfg.fast_inverse);
        assert!(!cfg.uses_fast_inverse());
        assert!(!StarletConfig::new().with_fast_inverse(false).uses_fast_inverse());
    }

    #[test]
    fn invalid_settings() {
        assert!(matches!(
            StarletConfig::new().with_parallelism(0).validate(),
            Err(StarletError::InvalidParallelism { got: 0 })
        ));

        let pi = PowerIterationCfg {
            num_iter: 0,
            ..Default::default()
        };
        assert!(matches!(
            StarletConfig::new().with_power_iteration(pi).validate(),
            Err(StarletError::InvalidIterationCount)
        ));

        let pi = PowerIterationCfg {
            tol: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(pi.validate(), Err(StarletError::InvalidTolerance { .. })));
    }

    #[test]
    fn stack_axis_resolution() {
        assert_eq!(StackLayout::Auto.slice_axis(&[3, 16, 16]), 0);
        assert_eq!(StackLayout::Auto.slice_axis(&[16, 16, 3]), 2);
        assert_eq!(StackLayout::Auto.slice_axis(&[4, 16, 4]), 0);
        assert_eq!(StackLayout::SlicesLast.slice_axis(&[3, 16, 16]), 2);
        assert_eq!(StackLayout::SlicesFirst.slice_axis(&[16, 16, 3]), 0);
    }
}
