//! Error and warning types.

use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::volume::VolumeError;

/// Error type for all fallible operations of the crate.
#[derive(Error, Debug)]
pub enum StarletError {
    /// Returned when a filter family name is not recognised.
    #[error("unsupported filter family `{name}`")]
    UnsupportedFilter {
        /// The rejected name.
        name: String,
    },

    /// Returned when a boundary mode name is not recognised.
    #[error("unsupported boundary mode `{name}`")]
    UnsupportedBoundary {
        /// The rejected name.
        name: String,
    },

    /// Returned when fewer than two scales are requested.
    #[error("n_scales must be >= 2, got {got}")]
    TooFewScales {
        /// The requested number of scales.
        got: usize,
    },

    /// Returned when a coefficient cube does not hold the expected number of planes.
    #[error("coefficient cube has {got} planes, expected {expected}")]
    PlaneCountMismatch {
        /// Number of planes in the cube.
        got: usize,
        /// Number of planes implied by n_scales and the plane size.
        expected: usize,
    },

    /// Returned when an input has a rank the transform does not handle.
    #[error("unsupported rank {rank}")]
    UnsupportedRank {
        /// Rank of the input.
        rank: usize,
    },

    /// Returned when the spatial extent cannot hold a single detail level.
    #[error("image of dims {dims:?} is too small, every spatial side must be >= 2")]
    ImageTooSmall {
        /// Dimensions of the rejected input.
        dims: Vec<usize>,
    },

    /// Returned when the parallelism hint is zero.
    #[error("parallelism must be >= 1, got {got}")]
    InvalidParallelism {
        /// The rejected hint.
        got: usize,
    },

    /// Returned when the power iteration is configured with zero iterations.
    #[error("num_iter must be >= 1")]
    InvalidIterationCount,

    /// Returned when the power iteration tolerance is negative or not finite.
    #[error("tolerance must be finite and >= 0, got {tol}")]
    InvalidTolerance {
        /// The rejected tolerance.
        tol: f64,
    },

    /// Returned when the norm estimator is asked for an empty image.
    #[error("num_pix must be >= 1")]
    InvalidNumPix,

    /// Returned when the backend produces a result of the wrong shape.
    #[error("backend `{backend}` returned dims {got:?}, expected {expected:?}")]
    BackendShapeMismatch {
        /// Name of the backend.
        backend: &'static str,
        /// Dimensions returned.
        got: Vec<usize>,
        /// Dimensions expected.
        expected: Vec<usize>,
    },

    #[error(transparent)]
    Volume(#[from] VolumeError),

    #[error("failed to build the worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Signals that the requested number of scales did not fit the image.
///
/// The transform still ran, using `effective` scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaleCap {
    /// Number of scales the caller asked for.
    pub requested: usize,
    /// Number of scales (planes) actually produced.
    pub effective: usize,
    /// Maximum number of detail levels, `floor(log2(min spatial side))`.
    pub max_levels: usize,
}

impl Display for ScaleCap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n_scales {} exceeds the image support, using {} ({} detail levels)",
            self.requested, self.effective, self.max_levels
        )
    }
}

/// Signals that the power iteration hit a zero or non-finite norm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonFiniteWarning {
    /// Iteration (1-based) at which the degenerate value appeared.
    pub iteration: usize,
    /// The offending norm value.
    pub value: f64,
}

impl Display for NonFiniteWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "power iteration produced a degenerate norm ({}) at iteration {}",
            self.value, self.iteration
        )
    }
}
