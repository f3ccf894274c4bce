//! Starlet transform backends.

use std::{borrow::Cow, collections::HashMap};

use crate::{
    config::{Generation, StarletConfig},
    filter::{FilterBank, FilterFamily},
    float::StarletFloat,
};

use self::atrous::{decompose_plane, reconstruct_fast, reconstruct_recursive, Smoothing};

pub mod atrous;
pub mod norm;

/// Implementation of the forward and inverse transform of single planes.
///
/// Planes are row-major `rows * cols` slices. A cube holds `n_scales`
/// planes back to back: the detail planes from finest to coarsest,
/// followed by the coarse plane. Callers validate shapes and cap
/// `n_scales` to the plane size before calling into a backend.
pub trait StarletBackend<T: StarletFloat>: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Capability probe, checked once when a facade selects the backend.
    fn is_available(&self) -> bool {
        true
    }

    /// Builds any derived state needed for `n_scales` planes.
    fn prepare(&mut self, _n_scales: usize) {}

    /// Drops all derived state.
    fn reset(&mut self) {}

    /// Decomposes one plane into an `n_scales` plane cube.
    fn decompose(&self, plane: &[T], dims: (usize, usize), n_scales: usize) -> Vec<T>;

    /// Reconstructs one plane from an `n_scales` plane cube.
    fn reconstruct(&self, cube: &[T], dims: (usize, usize), n_scales: usize) -> Vec<T>;
}

/// Built-in backend running the à trous algorithm.
///
/// Filter banks are cached per number of detail levels.
#[derive(Debug, Clone)]
pub struct AtrousBackend<T> {
    generation: Generation,
    fast_inverse: bool,
    family: FilterFamily,
    smoothing: Smoothing,
    banks: HashMap<usize, FilterBank<T>>,
}

impl<T: StarletFloat> AtrousBackend<T> {
    /// Constructs a new `AtrousBackend` following the transform settings of `config`.
    pub fn new(config: &StarletConfig) -> Self {
        Self {
            generation: config.generation,
            fast_inverse: config.uses_fast_inverse(),
            family: config.filter,
            smoothing: Smoothing {
                mode: config.boundary,
                path: config.path,
            },
            banks: HashMap::new(),
        }
    }

    /// Number of cached filter banks.
    pub fn cached_banks(&self) -> usize {
        self.banks.len()
    }

    fn bank(&self, levels: usize) -> Cow<'_, FilterBank<T>> {
        match self.banks.get(&levels) {
            Some(bank) => Cow::Borrowed(bank),
            None => Cow::Owned(FilterBank::new(self.family, levels)),
        }
    }
}

impl<T: StarletFloat> StarletBackend<T> for AtrousBackend<T> {
    fn name(&self) -> &'static str {
        "atrous"
    }

    fn prepare(&mut self, n_scales: usize) {
        let levels = n_scales - 1;
        let family = self.family;
        self.banks.entry(levels).or_insert_with(|| {
            log::debug!("building {family} filter bank with {levels} levels");
            FilterBank::new(family, levels)
        });
    }

    fn reset(&mut self) {
        self.banks.clear();
    }

    fn decompose(&self, plane: &[T], dims: (usize, usize), n_scales: usize) -> Vec<T> {
        let bank = self.bank(n_scales - 1);
        decompose_plane(plane, dims, &bank, self.generation, self.smoothing)
    }

    fn reconstruct(&self, cube: &[T], dims: (usize, usize), n_scales: usize) -> Vec<T> {
        if self.fast_inverse {
            return reconstruct_fast(cube, dims.0 * dims.1);
        }

        let bank = self.bank(n_scales - 1);
        reconstruct_recursive(cube, dims, &bank, self.smoothing)
    }
}
