//! The starlet transform facade.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::{
    config::StarletConfig,
    error::{ScaleCap, StarletError},
    float::StarletFloat,
    transformations::{
        atrous::{effective_scales, max_levels},
        norm::{power_iteration, NormEstimate},
        AtrousBackend, StarletBackend,
    },
    volume::VolumeBlock,
};

/// Result of a forward transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition<T> {
    coefficients: VolumeBlock<T>,
    n_scales: usize,
    scale_cap: Option<ScaleCap>,
}

impl<T> Decomposition<T> {
    /// Coefficient cube, `(n_scales, H, W)` for an image and
    /// `(n_scales, H, W, K)` for a stack of `K` slices.
    pub fn coefficients(&self) -> &VolumeBlock<T> {
        &self.coefficients
    }

    pub fn into_coefficients(self) -> VolumeBlock<T> {
        self.coefficients
    }

    /// Number of planes actually produced.
    pub fn n_scales(&self) -> usize {
        self.n_scales
    }

    /// Set when the requested number of scales was reduced to fit the image.
    pub fn scale_cap(&self) -> Option<ScaleCap> {
        self.scale_cap
    }
}

/// Spatial layout of a validated input.
#[derive(Debug, Clone, Copy)]
struct Layout {
    rows: usize,
    cols: usize,
    /// Slice axis and slice count of a stack.
    stack: Option<(usize, usize)>,
}

/// Starlet transform with cached derived state.
///
/// The facade owns its configuration, the selected backend and a cache of
/// spectral norms keyed by `n_scales`. Caches are only invalidated by
/// [`Starlet::reset_cache`]. All operations take `&mut self`; share one
/// instance per worker.
///
/// # Examples
///
/// ```
/// use starlet_rs::config::StarletConfig;
/// use starlet_rs::starlet::Starlet;
/// use starlet_rs::volume::VolumeBlock;
///
/// let mut starlet = Starlet::<f64>::new(StarletConfig::default()).unwrap();
///
/// let data = (0..256).map(|x| (x % 17) as f64).collect();
/// let image = VolumeBlock::new_with_data(&[16, 16], data).unwrap();
///
/// let decomposition = starlet.decompose(&image, 4).unwrap();
/// assert_eq!(decomposition.coefficients().dims(), [4, 16, 16]);
///
/// let reconstructed = starlet.reconstruct(decomposition.coefficients(), 4).unwrap();
/// assert!(reconstructed.is_equal(&image, 1e-10));
/// ```
pub struct Starlet<T: StarletFloat> {
    config: StarletConfig,
    backend: Box<dyn StarletBackend<T>>,
    pool: rayon::ThreadPool,
    norms: HashMap<usize, NormEstimate>,
}

impl<T: StarletFloat> Starlet<T> {
    /// Constructs a new facade running the built-in à trous backend.
    pub fn new(config: StarletConfig) -> Result<Self, StarletError> {
        let backend = Box::new(AtrousBackend::new(&config));
        Self::build(config, backend)
    }

    /// Constructs a new facade running `backend`.
    ///
    /// The backend is probed once; when it reports itself unavailable the
    /// built-in à trous backend is used instead.
    pub fn with_backend(
        config: StarletConfig,
        backend: Box<dyn StarletBackend<T>>,
    ) -> Result<Self, StarletError> {
        if backend.is_available() {
            Self::build(config, backend)
        } else {
            log::warn!(
                "starlet backend `{}` is unavailable, falling back to the built-in one",
                backend.name()
            );
            Self::new(config)
        }
    }

    fn build(
        config: StarletConfig,
        backend: Box<dyn StarletBackend<T>>,
    ) -> Result<Self, StarletError> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallelism)
            .build()?;

        Ok(Self {
            config,
            backend,
            pool,
            norms: HashMap::new(),
        })
    }

    pub fn config(&self) -> &StarletConfig {
        &self.config
    }

    /// Name of the backend in use.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Drops every cached filter bank and spectral norm.
    pub fn reset_cache(&mut self) {
        self.norms.clear();
        self.backend.reset();
    }

    /// Decomposes an image, or a stack of slices, into `n_scales` planes.
    ///
    /// When `n_scales` exceeds what the image supports the transform runs
    /// with the largest supported value; see [`Decomposition::scale_cap`].
    pub fn decompose(
        &mut self,
        image: &VolumeBlock<T>,
        n_scales: usize,
    ) -> Result<Decomposition<T>, StarletError> {
        let decomposition = self.forward(image, n_scales)?;
        if let Some(cap) = decomposition.scale_cap {
            log::warn!("{cap}");
        }

        Ok(decomposition)
    }

    fn forward(
        &mut self,
        image: &VolumeBlock<T>,
        n_scales: usize,
    ) -> Result<Decomposition<T>, StarletError> {
        check_scales(n_scales)?;
        let layout = self.image_layout(image)?;
        let (rows, cols) = (layout.rows, layout.cols);

        let effective = effective_scales(n_scales, rows, cols);
        let scale_cap = (effective < n_scales).then(|| ScaleCap {
            requested: n_scales,
            effective,
            max_levels: max_levels(rows, cols),
        });

        self.backend.prepare(effective);
        let backend = &*self.backend;
        let expected = effective * rows * cols;

        let coefficients = match layout.stack {
            None => {
                let cube = self
                    .pool
                    .install(|| backend.decompose(image.flatten(), (rows, cols), effective));
                check_len(backend, cube.len(), expected, &[effective, rows, cols])?;
                VolumeBlock::new_with_data(&[effective, rows, cols], cube)?
            }
            Some((axis, slices)) => {
                let inputs = (0..slices)
                    .map(|s| image.slice_axis(axis, s))
                    .collect::<Result<Vec<_>, _>>()?;
                let cubes: Vec<Vec<T>> = self.pool.install(|| {
                    inputs
                        .par_iter()
                        .map(|slice| backend.decompose(slice.flatten(), (rows, cols), effective))
                        .collect()
                });

                let dims = [effective, rows, cols, slices];
                let mut stacked = VolumeBlock::new_zero(&dims)?;
                for (s, cube) in cubes.iter().enumerate() {
                    check_len(backend, cube.len(), expected, &dims[..3])?;
                    stacked.assign_axis(3, s, cube)?;
                }
                stacked
            }
        };

        Ok(Decomposition {
            coefficients,
            n_scales: effective,
            scale_cap,
        })
    }

    /// Reconstructs an image from a coefficient cube.
    ///
    /// `(P, H, W)` cubes give an `(H, W)` image, `(P, H, W, K)` cubes an
    /// `(H, W, K)` stack. `P` must equal the number of planes a
    /// decomposition with `n_scales` produces for an `H x W` image.
    pub fn reconstruct(
        &mut self,
        coefficients: &VolumeBlock<T>,
        n_scales: usize,
    ) -> Result<VolumeBlock<T>, StarletError> {
        check_scales(n_scales)?;

        let dims = coefficients.dims();
        let (planes, rows, cols, slices) = match *dims {
            [p, h, w] => (p, h, w, None),
            [p, h, w, k] => (p, h, w, Some(k)),
            _ => return Err(StarletError::UnsupportedRank { rank: dims.len() }),
        };
        if rows.min(cols) < 2 {
            return Err(StarletError::ImageTooSmall { dims: dims.into() });
        }

        let expected = effective_scales(n_scales, rows, cols);
        if planes != expected {
            return Err(StarletError::PlaneCountMismatch {
                got: planes,
                expected,
            });
        }

        self.backend.prepare(planes);
        let backend = &*self.backend;
        let plane_len = rows * cols;

        match slices {
            None => {
                let image = self
                    .pool
                    .install(|| backend.reconstruct(coefficients.flatten(), (rows, cols), planes));
                check_len(backend, image.len(), plane_len, &[rows, cols])?;
                Ok(VolumeBlock::new_with_data(&[rows, cols], image)?)
            }
            Some(slices) => {
                let inputs = (0..slices)
                    .map(|s| coefficients.slice_axis(3, s))
                    .collect::<Result<Vec<_>, _>>()?;
                let images: Vec<Vec<T>> = self.pool.install(|| {
                    inputs
                        .par_iter()
                        .map(|cube| backend.reconstruct(cube.flatten(), (rows, cols), planes))
                        .collect()
                });

                let mut stacked = VolumeBlock::new_zero(&[rows, cols, slices])?;
                for (s, image) in images.iter().enumerate() {
                    check_len(backend, image.len(), plane_len, &[rows, cols])?;
                    stacked.assign_axis(2, s, image)?;
                }
                Ok(stacked)
            }
        }
    }

    /// Spectral norm of `reconstruct ∘ decompose` on `num_pix x num_pix`
    /// images, cached per `n_scales`.
    pub fn spectral_norm(&mut self, num_pix: usize, n_scales: usize) -> Result<f64, StarletError> {
        self.spectral_norm_estimate(num_pix, n_scales)
            .map(|estimate| estimate.norm)
    }

    /// Like [`Starlet::spectral_norm`], returning the full power iteration outcome.
    pub fn spectral_norm_estimate(
        &mut self,
        num_pix: usize,
        n_scales: usize,
    ) -> Result<NormEstimate, StarletError> {
        if let Some(estimate) = self.norms.get(&n_scales) {
            return Ok(estimate.clone());
        }
        check_scales(n_scales)?;

        log::debug!("estimating spectral norm for n_scales {n_scales} on {num_pix}x{num_pix}");
        let cfg = self.config.power_iteration;
        let estimate = power_iteration(num_pix, &cfg, |x| {
            let decomposition = self.forward(x, n_scales)?;
            self.reconstruct(decomposition.coefficients(), n_scales)
        })?;

        self.norms.insert(n_scales, estimate.clone());
        Ok(estimate)
    }

    fn image_layout(&self, image: &VolumeBlock<T>) -> Result<Layout, StarletError> {
        let dims = image.dims();
        let layout = match *dims {
            [rows, cols] => Layout {
                rows,
                cols,
                stack: None,
            },
            [a, b, c] => match self.config.stack_layout.slice_axis(&[a, b, c]) {
                0 => Layout {
                    rows: b,
                    cols: c,
                    stack: Some((0, a)),
                },
                _ => Layout {
                    rows: a,
                    cols: b,
                    stack: Some((2, c)),
                },
            },
            _ => return Err(StarletError::UnsupportedRank { rank: dims.len() }),
        };

        if layout.rows.min(layout.cols) < 2 {
            return Err(StarletError::ImageTooSmall { dims: dims.into() });
        }

        Ok(layout)
    }
}

fn check_scales(n_scales: usize) -> Result<(), StarletError> {
    if n_scales < 2 {
        return Err(StarletError::TooFewScales { got: n_scales });
    }
    Ok(())
}

fn check_len<T: StarletFloat>(
    backend: &dyn StarletBackend<T>,
    got: usize,
    expected: usize,
    dims: &[usize],
) -> Result<(), StarletError> {
    if got != expected {
        return Err(StarletError::BackendShapeMismatch {
            backend: backend.name(),
            got: vec![got],
            expected: dims.into(),
        });
    }
    Ok(())
}
