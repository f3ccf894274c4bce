//! Spectral norm estimation by power iteration.

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{
    config::PowerIterationCfg,
    error::{NonFiniteWarning, StarletError},
    float::StarletFloat,
    volume::VolumeBlock,
};

/// Outcome of a power iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct NormEstimate {
    /// Estimated spectral norm, `0.0` when the iteration degenerated.
    pub norm: f64,
    /// Number of operator applications performed.
    pub iterations: usize,
    /// Relative change of the estimate after each application.
    pub relative_changes: Vec<f64>,
    /// Whether the relative change dropped below the tolerance.
    pub converged: bool,
    /// Set when the operator produced a zero or non-finite image.
    pub degenerate: Option<NonFiniteWarning>,
}

/// Estimates the spectral norm of `operator` on `num_pix x num_pix` images.
///
/// Starts from a pseudo-random unit norm image and repeatedly applies the
/// operator, normalizing in between, until the relative change of the norm
/// drops below `cfg.tol` or `cfg.num_iter` applications were made. For a
/// symmetric positive semi-definite operator the relative changes are
/// non-increasing.
///
/// # Examples
///
/// ```
/// use starlet_rs::config::PowerIterationCfg;
/// use starlet_rs::transformations::norm::power_iteration;
///
/// let cfg = PowerIterationCfg { seed: Some(1), ..Default::default() };
/// let estimate = power_iteration::<f64, _>(8, &cfg, |x| {
///     let mut y = x.clone();
///     y.scale(3.0);
///     Ok(y)
/// })
/// .unwrap();
///
/// assert!((estimate.norm - 3.0).abs() < 1e-12);
/// assert!(estimate.converged);
/// ```
pub fn power_iteration<T, F>(
    num_pix: usize,
    cfg: &PowerIterationCfg,
    mut operator: F,
) -> Result<NormEstimate, StarletError>
where
    T: StarletFloat,
    F: FnMut(&VolumeBlock<T>) -> Result<VolumeBlock<T>, StarletError>,
{
    cfg.validate()?;
    if num_pix == 0 {
        return Err(StarletError::InvalidNumPix);
    }

    let mut rng = match cfg.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let data = (0..num_pix * num_pix)
        .map(|_| T::from_f64_c(rng.gen_range(-1.0..1.0)))
        .collect();
    let mut x = VolumeBlock::new_with_data(&[num_pix, num_pix], data)?;

    let start = x.norm().to_f64_c();
    if start == 0.0 {
        return Ok(degenerate(0, start, Vec::new()));
    }
    x.scale(T::from_f64_c(1.0 / start));

    let mut norm = 1.0;
    let mut relative_changes = Vec::with_capacity(cfg.num_iter);
    let mut converged = false;

    for iteration in 1..=cfg.num_iter {
        let mut y = operator(&x)?;
        let norm_new = y.norm().to_f64_c();
        if norm_new == 0.0 || !norm_new.is_finite() {
            return Ok(degenerate(iteration, norm_new, relative_changes));
        }

        let change = (norm_new - norm).abs() / norm_new;
        relative_changes.push(change);

        y.scale(T::from_f64_c(1.0 / norm_new));
        x = y;
        norm = norm_new;

        if change < cfg.tol {
            converged = true;
            break;
        }
    }

    log::debug!(
        "power iteration finished after {} steps, norm {norm}, converged {converged}",
        relative_changes.len()
    );

    Ok(NormEstimate {
        norm,
        iterations: relative_changes.len(),
        relative_changes,
        converged,
        degenerate: None,
    })
}

fn degenerate(iteration: usize, value: f64, relative_changes: Vec<f64>) -> NormEstimate {
    let warning = NonFiniteWarning { iteration, value };
    log::warn!("{warning}, reporting a zero norm");

    NormEstimate {
        norm: 0.0,
        iterations: iteration,
        relative_changes,
        converged: false,
        degenerate: Some(warning),
    }
}
