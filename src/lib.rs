//! Isotropic undecimated ("starlet") wavelet transform.
//!
//! Images are decomposed with the à trous algorithm into detail planes
//! plus a coarse residual, reconstructed from such coefficient cubes, and
//! the operator norm of the pair is estimated by power iteration.

pub mod border;
pub mod config;
pub mod convolve;
pub mod error;
pub mod filter;
pub mod float;
pub mod starlet;
pub mod transformations;
pub mod volume;

pub(crate) mod utilities;

pub use config::{Generation, StarletConfig};
pub use error::StarletError;
pub use starlet::{Decomposition, Starlet};
pub use volume::VolumeBlock;
