//! Boundary extension rules.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::StarletError;

/// Declares how samples outside of an axis are synthesized.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default)]
pub enum BoundaryMode {
    /// Reflection about the edge sample, which is not repeated:
    /// `gfedcb|abcdefgh|gfedcba`.
    #[default]
    Mirror,
    /// The edge sample is replicated: `aaaaaa|abcdefgh|hhhhhhh`.
    Nearest,
    /// Reflection about the edge, repeating the edge sample:
    /// `fedcba|abcdefgh|hgfedcb`.
    Reflect,
}

impl BoundaryMode {
    /// Maps a possibly out of range `position` onto `0..len`.
    ///
    /// The extension is periodic, so positions more than one axis length
    /// away from the data are still valid.
    ///
    /// # Examples
    ///
    /// ```
    /// use starlet_rs::border::BoundaryMode;
    ///
    /// assert_eq!(BoundaryMode::Mirror.index(-2, 8), 2);
    /// assert_eq!(BoundaryMode::Mirror.index(9, 8), 5);
    /// assert_eq!(BoundaryMode::Nearest.index(-2, 8), 0);
    /// assert_eq!(BoundaryMode::Reflect.index(-2, 8), 1);
    /// ```
    #[inline]
    pub fn index(self, position: isize, len: usize) -> usize {
        let n = len as isize;
        if (0..n).contains(&position) {
            return position as usize;
        }

        match self {
            BoundaryMode::Nearest => position.clamp(0, n - 1) as usize,
            BoundaryMode::Mirror => {
                if n == 1 {
                    return 0;
                }
                let period = 2 * (n - 1);
                let p = position.rem_euclid(period);
                (if p >= n { period - p } else { p }) as usize
            }
            BoundaryMode::Reflect => {
                let period = 2 * n;
                let p = position.rem_euclid(period);
                (if p >= n { period - 1 - p } else { p }) as usize
            }
        }
    }
}

impl Display for BoundaryMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryMode::Mirror => f.write_str("mirror"),
            BoundaryMode::Nearest => f.write_str("nearest"),
            BoundaryMode::Reflect => f.write_str("reflect"),
        }
    }
}

impl FromStr for BoundaryMode {
    type Err = StarletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mirror" => Ok(BoundaryMode::Mirror),
            "nearest" => Ok(BoundaryMode::Nearest),
            "reflect" | "symm" | "symmetric" => Ok(BoundaryMode::Reflect),
            _ => Err(StarletError::UnsupportedBoundary { name: s.into() }),
        }
    }
}
