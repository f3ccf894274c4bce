//! Volume utilities.

use std::ops::{Index, IndexMut};

use num_traits::{Float, Zero};
use thiserror::Error;

use crate::utilities::{flatten_idx, strides_for_dims};

/// Dense multi-dimensional array stored in row-major order.
///
/// Images are rank 2 `(H, W)` blocks, image stacks rank 3 and coefficient
/// cubes carry an additional leading plane axis.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VolumeBlock<T> {
    data: Vec<T>,
    dims: Vec<usize>,
    strides: Vec<usize>,
}

impl<T: Clone> VolumeBlock<T> {
    /// Constructs a new block filled with the provided value.
    ///
    /// # Examples
    ///
    /// ```
    /// use starlet_rs::volume::VolumeBlock;
    ///
    /// let dims = [2, 2];
    /// let block = VolumeBlock::<f32>::new_fill(&dims, 1.0).unwrap();
    ///
    /// assert_eq!(block[[0usize, 0usize].as_ref()], 1.0);
    /// assert_eq!(block[[1usize, 1usize].as_ref()], 1.0);
    /// ```
    pub fn new_fill(dims: &[usize], fill: T) -> Result<Self, VolumeError> {
        let num_elements = dims.iter().product();
        let data = vec![fill; num_elements];
        Self::new_with_data(dims, data)
    }

    /// Copies the hyperplane at `index` along `axis` into a new block of
    /// rank one lower.
    ///
    /// # Examples
    ///
    /// ```
    /// use starlet_rs::volume::VolumeBlock;
    ///
    /// let dims = [2, 2, 2];
    /// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
    /// let block = VolumeBlock::new_with_data(&dims, data).unwrap();
    ///
    /// assert_eq!(block.slice_axis(0, 1).unwrap().flatten(), [5.0, 6.0, 7.0, 8.0]);
    /// assert_eq!(block.slice_axis(2, 0).unwrap().flatten(), [1.0, 3.0, 5.0, 7.0]);
    /// ```
    pub fn slice_axis(&self, axis: usize, index: usize) -> Result<Self, VolumeError> {
        assert!(axis < self.dims.len());
        assert!(index < self.dims[axis]);

        let stride = self.strides[axis];
        let span = self.dims[axis] * stride;
        let outer = self.data.len() / span;

        let mut data = Vec::with_capacity(outer * stride);
        for o in 0..outer {
            let start = o * span + index * stride;
            data.extend_from_slice(&self.data[start..start + stride]);
        }

        let dims: Vec<_> = self
            .dims
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != axis)
            .map(|(_, &d)| d)
            .collect();
        Self::new_with_data(&dims, data)
    }

    /// Overwrites the hyperplane at `index` along `axis` with `src`, which
    /// must hold the hyperplane in row-major order.
    pub fn assign_axis(&mut self, axis: usize, index: usize, src: &[T]) -> Result<(), VolumeError> {
        assert!(axis < self.dims.len());
        assert!(index < self.dims[axis]);

        let stride = self.strides[axis];
        let span = self.dims[axis] * stride;
        let outer = self.data.len() / span;
        if src.len() != outer * stride {
            return Err(VolumeError::InvalidNumberOfElements {
                got: src.len(),
                required: outer * stride,
            });
        }

        for (o, chunk) in src.chunks_exact(stride).enumerate() {
            let start = o * span + index * stride;
            self.data[start..start + stride].clone_from_slice(chunk);
        }

        Ok(())
    }
}

impl<T: Zero + Clone> VolumeBlock<T> {
    /// Constructs a new zeroed block.
    ///
    /// # Examples
    ///
    /// ```
    /// use starlet_rs::volume::VolumeBlock;
    ///
    /// let dims = [2, 2];
    /// let block = VolumeBlock::<f32>::new_zero(&dims).unwrap();
    ///
    /// assert_eq!(block[[0usize, 0usize].as_ref()], 0.0);
    /// assert_eq!(block[[1usize, 0usize].as_ref()], 0.0);
    /// ```
    pub fn new_zero(dims: &[usize]) -> Result<Self, VolumeError> {
        Self::new_fill(dims, T::zero())
    }
}

impl<T> VolumeBlock<T> {
    /// Constructs a new block.
    ///
    /// # Examples
    ///
    /// ```
    /// use starlet_rs::volume::VolumeBlock;
    ///
    /// let dims = [2, 2];
    /// let data = vec![1.0, 2.0, 3.0, 4.0];
    /// let block = VolumeBlock::new_with_data(&dims, data).unwrap();
    ///
    /// assert_eq!(block[[0usize, 0usize].as_ref()], 1.0);
    /// assert_eq!(block[[0usize, 1usize].as_ref()], 2.0);
    /// assert_eq!(block[[1usize, 0usize].as_ref()], 3.0);
    /// assert_eq!(block[[1usize, 1usize].as_ref()], 4.0);
    /// ```
    pub fn new_with_data(dims: &[usize], data: Vec<T>) -> Result<Self, VolumeError> {
        let num_elements = dims.iter().product();

        if dims.is_empty() {
            Err(VolumeError::ZeroBlockLength)
        } else if let Some(len) = dims.iter().find(|&&len| len == 0) {
            Err(VolumeError::InvalidDimensionLength { length: *len })
        } else if num_elements != data.len() {
            Err(VolumeError::InvalidNumberOfElements {
                got: data.len(),
                required: num_elements,
            })
        } else {
            let strides = strides_for_dims(dims);

            Ok(Self {
                data,
                dims: dims.into(),
                strides,
            })
        }
    }

    /// Returns the dimensions of the block.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the number of axes.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Blocks always hold at least one element.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a slice to the flat representation of the volume.
    pub fn flatten(&self) -> &[T] {
        &self.data
    }

    /// Returns a mutable slice to the flat representation of the volume.
    pub fn flatten_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the block, returning its flat data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Returns a reference to the element at the provided index.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    /// Returns a mutable reference to the element at the provided index.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.data.get_mut(index)
    }

    /// Returns the contiguous sub-block at `index` along the leading axis.
    ///
    /// # Examples
    ///
    /// ```
    /// use starlet_rs::volume::VolumeBlock;
    ///
    /// let dims = [3, 2];
    /// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    /// let block = VolumeBlock::new_with_data(&dims, data).unwrap();
    ///
    /// assert_eq!(block.subblock(1), [3.0, 4.0]);
    /// ```
    pub fn subblock(&self, index: usize) -> &[T] {
        let len = self.strides[0];
        &self.data[index * len..(index + 1) * len]
    }

    /// Returns the mutable contiguous sub-block at `index` along the leading axis.
    pub fn subblock_mut(&mut self, index: usize) -> &mut [T] {
        let len = self.strides[0];
        &mut self.data[index * len..(index + 1) * len]
    }

    /// Iterates over the contiguous sub-blocks along the leading axis.
    pub fn subblocks(&self) -> std::slice::ChunksExact<'_, T> {
        self.data.chunks_exact(self.strides[0])
    }
}

impl<T: Float> VolumeBlock<T> {
    /// Checks that the data contained inside the volumes is equal
    /// apart from a specified error value.
    pub fn is_equal(&self, other: &Self, eps: T) -> bool {
        self.dims == other.dims
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(this, other)| (*this - *other).abs() < eps)
    }

    /// Largest absolute element-wise difference between two equally shaped volumes.
    pub fn max_abs_diff(&self, other: &Self) -> T {
        assert_eq!(self.dims, other.dims);
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (*a - *b).abs())
            .fold(T::zero(), T::max)
    }

    /// Frobenius norm of the volume.
    pub fn norm(&self) -> T {
        self.data
            .iter()
            .fold(T::zero(), |acc, &x| acc + x * x)
            .sqrt()
    }

    /// Returns whether every element is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// Multiplies every element by `factor`.
    pub fn scale(&mut self, factor: T) {
        for x in self.data.iter_mut() {
            *x = *x * factor;
        }
    }
}

impl<T> Index<usize> for VolumeBlock<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for VolumeBlock<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl<T> Index<&[usize]> for VolumeBlock<T> {
    type Output = T;

    fn index(&self, index: &[usize]) -> &Self::Output {
        let idx = flatten_idx(&self.dims, &self.strides, index);
        &self[idx]
    }
}

impl<T> IndexMut<&[usize]> for VolumeBlock<T> {
    fn index_mut(&mut self, index: &[usize]) -> &mut Self::Output {
        let idx = flatten_idx(&self.dims, &self.strides, index);
        &mut self[idx]
    }
}

/// Errors that can occur when constructing a [`VolumeBlock`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VolumeError {
    /// Tried to construct a [`VolumeBlock`] containing no axes.
    #[error("a block length of 0 is not supported")]
    ZeroBlockLength,

    /// Tried to construct a [`VolumeBlock`] with an invalid dimension length.
    #[error("invalid length for dimension (got {length})")]
    InvalidDimensionLength {
        /// Length of the axis.
        length: usize,
    },

    /// Number of provided elements does not match with the required length.
    #[error("invalid number of elements (got {got}, required {required})")]
    InvalidNumberOfElements {
        /// Number of provided elements.
        got: usize,
        /// Number of required elements.
        required: usize,
    },
}
