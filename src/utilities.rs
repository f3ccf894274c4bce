/// Computes row-major strides, the last axis being contiguous.
pub fn strides_for_dims(dims: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; dims.len()];
    for i in (0..dims.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * dims[i + 1];
    }

    strides
}

pub fn flatten_idx(dims: &[usize], strides: &[usize], index: &[usize]) -> usize {
    assert!(index.len() == dims.len());

    if index
        .iter()
        .zip(dims.iter())
        .any(|(&idx, &dim_len)| idx >= dim_len)
    {
        panic!("out of bounds");
    }

    index.iter().zip(strides).map(|(&i, &s)| i * s).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_are_row_major() {
        assert_eq!(strides_for_dims(&[4]), [1]);
        assert_eq!(strides_for_dims(&[3, 5]), [5, 1]);
        assert_eq!(strides_for_dims(&[2, 3, 5]), [15, 5, 1]);
    }

    #[test]
    fn flatten_index() {
        let dims = [2, 3, 5];
        let strides = strides_for_dims(&dims);
        assert_eq!(flatten_idx(&dims, &strides, &[0, 0, 0]), 0);
        assert_eq!(flatten_idx(&dims, &strides, &[1, 2, 4]), 29);
        assert_eq!(flatten_idx(&dims, &strides, &[0, 1, 3]), 8);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn flatten_index_out_of_bounds() {
        let dims = [2, 2];
        let strides = strides_for_dims(&dims);
        flatten_idx(&dims, &strides, &[2, 0]);
    }
}
