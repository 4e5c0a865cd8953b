// src/points.rs
//! Point arrays shaped `(..., N)`.
//!
//! A single point has shape `[N]`, a list of points `[M, N]`, and a grid
//! layer `[n0, n1, ..., N]`. Storage is one contiguous row-major buffer so
//! batch operations walk it with `chunks_exact(N)`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShapeError {
    #[error("Expected points with trailing dimension {expected}, got {found}")]
    Dimension { expected: usize, found: usize },
    #[error("Data length {len} does not fit shape {shape:?}")]
    Length { len: usize, shape: Vec<usize> },
    #[error("Points need a non-zero trailing dimension")]
    Empty,
}

/// A batch of N-dimensional points with an explicit array shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Points {
    data: Vec<f64>,
    shape: Vec<usize>,
}

impl Points {
    pub fn new(data: Vec<f64>, shape: Vec<usize>) -> Result<Self, ShapeError> {
        match shape.last() {
            None | Some(0) => return Err(ShapeError::Empty),
            Some(_) => {}
        }
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ShapeError::Length {
                len: data.len(),
                shape,
            });
        }
        Ok(Self { data, shape })
    }

    /// Caller guarantees `data.len()` equals the product of `shape`.
    pub(crate) fn from_grid(data: Vec<f64>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(data.len(), shape.iter().product::<usize>());
        Self { data, shape }
    }

    /// One point, shape `[N]`.
    pub fn single(point: &[f64]) -> Result<Self, ShapeError> {
        Self::new(point.to_vec(), vec![point.len()])
    }

    /// A flat list of points, shape `[M, ndims]`.
    pub fn from_rows(rows: &[Vec<f64>], ndims: usize) -> Result<Self, ShapeError> {
        if ndims == 0 {
            return Err(ShapeError::Empty);
        }
        let mut data = Vec::with_capacity(rows.len() * ndims);
        for row in rows {
            if row.len() != ndims {
                return Err(ShapeError::Dimension {
                    expected: ndims,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            shape: vec![rows.len(), ndims],
        })
    }

    pub fn ndims(&self) -> usize {
        self.shape.last().copied().unwrap_or(0)
    }

    /// Number of points (product of every dimension but the last).
    pub fn len(&self) -> usize {
        match self.ndims() {
            0 => 0,
            n => self.data.len() / n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_single(&self) -> bool {
        self.shape.len() == 1
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn point(&self, index: usize) -> Option<&[f64]> {
        let n = self.ndims();
        self.data.get(index * n..(index + 1) * n)
    }

    pub fn iter(&self) -> std::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.ndims().max(1))
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter().map(<[f64]>::to_vec).collect()
    }

    /// Fails unless the trailing dimension equals `ndims`.
    pub fn check_ndims(&self, ndims: usize) -> Result<(), ShapeError> {
        if self.ndims() != ndims {
            return Err(ShapeError::Dimension {
                expected: ndims,
                found: self.ndims(),
            });
        }
        Ok(())
    }

    /// New points carrying this array's shape with replacement data.
    pub fn with_data(&self, data: Vec<f64>) -> Result<Self, ShapeError> {
        Self::new(data, self.shape.clone())
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }
}
