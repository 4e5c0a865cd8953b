// src/mask.rs
//! Boolean validity grid co-indexed with a [`Space`](crate::space::Space).
//! `true` marks an allowed cell.

use crate::points::ShapeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    shape: Vec<usize>,
    values: Vec<bool>,
}

impl Mask {
    /// All cells allowed.
    pub fn allowed(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            values: vec![true; shape.iter().product()],
        }
    }

    pub fn from_values(shape: &[usize], values: Vec<bool>) -> Result<Self, ShapeError> {
        if shape.iter().product::<usize>() != values.len() {
            return Err(ShapeError::Length {
                len: values.len(),
                shape: shape.to_vec(),
            });
        }
        Ok(Self {
            shape: shape.to_vec(),
            values,
        })
    }

    pub(crate) fn from_raw(shape: Vec<usize>, values: Vec<bool>) -> Self {
        debug_assert_eq!(values.len(), shape.iter().product::<usize>());
        Self { shape, values }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn values(&self) -> &[bool] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, flat: usize) -> Option<bool> {
        self.values.get(flat).copied()
    }

    fn check_shape(&self, other: &Mask) -> Result<(), ShapeError> {
        if self.shape != other.shape {
            return Err(ShapeError::Length {
                len: other.values.len(),
                shape: self.shape.clone(),
            });
        }
        Ok(())
    }

    /// Cell-wise AND with `other`.
    pub fn and_assign(&mut self, other: &Mask) -> Result<(), ShapeError> {
        self.check_shape(other)?;
        for (a, b) in self.values.iter_mut().zip(&other.values) {
            *a &= *b;
        }
        Ok(())
    }

    /// Cell-wise OR with `other`.
    pub fn or_assign(&mut self, other: &Mask) -> Result<(), ShapeError> {
        self.check_shape(other)?;
        for (a, b) in self.values.iter_mut().zip(&other.values) {
            *a |= *b;
        }
        Ok(())
    }

    /// Overwrite every cell with `other`.
    pub fn replace(&mut self, other: &Mask) -> Result<(), ShapeError> {
        self.check_shape(other)?;
        self.values.copy_from_slice(&other.values);
        Ok(())
    }

    pub fn allowed_count(&self) -> usize {
        self.values.iter().filter(|v| **v).count()
    }

    pub fn excluded_count(&self) -> usize {
        self.len() - self.allowed_count()
    }

    pub fn allowed_fraction(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.allowed_count() as f64 / self.len() as f64
    }
}
