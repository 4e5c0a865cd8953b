// src/numeric.rs
//! Scalar root finding used by the iterative inverse transforms.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RootError {
    #[error("Root not bracketed on [{lo}, {hi}]: f(lo) = {f_lo}, f(hi) = {f_hi}")]
    NotBracketed { lo: f64, hi: f64, f_lo: f64, f_hi: f64 },
    #[error("Root search did not converge after {iterations} iterations (residual {residual:e})")]
    NotConverged { iterations: usize, residual: f64 },
    #[error("Function evaluated to a non-finite value at {at}")]
    NonFinite { at: f64 },
}

/// Bracketed root solver (Illinois variant of regula falsi).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootSolver {
    /// Absolute tolerance on both the bracket width and the residual.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for RootSolver {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 100,
        }
    }
}

impl RootSolver {
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Find `x` in `[lo, hi]` with `f(x) == 0`.
    pub fn solve<F>(&self, f: F, mut lo: f64, mut hi: f64) -> Result<f64, RootError>
    where
        F: Fn(f64) -> f64,
    {
        let mut f_lo = f(lo);
        let mut f_hi = f(hi);
        if !f_lo.is_finite() {
            return Err(RootError::NonFinite { at: lo });
        }
        if !f_hi.is_finite() {
            return Err(RootError::NonFinite { at: hi });
        }
        if f_lo == 0.0 {
            return Ok(lo);
        }
        if f_hi == 0.0 {
            return Ok(hi);
        }
        if f_lo.signum() == f_hi.signum() {
            return Err(RootError::NotBracketed { lo, hi, f_lo, f_hi });
        }

        // which end was kept on the previous step: -1 lo, +1 hi
        let mut side = 0i8;
        let mut residual = f64::INFINITY;
        for iteration in 0..self.max_iterations {
            let x = (lo * f_hi - hi * f_lo) / (f_hi - f_lo);
            let fx = f(x);
            if !fx.is_finite() {
                return Err(RootError::NonFinite { at: x });
            }
            residual = fx.abs();
            tracing::trace!(iteration, x, residual, "root solver step");
            if residual <= self.tolerance || (hi - lo).abs() <= self.tolerance {
                return Ok(x);
            }

            if fx.signum() == f_hi.signum() {
                hi = x;
                f_hi = fx;
                if side == -1 {
                    f_lo *= 0.5;
                }
                side = -1;
            } else {
                lo = x;
                f_lo = fx;
                if side == 1 {
                    f_hi *= 0.5;
                }
                side = 1;
            }
        }

        Err(RootError::NotConverged {
            iterations: self.max_iterations,
            residual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solves_cubic() {
        let solver = RootSolver::default();
        let root = solver.solve(|x| x * x * x - 2.0, 0.0, 2.0).unwrap();
        assert!((root - 2f64.cbrt()).abs() < 1e-10);
    }

    #[test]
    fn test_solves_trig() {
        let solver = RootSolver::new(1e-14, 200);
        let root = solver.solve(|x| x.cos() - x, 0.0, 1.0).unwrap();
        assert!((root.cos() - root).abs() < 1e-13);
    }

    #[test]
    fn test_not_bracketed() {
        let err = RootSolver::default().solve(|x| x * x + 1.0, -1.0, 1.0).unwrap_err();
        assert!(matches!(err, RootError::NotBracketed { .. }));
    }

    #[test]
    fn test_iteration_cap() {
        let err = RootSolver::new(0.0, 3).solve(|x| x.powi(5) - 0.3, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, RootError::NotConverged { iterations: 3, .. }));
    }
}
