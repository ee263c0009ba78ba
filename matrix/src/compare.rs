use crate::config::MatrixConfig;
use crate::error::Result;
use crate::matrix::Matrix;

impl Matrix {
    /// Compare host data elementwise within the configured tolerance.
    pub fn approx_eq(&self, other: &Matrix) -> Result<bool> {
        self.approx_eq_within(other, MatrixConfig::global().tolerance)
    }

    /// Compare host data elementwise: equal when the shapes match and every
    /// pair satisfies `|a - b| <= tolerance`.
    ///
    /// Shapes are compared first, so differently-shaped matrices are unequal
    /// even when their host buffers are absent. Otherwise both host buffers
    /// are required, and proving equality visits every element.
    ///
    /// Bit-identical elements always match, which keeps the comparison
    /// reflexive for NaN and infinities.
    pub fn approx_eq_within(&self, other: &Matrix, tolerance: f64) -> Result<bool> {
        if self.rows != other.rows || self.cols != other.cols {
            return Ok(false);
        }

        let lhs = self.host()?;
        let rhs = other.host()?;
        Ok(lhs.iter().zip(rhs).all(|(&a, &b)| within(a, b, tolerance)))
    }
}

fn within(a: f64, b: f64, tolerance: f64) -> bool {
    a.to_bits() == b.to_bits() || (a - b).abs() <= tolerance
}
