use std::fmt;
use std::io::Write;

use snafu::ResultExt;

use crate::error::{Result, WriteSnafu};
use crate::matrix::Matrix;

/// Fixed-width rendering of row-major data: each value rounded to an integer,
/// right-aligned in 7 columns, one row per line.
struct Grid<'a> {
    data: &'a [f64],
    rows: usize,
    cols: usize,
}

impl fmt::Display for Grid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            for value in &self.data[i * self.cols..(i + 1) * self.cols] {
                write!(f, "{value:7.0}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Matrix {
    /// Write the host matrix as a fixed-width grid.
    pub fn write_grid<W: Write>(&self, out: &mut W) -> Result<()> {
        let grid = Grid { data: self.host()?, rows: self.rows, cols: self.cols };
        write!(out, "{grid}").context(WriteSnafu)
    }

    /// Print the host matrix to stderr.
    pub fn print(&self) -> Result<()> {
        self.write_grid(&mut std::io::stderr().lock())
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host.as_deref() {
            Some(data) => fmt::Display::fmt(&Grid { data, rows: self.rows, cols: self.cols }, f),
            None => write!(f, "<{}x{} matrix, host buffer not allocated>", self.rows, self.cols),
        }
    }
}
