/// Regular lattice of height samples, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl ElevationGrid {
    /// Build a grid from row-major samples.
    ///
    /// Returns `None` when `values.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Option<Self> {
        if rows.checked_mul(cols)? != values.len() {
            return None;
        }
        Some(Self { rows, cols, values })
    }

    /// A grid where every sample has the same height
    pub fn filled(rows: usize, cols: usize, height: f64) -> Self {
        Self {
            rows,
            cols,
            values: vec![height; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    /// Replace NaN/Inf samples with zero
    pub fn zero_non_finite(&mut self) {
        for v in &mut self.values {
            if !v.is_finite() {
                *v = 0.0;
            }
        }
    }

    /// Keep every `step`-th row and column, starting from the first.
    ///
    /// A step of 0 or 1 returns the grid unchanged.
    pub fn downsample(&self, step: usize) -> Self {
        if step <= 1 {
            return self.clone();
        }

        let rows = self.rows.div_ceil(step);
        let cols = self.cols.div_ceil(step);
        let mut values = Vec::with_capacity(rows * cols);
        for row in (0..self.rows).step_by(step) {
            for col in (0..self.cols).step_by(step) {
                values.push(self.get(row, col));
            }
        }

        Self { rows, cols, values }
    }
}
