//! Separable Gaussian smoothing for elevation grids.
//!
//! Boundary handling is "reflect" (half-sample symmetric: `d c b a | a b c d`)
//! and the kernel is truncated at four standard deviations. Kernels wider
//! than the reflect period of a line are folded onto that period.

use crate::domain::ElevationGrid;

const TRUNCATE: f64 = 4.0;

/// Smooth `grid` with a Gaussian of standard deviation `sigma` (in cells).
///
/// A sigma of zero, or one that is not finite, returns the grid unchanged.
pub fn gaussian_smooth(grid: &ElevationGrid, sigma: f64) -> ElevationGrid {
    if !(sigma.is_finite() && sigma > 0.0) || grid.values().is_empty() {
        return grid.clone();
    }

    let rows = grid.rows();
    let cols = grid.cols();
    let row_kernel = LineKernel::new(sigma, cols);
    let col_kernel = LineKernel::new(sigma, rows);

    let mut out = grid.clone();
    let mut line = Vec::with_capacity(rows.max(cols));

    // Along each row
    for row in 0..rows {
        let values = out.values_mut();
        line.clear();
        line.extend_from_slice(&values[row * cols..(row + 1) * cols]);
        for (col, v) in values[row * cols..(row + 1) * cols].iter_mut().enumerate() {
            *v = row_kernel.convolve_at(&line, col);
        }
    }

    // Along each column
    for col in 0..cols {
        let values = out.values_mut();
        line.clear();
        line.extend((0..rows).map(|row| values[row * cols + col]));
        for row in 0..rows {
            values[row * cols + col] = col_kernel.convolve_at(&line, row);
        }
    }

    out
}

/// Truncated kernel radius; saturates for huge sigmas
fn kernel_radius(sigma: f64) -> usize {
    (TRUNCATE * sigma + 0.5) as usize
}

/// Normalized 1D kernel of length `2 * radius + 1`
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = kernel_radius(sigma) as isize;
    normalized((-radius..=radius).map(|x| gaussian_weight(x, sigma)).collect())
}

fn gaussian_weight(x: isize, sigma: f64) -> f64 {
    let x = x as f64;
    (-(x * x) / (2.0 * sigma * sigma)).exp()
}

fn normalized(mut weights: Vec<f64>) -> Vec<f64> {
    let sum: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Longest folded kernel, in reflect periods
const MAX_FOLDED_PERIODS: usize = 32;

/// Gaussian weights for one line of `len` samples.
///
/// Reflect indexing repeats every `2 * len` samples, so a kernel wider than
/// that is folded into `2 * len` bins. Weights apply to offsets starting at
/// `first_offset`.
struct LineKernel {
    weights: Vec<f64>,
    first_offset: isize,
}

impl LineKernel {
    fn new(sigma: f64, len: usize) -> Self {
        let period = 2 * len;
        let radius = kernel_radius(sigma);
        if radius < period {
            return Self {
                weights: gaussian_kernel(sigma),
                first_offset: -(radius as isize),
            };
        }

        let radius = radius.min(MAX_FOLDED_PERIODS * period) as isize;
        let mut weights = vec![0.0; period];
        for x in -radius..=radius {
            weights[x.rem_euclid(period as isize) as usize] += gaussian_weight(x, sigma);
        }
        Self {
            weights: normalized(weights),
            first_offset: 0,
        }
    }

    fn convolve_at(&self, line: &[f64], center: usize) -> f64 {
        let start = center as isize + self.first_offset;
        self.weights
            .iter()
            .enumerate()
            .map(|(k, weight)| weight * line[reflect_index(start + k as isize, line.len())])
            .sum()
    }
}

fn reflect_index(i: isize, len: usize) -> usize {
    let n = len as isize;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    if m >= n {
        (period - 1 - m) as usize
    } else {
        m as usize
    }
}
