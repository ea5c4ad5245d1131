//! Piecewise-linear transfer curves
//!
//! Calibrated sensors (RF power detectors, thermistor dividers) are described by a small table of
//! measured control points. Values between two points are linearly interpolated and values
//! outside of the table are clamped to the nearest end point; the curve is never extrapolated.
use heapless::Vec;

use crate::Error;

/// The maximum number of control points a single curve may hold.
pub const MAX_POINTS: usize = 64;

/// An immutable, sorted table of `(x, y)` control points.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseLinear {
    points: Vec<(f32, f32), MAX_POINTS>,
}

impl PiecewiseLinear {
    /// Construct a curve from parallel sequences of domain and range values.
    ///
    /// # Note
    /// Points are sorted by ascending `x`. Points sharing the same `x` keep their relative order.
    ///
    /// # Args
    /// * `x` - The domain value of each control point.
    /// * `y` - The range value of each control point.
    ///
    /// # Returns
    /// The curve, or [Error::InvalidTable] if the sequences differ in length, hold fewer than 2
    /// or more than [MAX_POINTS] points, or contain a value that is not finite.
    pub fn new(x: &[f32], y: &[f32]) -> Result<Self, Error> {
        if x.len() != y.len() || x.len() < 2 {
            return Err(Error::InvalidTable);
        }

        let mut points: Vec<(f32, f32), MAX_POINTS> = Vec::new();
        for (&xi, &yi) in x.iter().zip(y.iter()) {
            if !xi.is_finite() || !yi.is_finite() {
                return Err(Error::InvalidTable);
            }

            points.push((xi, yi)).map_err(|_| Error::InvalidTable)?;
        }

        // Insertion sort is stable, which keeps tied points in their original order.
        for i in 1..points.len() {
            let mut j = i;
            while j > 0 && points[j - 1].0 > points[j].0 {
                points.swap(j - 1, j);
                j -= 1;
            }
        }

        Ok(Self { points })
    }

    /// Map a domain value onto the curve.
    ///
    /// # Note
    /// Queries at or below the smallest `x` return the first point's `y`, queries at or above the
    /// largest `x` return the last point's `y`. A NaN query is treated like a query below the
    /// table.
    ///
    /// # Args
    /// * `x` - The domain value to map.
    pub fn evaluate(&self, x: f32) -> f32 {
        let (x_min, y_min) = self.points[0];
        let (x_max, y_max) = self.points[self.points.len() - 1];

        if x.is_nan() || x <= x_min {
            return y_min;
        }

        if x >= x_max {
            return y_max;
        }

        for segment in self.points.windows(2) {
            let (x0, y0) = segment[0];
            let (x1, y1) = segment[1];

            if x0 <= x && x <= x1 {
                if x1 == x0 {
                    return y0;
                }

                if x == x1 {
                    return y1;
                }

                return y0 + (x - x0) / (x1 - x0) * (y1 - y0);
            }
        }

        y_max
    }

    /// The sorted control points of the curve.
    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    /// The smallest and largest domain values covered by the table.
    pub fn domain(&self) -> (f32, f32) {
        (self.points[0].0, self.points[self.points.len() - 1].0)
    }
}
