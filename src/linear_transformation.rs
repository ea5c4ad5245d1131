//! Amplifier controller linear-transformation routines

/// A structure for mapping values between two different domains.
#[derive(serde::Serialize, serde::Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct LinearTransformation {
    slope: f32,
    offset: f32,
}

impl LinearTransformation {
    /// Construct a new linear transformation.
    ///
    /// # Note
    /// A linear transformation is used for mapping values between two different domains.
    ///
    /// # Args
    /// * `slope` - The slope of the y = mx + b equation.
    /// * `offset` - The y-intercept. Equals the b portion of y = mx + b.
    pub fn new(slope: f32, offset: f32) -> Self {
        LinearTransformation { slope, offset }
    }

    /// Construct a transformation that removes an offset before applying a gain.
    ///
    /// # Note
    /// This is the form used by current-sense amplifiers: y = (x - zero) / sensitivity.
    ///
    /// # Args
    /// * `zero` - The X-axis value that maps to zero.
    /// * `sensitivity` - The change in X per unit of Y.
    pub fn from_zero_and_sensitivity(zero: f32, sensitivity: f32) -> Self {
        LinearTransformation {
            slope: 1.0 / sensitivity,
            offset: -zero / sensitivity,
        }
    }

    /// Convert a value from the Y-domain into the X-domain.
    ///
    /// # Note
    /// This is accomplished by inverting the equation y=mx + b, such that y, m, and b are known.
    ///
    /// # Args
    /// * `vertical` - The Y-axis value to convert into the X-axis.
    pub fn invert(&self, vertical: f32) -> f32 {
        (vertical - self.offset) / self.slope
    }

    /// Map a value from the X-domain into the Y-domain using a linear equation.
    ///
    /// # Note
    /// This is accomplished by using the equation y=mx + b.
    ///
    /// # Args
    /// * `horizontal` - The X-axis value to map into the Y-axis.
    pub fn map(&self, horizontal: f32) -> f32 {
        horizontal * self.slope + self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_and_invert() {
        let transform = LinearTransformation::new(2.0, 1.0);
        assert_eq!(transform.map(3.0), 7.0);
        assert_eq!(transform.invert(7.0), 3.0);
    }

    #[test]
    fn current_sense_form() {
        // 0.5V at zero current, 100mV per amp.
        let transform = LinearTransformation::from_zero_and_sensitivity(0.5, 0.1);
        assert!((transform.map(0.5)).abs() < 1e-6);
        assert!((transform.map(1.5) - 10.0).abs() < 1e-4);
        assert!((transform.invert(10.0) - 1.5).abs() < 1e-5);
    }
}
