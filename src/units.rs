//! Measurement units for crop and output dimensions
//!
//! Page sources declare the unit their native size is expressed in and the
//! set of units a caller may meaningfully use against them. Conversions all
//! route through inches.

use crate::error::{Error, Result};

/// Measurement units understood by page sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Inches
    Inches,
    /// Percent of the native size; converts to no other unit
    Percent,
    /// Device pixels (96 per inch)
    Pixels,
    /// Points (1/72 inch) - PDF native unit
    Points,
}

impl Unit {
    /// Human-readable unit name
    pub fn label(&self) -> &'static str {
        match self {
            Unit::Inches => "inches",
            Unit::Percent => "percent",
            Unit::Pixels => "pixels",
            Unit::Points => "points",
        }
    }

    /// Multiplication factor converting a value in `self` to `target`
    pub fn conversion_factor(&self, target: Unit) -> Result<f64> {
        if *self == target {
            return Ok(1.0);
        }

        match (*self, target) {
            (Unit::Inches, Unit::Points) => Ok(72.0),
            (Unit::Inches, Unit::Pixels) => Ok(96.0),
            (Unit::Inches, _) => Err(self.conversion_error(target)),
            (a, Unit::Inches) => Ok(1.0 / Unit::Inches.conversion_factor(a)?),
            (a, b) => {
                // Route through inches for pixel/point pairs
                let to_inches = a.conversion_factor(Unit::Inches)?;
                let from_inches = Unit::Inches.conversion_factor(b)?;
                Ok(to_inches * from_inches)
            }
        }
    }

    /// Convert a value from `self` to `target`
    pub fn convert(&self, value: f64, target: Unit) -> Result<f64> {
        Ok(value * self.conversion_factor(target)?)
    }

    pub(crate) fn conversion_error(self, target: Unit) -> Error {
        Error::UnitConversion(self.label(), target.label())
    }
}
