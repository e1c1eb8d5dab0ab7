// src/radius_model.rs - Minnaert resonance: bubble radius from acoustic frequency

use std::f64::consts::PI;

use crate::errors::{BubbleCharError, Result};

/// Minnaert bubble resonance, f = (1 / 2πR) * sqrt(3κp₀ / ρ), inverted for R.
///
/// All constants are experiment specific and come from configuration. The model is
/// only trusted inside `[min_frequency_hz, max_frequency_hz]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MinnaertModel {
    /// Polytropic exponent κ of the gas (1.0 isothermal, 1.4 adiabatic air)
    pub polytropic_exponent: f64,
    /// Ambient liquid pressure p₀ in Pa
    pub ambient_pressure_pa: f64,
    /// Liquid density ρ in kg/m³
    pub liquid_density_kg_m3: f64,
    pub min_frequency_hz: f64,
    pub max_frequency_hz: f64,
}

impl MinnaertModel {
    pub fn new(
        polytropic_exponent: f64,
        ambient_pressure_pa: f64,
        liquid_density_kg_m3: f64,
        min_frequency_hz: f64,
        max_frequency_hz: f64,
    ) -> Result<Self> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(BubbleCharError::Config(format!("{} must be > 0, got {}", name, value)))
            }
        };

        positive("polytropic_exponent", polytropic_exponent)?;
        positive("ambient_pressure_pa", ambient_pressure_pa)?;
        positive("liquid_density_kg_m3", liquid_density_kg_m3)?;
        positive("minimum model frequency", min_frequency_hz)?;

        if !(max_frequency_hz.is_finite() && max_frequency_hz > min_frequency_hz) {
            return Err(BubbleCharError::Config(format!(
                "model frequency range [{}, {}] Hz is empty",
                min_frequency_hz, max_frequency_hz
            )));
        }

        Ok(Self {
            polytropic_exponent,
            ambient_pressure_pa,
            liquid_density_kg_m3,
            min_frequency_hz,
            max_frequency_hz,
        })
    }

    /// sqrt(3κp₀ / ρ) in m/s
    fn stiffness(&self) -> f64 {
        (3.0 * self.polytropic_exponent * self.ambient_pressure_pa / self.liquid_density_kg_m3).sqrt()
    }

    pub fn valid_range(&self) -> (f64, f64) {
        (self.min_frequency_hz, self.max_frequency_hz)
    }

    /// Equivalent bubble radius in mm for a resonance frequency in Hz
    pub fn radius_from_frequency(&self, frequency_hz: f64) -> Result<f64> {
        if !(frequency_hz >= self.min_frequency_hz && frequency_hz <= self.max_frequency_hz) {
            return Err(BubbleCharError::OutOfModelRange {
                frequency: frequency_hz,
                min: self.min_frequency_hz,
                max: self.max_frequency_hz,
            });
        }

        let radius_m = self.stiffness() / (2.0 * PI * frequency_hz);
        Ok(radius_m * 1000.0)
    }

    /// Resonance frequency in Hz of a bubble with the given radius in mm
    pub fn frequency_from_radius(&self, radius_mm: f64) -> f64 {
        self.stiffness() / (2.0 * PI * radius_mm / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn air_in_water() -> MinnaertModel {
        MinnaertModel::new(1.4, 101_325.0, 998.2, 200.0, 10_000.0).unwrap()
    }

    #[test]
    fn millimetre_bubble_rings_near_three_khz() {
        let model = air_in_water();
        let f = model.frequency_from_radius(1.0);
        assert!(f > 3200.0 && f < 3350.0, "f = {}", f);
    }

    #[test]
    fn inverse_round_trips_forward_model() {
        let model = air_in_water();
        for radius in [0.5, 1.0, 2.5, 4.0] {
            let f = model.frequency_from_radius(radius);
            assert_approx_eq!(model.radius_from_frequency(f).unwrap(), radius, 1e-9);
        }
    }

    #[test]
    fn radius_decreases_with_frequency() {
        let model = air_in_water();
        let mut previous = f64::INFINITY;
        for f in (200..=10_000).step_by(200) {
            let radius = model.radius_from_frequency(f as f64).unwrap();
            assert!(radius < previous);
            previous = radius;
        }
    }

    #[test]
    fn range_is_enforced() {
        let model = air_in_water();
        assert!(model.radius_from_frequency(200.0).is_ok());
        assert!(model.radius_from_frequency(10_000.0).is_ok());
        assert!(matches!(
            model.radius_from_frequency(199.9),
            Err(BubbleCharError::OutOfModelRange { .. })
        ));
        assert!(matches!(
            model.radius_from_frequency(f64::NAN),
            Err(BubbleCharError::OutOfModelRange { .. })
        ));
    }

    #[test]
    fn invalid_constants_are_rejected() {
        assert!(MinnaertModel::new(0.0, 101_325.0, 998.2, 200.0, 10_000.0).is_err());
        assert!(MinnaertModel::new(1.4, 101_325.0, -1.0, 200.0, 10_000.0).is_err());
        assert!(MinnaertModel::new(1.4, 101_325.0, 998.2, 500.0, 500.0).is_err());
    }
}
