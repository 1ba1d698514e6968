use std::path::Path;

use chrono::FixedOffset;
use serde::Deserialize;

use crate::{Error, Result};

/// Scaling applied to length, velocity and acceleration fields
///
/// Values are multiplied by `factor` then rounded to `decimals` places,
/// halves rounding away from zero.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct UnitConversion {
    pub factor: f64,
    pub decimals: u32,
}
impl Default for UnitConversion {
    fn default() -> Self {
        Self::feet_to_meters()
    }
}
impl UnitConversion {
    pub fn feet_to_meters() -> Self {
        Self {
            factor: 0.3048,
            decimals: 2,
        }
    }
    pub fn apply(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.decimals as i32);
        (value * self.factor * scale).round() / scale
    }
    pub fn apply_opt(&self, value: Option<f64>) -> Option<f64> {
        value.map(|x| self.apply(x))
    }
}

/// Input column names of the observation fields
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub vehicle_id: String,
    pub frame_id: String,
    pub lane_id: String,
    pub preceding_id: String,
    pub local_x: String,
    pub local_y: String,
    pub length: String,
    pub width: String,
    pub class: String,
    pub velocity: String,
    pub acceleration: String,
    pub space_headway: String,
    pub time_headway: String,
    pub global_time: String,
}
impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            vehicle_id: "vehicle_id".into(),
            frame_id: "frame_id".into(),
            lane_id: "lane_id".into(),
            preceding_id: "preceding".into(),
            local_x: "local_x".into(),
            local_y: "local_y".into(),
            length: "v_length".into(),
            width: "v_width".into(),
            class: "v_class".into(),
            velocity: "v_vel".into(),
            acceleration: "v_acc".into(),
            space_headway: "space_headway".into(),
            time_headway: "time_headway".into(),
            global_time: "global_time".into(),
        }
    }
}

/// [TrajectoryNormalizer](crate::TrajectoryNormalizer) settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Sampling rate of the trajectories
    pub samples_per_second: f64,
    /// Carry the preceding vehicle lateral position
    pub preceding_local_x: bool,
    /// `None` keeps the original units
    pub unit_conversion: Option<UnitConversion>,
    /// Offset of the local time of `global_time`
    pub utc_offset_hours: i32,
    pub columns: ColumnNames,
}
impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            samples_per_second: 10f64,
            preceding_local_x: false,
            unit_conversion: Some(UnitConversion::default()),
            utc_offset_hours: -7,
            columns: ColumnNames::default(),
        }
    }
}
impl NormalizerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
    pub fn samples_per_second(self, samples_per_second: f64) -> Self {
        Self {
            samples_per_second,
            ..self
        }
    }
    pub fn preceding_local_x(self, preceding_local_x: bool) -> Self {
        Self {
            preceding_local_x,
            ..self
        }
    }
    pub fn unit_conversion(self, unit_conversion: Option<UnitConversion>) -> Self {
        Self {
            unit_conversion,
            ..self
        }
    }
    pub fn utc_offset_hours(self, utc_offset_hours: i32) -> Self {
        Self {
            utc_offset_hours,
            ..self
        }
    }
    pub fn columns(self, columns: ColumnNames) -> Self {
        Self { columns, ..self }
    }
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            Error::Config(format!(
                "UTC offset of {}h is out of range",
                self.utc_offset_hours
            ))
        })
    }
    pub fn validate(&self) -> Result<()> {
        if !(self.samples_per_second.is_finite() && self.samples_per_second > 0f64) {
            return Err(Error::Config(format!(
                "samples per second must be positive, found {}",
                self.samples_per_second
            )));
        }
        if let Some(UnitConversion { factor, .. }) = self.unit_conversion {
            if !(factor.is_finite() && factor > 0f64) {
                return Err(Error::Config(format!(
                    "unit conversion factor must be positive, found {factor}"
                )));
            }
        }
        self.utc_offset().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feet_to_meters() {
        let metric = UnitConversion::default();
        assert_eq!(metric.apply(100.0), 30.48);
        assert_eq!(metric.apply(-3.5), -1.07);
        assert_eq!(metric.apply_opt(None), None);
    }

    #[test]
    fn toml_overrides() {
        let config = NormalizerConfig::from_toml_str(
            r#"
            preceding_local_x = true
            utc_offset_hours = 0

            [unit_conversion]
            factor = 1.0
            decimals = 1

            [columns]
            velocity = "speed"
            "#,
        )
        .unwrap();
        assert!(config.preceding_local_x);
        assert_eq!(config.samples_per_second, 10.0);
        assert_eq!(
            config.unit_conversion,
            Some(UnitConversion {
                factor: 1.0,
                decimals: 1
            })
        );
        assert_eq!(config.columns.velocity, "speed");
        assert_eq!(config.columns.acceleration, "v_acc");
    }

    #[test]
    fn rejects_invalid_settings() {
        let config = NormalizerConfig::default().samples_per_second(0.0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        let config = NormalizerConfig::default().utc_offset_hours(30);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        assert!(NormalizerConfig::from_toml_str("samples_per_second = -1.0").is_err());
    }

    #[test]
    fn missing_config_file() {
        assert!(matches!(
            NormalizerConfig::from_path("does/not/exist/ngsim.toml"),
            Err(Error::Io(_))
        ));
    }
}
