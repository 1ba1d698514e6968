use std::time::Instant;

use crate::{NormalizerConfig, Observation, Result, TrajectoryTable};

/// Per-vehicle time normalization, preceding vehicle join and unit conversion
#[derive(Debug, Clone, Default)]
pub struct TrajectoryNormalizer {
    config: NormalizerConfig,
}
impl TrajectoryNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }
    /// Builds the table of observations and derives its columns
    pub fn normalize(&self, observations: Vec<Observation>) -> Result<TrajectoryTable> {
        self.config.validate()?;
        let now = Instant::now();
        log::info!("Normalizing {} observations...", observations.len());
        let mut table = TrajectoryTable::new(observations)?;
        table
            .localize_time(self.config.utc_offset()?)?
            .normalize_time(self.config.samples_per_second);
        log::debug!(
            "elapsed time set for {} trajectories",
            table.trajectories().count()
        );
        table.join_preceding(self.config.preceding_local_x)?;
        if let Some(conversion) = self.config.unit_conversion.as_ref() {
            log::debug!("scaling lengths by {}", conversion.factor);
            table.convert_units(conversion);
        }
        log::info!("... normalized in {:}ms", now.elapsed().as_millis());
        Ok(table)
    }
    /// Normalizes a dataframe with NGSIM-like column names
    #[cfg(feature = "frame")]
    pub fn normalize_frame(
        &self,
        df: &polars::prelude::DataFrame,
    ) -> Result<polars::prelude::DataFrame> {
        let df = crate::frame::clean_names(df.clone())?;
        let observations = crate::frame::observations_from_frame(&df, &self.config.columns)?;
        self.normalize(observations)?.to_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, UnitConversion};

    fn scenario() -> Vec<Observation> {
        (0..3)
            .flat_map(|k| {
                vec![
                    Observation::new(2, 100 + k)
                        .preceding_id(1)
                        .velocity(30.0),
                    Observation::new(1, 100 + k).velocity(10.0 * (k + 1) as f64),
                ]
            })
            .collect()
    }

    #[test]
    fn metric_pipeline() {
        let table = TrajectoryNormalizer::default().normalize(scenario()).unwrap();
        assert_eq!(table.len(), 6);
        let follower = table.vehicle(2).unwrap();
        let velocities: Vec<_> = follower
            .records()
            .iter()
            .filter_map(|r| r.preceding_velocity())
            .collect();
        assert_eq!(velocities, vec![3.05, 6.1, 9.14]);
        assert_eq!(follower.records()[0].observation.velocity, 9.14);
        assert!(table.vehicle(1).unwrap().records().iter().all(|r| r.preceding.is_none()));
    }

    #[test]
    fn keeps_units() {
        let normalizer =
            TrajectoryNormalizer::new(NormalizerConfig::default().unit_conversion(None));
        let table = normalizer.normalize(scenario()).unwrap();
        let times: Vec<_> = table
            .vehicle(2)
            .unwrap()
            .records()
            .iter()
            .map(|r| (r.time(), r.preceding_velocity()))
            .collect();
        assert_eq!(
            times,
            vec![
                (Some(0.0), Some(10.0)),
                (Some(0.1), Some(20.0)),
                (Some(0.2), Some(30.0))
            ]
        );
    }

    #[test]
    fn invalid_config_is_refused() {
        let normalizer = TrajectoryNormalizer::new(
            NormalizerConfig::default().unit_conversion(Some(UnitConversion {
                factor: f64::NAN,
                decimals: 2,
            })),
        );
        assert!(matches!(
            normalizer.normalize(scenario()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn invalid_timestamp_aborts_batch() {
        let mut observations = scenario();
        observations[3].global_time = i64::MAX;
        assert!(matches!(
            TrajectoryNormalizer::default().normalize(observations),
            Err(Error::InvalidTimestamp(_))
        ));
    }

    #[cfg(feature = "frame")]
    #[test]
    fn normalizes_dataframe() {
        use polars::prelude::*;
        let df = df!(
            "Vehicle_ID" => [1i64, 2],
            "Frame_ID" => [7i64, 7],
            "Local_X" => [6.0, 18.0],
            "Local_Y" => [100.0, 60.0],
            "v_Length" => [15.0, 40.0],
            "v_Width" => [6.0, 8.5],
            "v_Class" => [2i64, 3],
            "v_Vel" => [40.0, 30.0],
            "v_Acc" => [0.0, 1.0],
            "Preceding" => [0i64, 1],
            "Global_Time" => [1_113_433_136_100i64, 1_113_433_136_100]
        )
        .unwrap();
        let out = TrajectoryNormalizer::default().normalize_frame(&df).unwrap();
        assert_eq!(out.height(), 2);
        let local_y = out.column("preceding_local_y").unwrap().f64().unwrap();
        assert_eq!(local_y.get(0), None);
        assert_eq!(local_y.get(1), Some(30.48));
    }
}
