//! Conversions between polars dataframes and trajectory tables

use polars::prelude::*;
use regex::Regex;

use crate::{ColumnNames, Error, Observation, Record, Result, TrajectoryTable, VehicleClass};

fn clean_name(re: &Regex, name: &str) -> String {
    re.replace_all(&name.to_lowercase(), "_")
        .trim_matches('_')
        .to_string()
}

/// Lowercases column names and replaces runs of non-alphanumeric characters by `_`
///
/// `Vehicle_ID` becomes `vehicle_id` and `Space Headway (ft)` becomes `space_headway_ft`.
pub fn clean_names(mut df: DataFrame) -> Result<DataFrame> {
    let re = Regex::new(r"[^a-z0-9]+")?;
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| clean_name(&re, name.as_str()))
        .collect();
    df.set_column_names(names)?;
    Ok(df)
}

fn required_i64(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let column = df
        .column(name)
        .map_err(|_| Error::MissingColumn(name.to_string()))?
        .cast(&DataType::Int64)?;
    column
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| Error::NullValue {
                column: name.to_string(),
                row,
            })
        })
        .collect()
}
fn required_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| Error::MissingColumn(name.to_string()))?
        .cast(&DataType::Float64)?;
    column
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| Error::NullValue {
                column: name.to_string(),
                row,
            })
        })
        .collect()
}
fn optional_i64(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    match df.column(name) {
        Ok(column) => Ok(column.cast(&DataType::Int64)?.i64()?.into_iter().collect()),
        Err(_) => Ok(vec![None; df.height()]),
    }
}
fn optional_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    match df.column(name) {
        Ok(column) => Ok(column.cast(&DataType::Float64)?.f64()?.into_iter().collect()),
        Err(_) => Ok(vec![None; df.height()]),
    }
}

/// Reads the observations of a dataframe
///
/// Columns that are not listed in `columns` are ignored, such as
/// `total_frames`, `global_x` or `following`.
pub fn observations_from_frame(df: &DataFrame, columns: &ColumnNames) -> Result<Vec<Observation>> {
    let vehicle_id = required_i64(df, &columns.vehicle_id)?;
    let frame_id = required_i64(df, &columns.frame_id)?;
    let lane_id = optional_i64(df, &columns.lane_id)?;
    let preceding_id = required_i64(df, &columns.preceding_id)?;
    let local_x = required_f64(df, &columns.local_x)?;
    let local_y = required_f64(df, &columns.local_y)?;
    let length = required_f64(df, &columns.length)?;
    let width = required_f64(df, &columns.width)?;
    let class = required_i64(df, &columns.class)?;
    let velocity = required_f64(df, &columns.velocity)?;
    let acceleration = required_f64(df, &columns.acceleration)?;
    let space_headway = optional_f64(df, &columns.space_headway)?;
    let time_headway = optional_f64(df, &columns.time_headway)?;
    let global_time = required_i64(df, &columns.global_time)?;
    (0..df.height())
        .map(|i| {
            Ok(Observation {
                vehicle_id: vehicle_id[i],
                frame_id: frame_id[i],
                lane_id: lane_id[i],
                preceding_id: preceding_id[i],
                local_x: local_x[i],
                local_y: local_y[i],
                length: length[i],
                width: width[i],
                class: VehicleClass::try_from(class[i])?,
                velocity: velocity[i],
                acceleration: acceleration[i],
                space_headway: space_headway[i],
                time_headway: time_headway[i],
                global_time: global_time[i],
            })
        })
        .collect()
}

fn categorical(name: &str, labels: Vec<Option<String>>) -> Result<Column> {
    Ok(Column::new(name.into(), labels).cast(&DataType::Categorical(
        None,
        CategoricalOrdering::Physical,
    ))?)
}

impl TrajectoryTable {
    /// Exports the table with identifiers and vehicle classes as categorical columns
    pub fn to_frame(&self) -> Result<DataFrame> {
        let records = self.records();
        let obs_f64 = |name: &str, f: fn(&Observation) -> f64| {
            Column::new(
                name.into(),
                records.iter().map(|r| f(&r.observation)).collect::<Vec<f64>>(),
            )
        };
        let record_f64 = |name: &str, f: fn(&Record) -> Option<f64>| {
            Column::new(
                name.into(),
                records.iter().map(f).collect::<Vec<Option<f64>>>(),
            )
        };
        let label = |id: i64| Some(id.to_string());
        let actual_time: Vec<Option<i64>> = records
            .iter()
            .map(|r| {
                r.actual_time
                    .map(|t| t.naive_local().and_utc().timestamp_millis())
            })
            .collect();
        let columns = vec![
            categorical(
                "vehicle_id",
                records.iter().map(|r| label(r.observation.vehicle_id)).collect(),
            )?,
            Column::new(
                "frame_id".into(),
                records
                    .iter()
                    .map(|r| r.observation.frame_id)
                    .collect::<Vec<i64>>(),
            ),
            categorical(
                "lane_id",
                records
                    .iter()
                    .map(|r| r.observation.lane_id.and_then(label))
                    .collect(),
            )?,
            categorical(
                "preceding_id",
                records
                    .iter()
                    .map(|r| label(r.observation.preceding_id))
                    .collect(),
            )?,
            obs_f64("local_x", |o| o.local_x),
            obs_f64("local_y", |o| o.local_y),
            obs_f64("length", |o| o.length),
            obs_f64("width", |o| o.width),
            categorical(
                "class",
                records
                    .iter()
                    .map(|r| Some(r.observation.class.to_string()))
                    .collect(),
            )?,
            obs_f64("velocity", |o| o.velocity),
            obs_f64("acceleration", |o| o.acceleration),
            Column::new(
                "space_headway".into(),
                records
                    .iter()
                    .map(|r| r.observation.space_headway)
                    .collect::<Vec<Option<f64>>>(),
            ),
            Column::new(
                "time_headway".into(),
                records
                    .iter()
                    .map(|r| r.observation.time_headway)
                    .collect::<Vec<Option<f64>>>(),
            ),
            Column::new(
                "global_time".into(),
                records
                    .iter()
                    .map(|r| r.observation.global_time)
                    .collect::<Vec<i64>>(),
            ),
            Column::new("actual_time".into(), actual_time)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
            record_f64("time", |r| r.time()),
            record_f64("preceding_local_x", |r| {
                r.preceding.as_ref().and_then(|p| p.local_x)
            }),
            record_f64("preceding_local_y", |r| {
                r.preceding.as_ref().map(|p| p.local_y)
            }),
            record_f64("preceding_length", |r| {
                r.preceding.as_ref().map(|p| p.length)
            }),
            record_f64("preceding_width", |r| r.preceding.as_ref().map(|p| p.width)),
            categorical(
                "preceding_class",
                records
                    .iter()
                    .map(|r| r.preceding.as_ref().map(|p| p.class.to_string()))
                    .collect(),
            )?,
            record_f64("preceding_velocity", |r| r.preceding_velocity()),
            record_f64("preceding_acceleration", |r| {
                r.preceding.as_ref().map(|p| p.acceleration)
            }),
        ];
        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ngsim_frame() -> DataFrame {
        df!(
            "Vehicle_ID" => [1i64, 1, 2, 2],
            "Frame_ID" => [10i64, 11, 10, 11],
            "Total_Frames" => [2i64, 2, 2, 2],
            "Global_Time" => [1_113_433_136_100i64, 1_113_433_136_200, 1_113_433_136_100, 1_113_433_136_200],
            "Local_X" => [6.0, 6.1, 18.0, 18.2],
            "Local_Y" => [100.0, 104.0, 60.0, 63.0],
            "v_Length" => [15.0, 15.0, 40.0, 40.0],
            "v_Width" => [6.0, 6.0, 8.5, 8.5],
            "v_Class" => [2i64, 2, 3, 3],
            "v_Vel" => [40.0, 40.0, 30.0, 30.0],
            "v_Acc" => [0.0, 0.0, 1.0, 1.0],
            "Lane_ID" => [1i64, 1, 1, 1],
            "Preceding" => [0i64, 0, 1, 1],
            "Space_Headway" => [0.0, 0.0, 40.0, 41.0],
            "Time_Headway" => [0.0, 0.0, 1.4, 1.5]
        )
        .unwrap()
    }

    #[test]
    fn janitor_style_names() {
        let re = Regex::new(r"[^a-z0-9]+").unwrap();
        assert_eq!(clean_name(&re, "Vehicle_ID"), "vehicle_id");
        assert_eq!(clean_name(&re, "Space Headway (ft)"), "space_headway_ft");
        let df = clean_names(ngsim_frame()).unwrap();
        assert!(df.column("v_vel").is_ok());
        assert!(df.column("preceding").is_ok());
    }

    #[test]
    fn reads_observations() {
        let df = clean_names(ngsim_frame()).unwrap();
        let observations = observations_from_frame(&df, &ColumnNames::default()).unwrap();
        assert_eq!(observations.len(), 4);
        assert_eq!(observations[2].class, VehicleClass::Truck);
        assert_eq!(observations[2].preceding(), Some(1));
        assert_eq!(observations[3].space_headway, Some(41.0));
        assert_eq!(observations[3].time_headway, Some(1.5));
    }

    #[test]
    fn missing_column() {
        let df = clean_names(ngsim_frame()).unwrap().drop("v_vel").unwrap();
        assert!(matches!(
            observations_from_frame(&df, &ColumnNames::default()),
            Err(Error::MissingColumn(name)) if name == "v_vel"
        ));
    }

    #[test]
    fn null_in_required_column() {
        let df = df!(
            "Vehicle_ID" => [Some(1i64), None],
            "Frame_ID" => [10i64, 10]
        )
        .unwrap();
        let df = clean_names(df).unwrap();
        assert!(matches!(
            observations_from_frame(&df, &ColumnNames::default()),
            Err(Error::NullValue { column, row: 1 }) if column == "vehicle_id"
        ));
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let df = clean_names(ngsim_frame())
            .unwrap()
            .drop("lane_id")
            .unwrap()
            .drop("space_headway")
            .unwrap();
        let observations = observations_from_frame(&df, &ColumnNames::default()).unwrap();
        assert!(observations.iter().all(|o| o.lane_id.is_none()));
    }

    #[test]
    fn exports_nulls_for_missing_predecessors() {
        let df = clean_names(ngsim_frame()).unwrap();
        let observations = observations_from_frame(&df, &ColumnNames::default()).unwrap();
        let mut table = TrajectoryTable::new(observations).unwrap();
        table.normalize_time(10.0).join_preceding(false).unwrap();
        let out = table.to_frame().unwrap();
        assert_eq!(out.height(), 4);
        let velocity = out.column("preceding_velocity").unwrap().f64().unwrap();
        assert_eq!(velocity.null_count(), 2);
        assert_eq!(velocity.get(2), Some(40.0));
        assert_eq!(out.column("preceding_local_x").unwrap().null_count(), 4);
        let time_headway = out.column("time_headway").unwrap().f64().unwrap();
        assert_eq!(time_headway.get(3), Some(1.5));
        assert!(matches!(
            out.column("class").unwrap().dtype(),
            DataType::Categorical(_, _)
        ));
    }
}
