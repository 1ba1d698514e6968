use std::collections::{hash_map::Entry, HashMap, HashSet};

use chrono::{DateTime, FixedOffset};
use itertools::Itertools;
use rayon::prelude::*;

use crate::{Error, Observation, Result, UnitConversion, VehicleClass};

/// Position of a record within its trajectory
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Elapsed {
    /// Number of frames since the first observation of the vehicle
    pub step: u32,
    /// Elapsed time [s]
    ///
    /// Multiples of the sampling period are not exact in floating point,
    /// compare `step` when exact equality matters.
    pub time: f64,
}

/// Attributes of the vehicle ahead at the same frame
#[derive(Debug, Clone, PartialEq)]
pub struct PrecedingVehicle {
    pub local_x: Option<f64>,
    pub local_y: f64,
    pub length: f64,
    pub width: f64,
    pub class: VehicleClass,
    pub velocity: f64,
    pub acceleration: f64,
}
impl PrecedingVehicle {
    fn from_observation(obs: &Observation, with_local_x: bool) -> Self {
        Self {
            local_x: with_local_x.then_some(obs.local_x),
            local_y: obs.local_y,
            length: obs.length,
            width: obs.width,
            class: obs.class,
            velocity: obs.velocity,
            acceleration: obs.acceleration,
        }
    }
}

/// An observation with its derived columns
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub observation: Observation,
    pub elapsed: Option<Elapsed>,
    pub actual_time: Option<DateTime<FixedOffset>>,
    pub preceding: Option<PrecedingVehicle>,
}
impl From<Observation> for Record {
    fn from(observation: Observation) -> Self {
        Self {
            observation,
            elapsed: None,
            actual_time: None,
            preceding: None,
        }
    }
}
impl Record {
    pub fn time(&self) -> Option<f64> {
        self.elapsed.map(|e| e.time)
    }
    pub fn preceding_velocity(&self) -> Option<f64> {
        self.preceding.as_ref().map(|p| p.velocity)
    }
}

/// The records of one vehicle in frame order
#[derive(Debug, Clone, Copy)]
pub struct Trajectory<'a>(&'a [Record]);
impl<'a> Trajectory<'a> {
    pub fn vehicle_id(&self) -> i64 {
        self.0[0].observation.vehicle_id
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn records(&self) -> &'a [Record] {
        self.0
    }
    /// Elapsed time of the last record, if time has been normalized
    pub fn duration(&self) -> Option<f64> {
        self.0.last().and_then(|r| r.time())
    }
}

/// Observations table with unique (vehicle, frame) keys
#[derive(Debug, Clone, Default)]
pub struct TrajectoryTable {
    records: Vec<Record>,
}
impl TrajectoryTable {
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        let mut keys = HashSet::with_capacity(observations.len());
        for obs in &observations {
            if !keys.insert(obs.key()) {
                return Err(Error::DuplicateObservation {
                    vehicle_id: obs.vehicle_id,
                    frame_id: obs.frame_id,
                });
            }
        }
        Ok(Self {
            records: observations.into_iter().map(Record::from).collect(),
        })
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    pub fn records(&self) -> &[Record] {
        &self.records
    }
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
    /// Sorts the records by vehicle then frame
    pub fn sort_canonical(&mut self) {
        self.records.par_sort_unstable_by_key(|r| r.observation.key());
    }
    /// Iterates over contiguous runs of records of the same vehicle
    ///
    /// Runs are whole trajectories only once the table is in canonical order.
    pub fn trajectories(&self) -> impl Iterator<Item = Trajectory<'_>> {
        self.records
            .chunk_by(|a, b| a.observation.vehicle_id == b.observation.vehicle_id)
            .map(Trajectory)
    }
    /// Returns the trajectory of a given vehicle
    pub fn vehicle(&self, vehicle_id: i64) -> Option<Trajectory<'_>> {
        self.trajectories().find(|t| t.vehicle_id() == vehicle_id)
    }
    /// Sets the elapsed time of each record since the first observation of its vehicle
    pub fn normalize_time(&mut self, samples_per_second: f64) -> &mut Self {
        self.sort_canonical();
        let trajectories: Vec<&mut [Record]> = self
            .records
            .chunk_by_mut(|a, b| a.observation.vehicle_id == b.observation.vehicle_id)
            .collect();
        log::debug!("normalizing time of {} trajectories", trajectories.len());
        trajectories.into_par_iter().for_each(|trajectory| {
            for (i, record) in trajectory.iter_mut().enumerate() {
                record.elapsed = Some(Elapsed {
                    step: i as u32,
                    time: i as f64 / samples_per_second,
                });
            }
        });
        self
    }
    /// Sets the local date and time of each record from its `global_time`
    pub fn localize_time(&mut self, offset: FixedOffset) -> Result<&mut Self> {
        for record in self.records.iter_mut() {
            let ms = record.observation.global_time;
            let utc = DateTime::from_timestamp_millis(ms).ok_or(Error::InvalidTimestamp(ms))?;
            record.actual_time = Some(utc.with_timezone(&offset));
        }
        Ok(self)
    }
    /// Attaches to each record the attributes of its preceding vehicle at the same frame
    ///
    /// Records without a preceding vehicle, or whose preceding vehicle is not
    /// observed at that frame, get `None`.
    pub fn join_preceding(&mut self, with_local_x: bool) -> Result<&mut Self> {
        let n_record = self.records.len();
        let mut lookup: HashMap<(i64, i64), PrecedingVehicle> = HashMap::with_capacity(n_record);
        for Record { observation, .. } in &self.records {
            match lookup.entry((observation.frame_id, observation.vehicle_id)) {
                // unreachable while `new` keeps (vehicle, frame) keys unique
                Entry::Occupied(_) => {
                    return Err(Error::AmbiguousPrecedingMatch {
                        vehicle_id: observation.vehicle_id,
                        frame_id: observation.frame_id,
                    })
                }
                Entry::Vacant(entry) => {
                    entry.insert(PrecedingVehicle::from_observation(observation, with_local_x));
                }
            }
        }
        let mut unresolved = 0usize;
        for record in self.records.iter_mut() {
            let obs = &record.observation;
            record.preceding = obs
                .preceding()
                .and_then(|id| lookup.get(&(obs.frame_id, id)).cloned());
            if obs.preceding().is_some() && record.preceding.is_none() {
                unresolved += 1;
            }
        }
        if unresolved > 0 {
            log::warn!("{unresolved} preceding vehicles are not observed at their frame");
        }
        self.sort_canonical();
        // holds as long as the join only fills `preceding` in place
        if self.records.len() != n_record {
            return Err(Error::RowCountMismatch {
                expected: n_record,
                actual: self.records.len(),
            });
        }
        Ok(self)
    }
    /// Scales lengths, velocities and accelerations
    ///
    /// Applying it twice scales twice: the table does not track its units.
    pub fn convert_units(&mut self, conversion: &UnitConversion) -> &mut Self {
        let c = conversion;
        self.records.par_iter_mut().for_each(|record| {
            let obs = &mut record.observation;
            obs.local_x = c.apply(obs.local_x);
            obs.local_y = c.apply(obs.local_y);
            obs.length = c.apply(obs.length);
            obs.width = c.apply(obs.width);
            obs.velocity = c.apply(obs.velocity);
            obs.acceleration = c.apply(obs.acceleration);
            obs.space_headway = c.apply_opt(obs.space_headway);
            if let Some(p) = record.preceding.as_mut() {
                p.local_x = c.apply_opt(p.local_x);
                p.local_y = c.apply(p.local_y);
                p.length = c.apply(p.length);
                p.width = c.apply(p.width);
                p.velocity = c.apply(p.velocity);
                p.acceleration = c.apply(p.acceleration);
            }
        });
        self
    }
    pub fn summary(&self) {
        println!("SUMMARY:");
        println!(" - # of records: {}", self.len());
        println!(" - # of vehicles: {}", self.trajectories().count());
        if let Some((first, last)) = self
            .records
            .iter()
            .map(|r| r.observation.frame_id)
            .minmax()
            .into_option()
        {
            println!(" - frame range: [{first}-{last}]");
        }
        let n_preceding = self.records.iter().filter(|r| r.preceding.is_some()).count();
        println!(" - # of records with a preceding vehicle: {n_preceding}");
        println!(" - vehicle classes:");
        self.trajectories()
            .map(|t| t.records()[0].observation.class)
            .counts()
            .into_iter()
            .sorted()
            .for_each(|(class, n)| println!("  - {:12}: {:>6}", class.to_string(), n));
    }
}
