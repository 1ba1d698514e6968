use strum_macros::{Display, EnumIter, EnumString};

use crate::Error;

/// NGSIM vehicle type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum VehicleClass {
    Motorcycle,
    Auto,
    Truck,
}
impl VehicleClass {
    /// NGSIM `v_class` code
    pub fn code(&self) -> i64 {
        match self {
            VehicleClass::Motorcycle => 1,
            VehicleClass::Auto => 2,
            VehicleClass::Truck => 3,
        }
    }
}
impl TryFrom<i64> for VehicleClass {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(VehicleClass::Motorcycle),
            2 => Ok(VehicleClass::Auto),
            3 => Ok(VehicleClass::Truck),
            _ => Err(Error::UnknownVehicleClass(code)),
        }
    }
}

/// One vehicle at one time frame
///
/// Positions and footprints are in feet, velocity in feet per second and
/// acceleration in feet per second squared until the table is converted
/// with [UnitConversion](crate::UnitConversion).
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub vehicle_id: i64,
    pub frame_id: i64,
    pub lane_id: Option<i64>,
    /// Vehicle ahead in the same lane, 0 if there is none
    pub preceding_id: i64,
    pub local_x: f64,
    pub local_y: f64,
    pub length: f64,
    pub width: f64,
    pub class: VehicleClass,
    pub velocity: f64,
    pub acceleration: f64,
    pub space_headway: Option<f64>,
    /// Seconds, left unchanged by unit conversion
    pub time_headway: Option<f64>,
    /// Milliseconds since the Unix epoch
    pub global_time: i64,
}
impl Observation {
    /// Creates an observation with zeroed kinematics and no preceding vehicle
    pub fn new(vehicle_id: i64, frame_id: i64) -> Self {
        Self {
            vehicle_id,
            frame_id,
            lane_id: None,
            preceding_id: 0,
            local_x: 0f64,
            local_y: 0f64,
            length: 0f64,
            width: 0f64,
            class: VehicleClass::Auto,
            velocity: 0f64,
            acceleration: 0f64,
            space_headway: None,
            time_headway: None,
            global_time: 0,
        }
    }
    pub fn preceding_id(self, preceding_id: i64) -> Self {
        Self {
            preceding_id,
            ..self
        }
    }
    pub fn velocity(self, velocity: f64) -> Self {
        Self { velocity, ..self }
    }
    pub fn local_y(self, local_y: f64) -> Self {
        Self { local_y, ..self }
    }
    /// The (vehicle, frame) pair identifying the row
    pub fn key(&self) -> (i64, i64) {
        (self.vehicle_id, self.frame_id)
    }
    /// The preceding vehicle identifier, `None` for the 0 sentinel
    pub fn preceding(&self) -> Option<i64> {
        match self.preceding_id {
            0 => None,
            id => Some(id),
        }
    }
}
