//! # NGSIM trajectories
//!
//! Normalization of vehicle trajectory tables such as the NGSIM I-80 data set:
//!  - per-vehicle elapsed time, sampled at 10Hz by default,
//!  - attributes of the preceding vehicle at the same time frame,
//!  - conversion of lengths, velocities and accelerations from feet to meters.
//!
//! ```
//! use ngsim_trajectories::{Observation, TrajectoryNormalizer};
//!
//! let observations = vec![
//!     Observation::new(1, 10).velocity(40.0),
//!     Observation::new(2, 10).preceding_id(1),
//! ];
//! let table = TrajectoryNormalizer::default().normalize(observations).unwrap();
//! let follower = table.vehicle(2).unwrap();
//! assert_eq!(follower.records()[0].preceding_velocity(), Some(12.19));
//! ```

mod config;
mod error;
#[cfg(feature = "frame")]
pub mod frame;
mod observation;
mod pipeline;
mod table;

pub use config::{ColumnNames, NormalizerConfig, UnitConversion};
pub use error::{Error, Result};
pub use observation::{Observation, VehicleClass};
pub use pipeline::TrajectoryNormalizer;
pub use table::{Elapsed, PrecedingVehicle, Record, Trajectory, TrajectoryTable};
