//! Observation RINEX header
use crate::{gnss_time::TimeSystem, observable::Observable, version::Version};
use gnss::prelude::Constellation;
use hifitime::{Duration, Epoch, TimeScale};
use std::collections::HashMap;

mod parsing;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Header describes everything the record decoding stages need:
/// per system observable layout, declared timescale, sampling
/// characteristics. Immutable once parsed.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Header {
    /// RINEX revision
    pub version: Version,
    /// Constellation(s) declared by this file, `Mixed` for
    /// multi GNSS recordings
    pub constellation: Option<Constellation>,
    /// Production software
    pub program: Option<String>,
    /// Production agency / operator
    pub run_by: Option<String>,
    /// Geodetic marker name
    pub marker_name: Option<String>,
    /// Observables on a per system basis, in file column order.
    /// This ordered list is the column layout of every satellite
    /// line of that system.
    pub codes: HashMap<Constellation, Vec<Observable>>,
    /// Approximate receiver position, ECEF [m]
    pub rx_position: Option<(f64, f64, f64)>,
    /// Leap seconds counter
    pub leap_seconds: Option<u32>,
    /// Time system declared by TIME OF FIRST OBS / TIME OF LAST OBS
    pub time_system: Option<TimeSystem>,
    /// Epoch of first observation
    pub timeof_first_obs: Option<Epoch>,
    /// Epoch of last observation
    pub timeof_last_obs: Option<Epoch>,
    /// Nominal sampling interval
    pub interval: Option<Duration>,
}

impl Header {
    /// [TimeScale] in which following epochs are expressed.
    /// GPST when the header declares nothing, which is the
    /// dominant convention.
    pub fn timescale(&self) -> TimeScale {
        match self.time_system {
            Some(ts) => ts.timescale(),
            None => TimeScale::GPST,
        }
    }

    /// Total number of observables, all systems
    pub fn num_codes(&self) -> usize {
        self.codes.values().map(|v| v.len()).sum()
    }
}
