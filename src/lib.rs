#![doc = include_str!("../README.md")]

extern crate gnss_rs as gnss;

pub mod dataset;
pub mod header;
pub mod observation;

mod epoch;
mod error;
mod gnss_time;
mod loader;
mod observable;
mod reader;
mod version;

pub use crate::{
    dataset::{DataArray, Dataset},
    epoch::EpochFlag,
    error::Error,
    gnss_time::TimeSystem,
    header::Header,
    loader::Selection,
    observable::Observable,
    reader::BufferedReader,
    version::Version,
};

pub mod prelude {
    pub use crate::{
        dataset::{DataArray, Dataset},
        epoch::EpochFlag,
        error::Error,
        gnss_time::TimeSystem,
        header::Header,
        loader::Selection,
        observable::Observable,
        observation::{LliFlags, SignalObservation, SNR},
        version::Version,
    };
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
}

use hifitime::Epoch;
use std::path::Path;

/// Loads an Observation RINEX into a [Dataset]: every system,
/// every measurement, whole time span. The file may be plain,
/// gzip compressed or a zip archive. `Ok(None)` for a file
/// carrying zero observation epochs.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Dataset>, Error> {
    load_with(path, &Selection::all())
}

/// Loads an Observation RINEX restricted by given [Selection].
pub fn load_with<P: AsRef<Path>>(path: P, selection: &Selection) -> Result<Option<Dataset>, Error> {
    let mut reader = BufferedReader::open(path)?;
    let (header, line_no) = Header::parse(&mut reader)?;
    loader::parse_dataset(&mut reader, &header, selection, line_no)
}

/// Returns the observation timestamps of given file, in file
/// order, without decoding any satellite line. `Ok(None)` for a
/// header only file.
pub fn get_times<P: AsRef<Path>>(path: P) -> Result<Option<Vec<Epoch>>, Error> {
    let mut reader = BufferedReader::open(path)?;
    let (header, line_no) = Header::parse(&mut reader)?;
    loader::scan_times(&mut reader, &header, line_no)
}

/// Parses the [Header] of given file, never touching the record
/// section.
pub fn get_header<P: AsRef<Path>>(path: P) -> Result<Header, Error> {
    let mut reader = BufferedReader::open(path)?;
    let (header, _) = Header::parse(&mut reader)?;
    Ok(header)
}
