//! Load pipeline: selection resolution, epoch scanning, assembly
use crate::{
    dataset::{Dataset, DatasetBuilder},
    epoch::{is_new_epoch, parse_epoch_line},
    error::Error,
    gnss_time::TimeSystem,
    header::Header,
    observation::{decode_signal_line, parse_sv, SignalObservation},
};

use gnss::prelude::{Constellation, SV};
use hifitime::Epoch;
use std::{
    collections::{BTreeSet, HashMap, HashSet},
    io::BufRead,
    str::FromStr,
};

use itertools::Itertools;
use log::{debug, warn};

/// Selection restricts what gets decoded and assembled.
/// The default selects every system and measurement, the whole
/// time span, no indicators, strict decoding.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Satellite systems to retain, by constellation letter
    /// ("G", "R", ..). None selects all. A letter that is not a
    /// constellation, or absent from the file header, raises
    /// [Error::UnknownSystem] before any decoding work.
    pub systems: Option<Vec<String>>,
    /// Measurement codes to retain: exact 3 character codes
    /// ("C1C") or shorter prefix wildcards ("C" grabs every
    /// pseudo range family code, across all systems).
    /// None selects all. A filter matching nothing yields a
    /// dataset with zero measurement arrays, not an error.
    pub measurements: Option<Vec<String>>,
    /// Inclusive [start, end] epoch restriction. Out of window
    /// epochs are skipped without decoding their satellite lines.
    pub time_window: Option<(Epoch, Epoch)>,
    /// Also assemble `-lli` / `-ssi` indicator arrays
    pub with_indicators: bool,
    /// Downgrade unparseable non blank value fields to missing
    /// instead of failing the whole parse
    pub permissive: bool,
}

impl Selection {
    /// Everything: all systems, all codes, whole time span
    pub fn all() -> Self {
        Self::default()
    }

    /// Retain a single satellite system
    pub fn with_system(mut self, letter: &str) -> Self {
        self.systems
            .get_or_insert_with(Vec::new)
            .push(letter.to_string());
        self
    }

    /// Retain several satellite systems
    pub fn with_systems(mut self, letters: &[&str]) -> Self {
        let list = self.systems.get_or_insert_with(Vec::new);
        for letter in letters {
            list.push(letter.to_string());
        }
        self
    }

    /// Retain a single measurement code or wildcard
    pub fn with_measurement(mut self, code: &str) -> Self {
        self.measurements
            .get_or_insert_with(Vec::new)
            .push(code.to_string());
        self
    }

    /// Retain several measurement codes or wildcards
    pub fn with_measurements(mut self, codes: &[&str]) -> Self {
        let list = self.measurements.get_or_insert_with(Vec::new);
        for code in codes {
            list.push(code.to_string());
        }
        self
    }

    /// Restrict to inclusive [start, end]
    pub fn with_time_window(mut self, start: Epoch, end: Epoch) -> Self {
        self.time_window = Some((start, end));
        self
    }

    /// Also decode loss of lock and signal strength digits
    pub fn with_indicators(mut self) -> Self {
        self.with_indicators = true;
        self
    }

    /// Tolerate unparseable value fields
    pub fn permissive(mut self) -> Self {
        self.permissive = true;
        self
    }

    fn contains_epoch(&self, epoch: Epoch) -> bool {
        match self.time_window {
            Some((start, end)) => epoch >= start && epoch <= end,
            None => true,
        }
    }
}

/// Validates the system filter against the header: every letter
/// must name a constellation this file actually carries.
fn resolve_systems(
    header: &Header,
    selection: &Selection,
) -> Result<Option<HashSet<Constellation>>, Error> {
    let Some(requested) = &selection.systems else {
        return Ok(None);
    };
    let mut resolved = HashSet::with_capacity(requested.len());
    for letter in requested {
        let constell = Constellation::from_str(letter)
            .map_err(|_| Error::UnknownSystem(letter.to_string()))?;
        if !header.codes.contains_key(&constell) {
            return Err(Error::UnknownSystem(letter.to_string()));
        }
        resolved.insert(constell);
    }
    Ok(Some(resolved))
}

/// Intersects the measurement filter with each system's code
/// list: per system boolean masks over the column layout, plus
/// the deduplicated union of retained code names.
fn resolve_measurements(
    header: &Header,
    selection: &Selection,
) -> (HashMap<Constellation, Vec<bool>>, BTreeSet<String>) {
    let mut masks = HashMap::with_capacity(header.codes.len());
    let mut retained = BTreeSet::new();
    for (constell, observables) in &header.codes {
        let mask: Vec<bool> = observables
            .iter()
            .map(|observable| match &selection.measurements {
                Some(filters) => filters.iter().any(|f| observable.matches(f)),
                None => true,
            })
            .collect();
        for (observable, wanted) in observables.iter().zip(mask.iter()) {
            if *wanted {
                retained.insert(observable.code().to_string());
            }
        }
        masks.insert(*constell, mask);
    }
    (masks, retained)
}

/// Header lookups key SBAS vehicles on the generic SBAS entry
fn system_key(sv: SV) -> Constellation {
    if sv.constellation.is_sbas() {
        Constellation::SBAS
    } else {
        sv.constellation
    }
}

/// Time system determination when the header declares none:
/// dominant constellation among observed vehicles, GPS leaning
/// tie break. SBAS vehicles do not vote. An empty ballot
/// (header only file would not reach this, but an all SBAS
/// recording does) yields [TimeSystem::Unknown].
fn infer_time_system(observed: &[SV]) -> TimeSystem {
    let mut ballot: HashMap<Constellation, usize> = HashMap::new();
    for sv in observed {
        if sv.constellation.is_sbas() {
            continue;
        }
        *ballot.entry(sv.constellation).or_default() += 1;
    }
    let Some(max) = ballot.values().copied().max() else {
        return TimeSystem::Unknown;
    };
    if ballot.get(&Constellation::GPS) == Some(&max) {
        return TimeSystem::GPS;
    }
    let dominant = ballot
        .iter()
        .filter(|(_, count)| **count == max)
        .map(|(constell, _)| *constell)
        .sorted_by_key(|constell| format!("{:x}", constell))
        .next();
    match dominant {
        Some(constell) => TimeSystem::from_constellation(constell),
        None => TimeSystem::Unknown,
    }
}

fn skip_records<R: BufRead>(
    reader: &mut R,
    line: &mut String,
    line_no: &mut usize,
    count: u16,
) -> Result<(), Error> {
    for _ in 0..count {
        line.clear();
        if reader.read_line(line)? == 0 {
            break;
        }
        *line_no += 1;
    }
    Ok(())
}

/// Parses the record section following an already parsed header,
/// assembling the [Dataset]. `Ok(None)` when the file carries
/// zero observation epochs.
pub(crate) fn parse_dataset<R: BufRead>(
    reader: &mut R,
    header: &Header,
    selection: &Selection,
    mut line_no: usize,
) -> Result<Option<Dataset>, Error> {
    let systems = resolve_systems(header, selection)?;
    let (masks, retained) = resolve_measurements(header, selection);

    let mut builder = DatasetBuilder::default();
    for name in &retained {
        builder.declare_var(name);
    }

    let ts = header.timescale();
    let mut line = String::with_capacity(128);
    let mut signals = Vec::<SignalObservation>::with_capacity(64);

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        line_no += 1;

        let content = line.trim_end();
        if content.trim().is_empty() {
            continue;
        }
        if !is_new_epoch(content) {
            warn!("line {}: not synchronized on an epoch, skipped", line_no);
            continue;
        }

        let record = parse_epoch_line(content, ts).map_err(|e| e.at_line(line_no))?;

        if !record.flag.carries_observations() {
            // event payload: consumed so the cursor stays valid,
            // embedded header updates are not interpreted
            debug!("line {}: event {} skipped", line_no, record.flag);
            skip_records(reader, &mut line, &mut line_no, record.num_records)?;
            continue;
        }

        if !selection.contains_epoch(record.epoch) {
            skip_records(reader, &mut line, &mut line_no, record.num_records)?;
            continue;
        }

        let Some(t) = builder.push_epoch(record.epoch) else {
            skip_records(reader, &mut line, &mut line_no, record.num_records)?;
            continue;
        };

        for _ in 0..record.num_records {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            line_no += 1;

            let sat_line = line.trim_end();
            if sat_line.trim().is_empty() {
                continue;
            }

            let sv = parse_sv(sat_line).map_err(|e| e.at_line(line_no))?;

            // system filter applies before any field decoding
            if let Some(set) = &systems {
                if !set.contains(&system_key(sv)) {
                    continue;
                }
            }

            let Some(observables) = header.codes.get(&system_key(sv)) else {
                warn!("line {}: {} has no declared observable layout", line_no, sv);
                continue;
            };
            let mask = &masks[&system_key(sv)];

            // tracked at this epoch, even if nothing decodes
            let s = builder.intern_sv(sv);

            signals.clear();
            decode_signal_line(
                sat_line,
                sv,
                observables,
                mask,
                selection.with_indicators,
                selection.permissive,
                &mut signals,
            )
            .map_err(|e| e.at_line(line_no))?;

            for signal in &signals {
                let code = signal.observable.code();
                if !signal.value.is_nan() {
                    if let Some(var) = builder.var_id(code) {
                        builder.push_cell(t, s, var, signal.value);
                    }
                }
                if let Some(lli) = signal.lli {
                    let var = builder.declare_var(&format!("{}-lli", code));
                    builder.push_cell(t, s, var, lli.bits() as f64);
                }
                if let Some(snr) = signal.snr {
                    let var = builder.declare_var(&format!("{}-ssi", code));
                    builder.push_cell(t, s, var, snr.digit() as f64);
                }
            }
        }
    }

    if builder.num_epochs() == 0 {
        return Ok(None);
    }

    let time_system = match header.time_system {
        Some(declared) => declared,
        None => infer_time_system(builder.observed_sv()),
    };

    Ok(Some(builder.build(
        time_system,
        header.interval,
        header.rx_position,
    )))
}

/// Scans epoch lines only, without decoding satellite lines.
/// `Ok(None)` for a header only file.
pub(crate) fn scan_times<R: BufRead>(
    reader: &mut R,
    header: &Header,
    mut line_no: usize,
) -> Result<Option<Vec<Epoch>>, Error> {
    let ts = header.timescale();
    let mut times = Vec::new();
    let mut line = String::with_capacity(128);

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        line_no += 1;

        let content = line.trim_end();
        if content.trim().is_empty() || !is_new_epoch(content) {
            continue;
        }

        let record = parse_epoch_line(content, ts).map_err(|e| e.at_line(line_no))?;
        if record.flag.carries_observations() {
            // same time axis policy as assembly: duplicates fold,
            // backwards timestamps are dropped
            match times.last() {
                Some(last) if *last == record.epoch => {},
                Some(last) if *last > record.epoch => {
                    warn!("out of order epoch {} dropped", record.epoch);
                },
                _ => times.push(record.epoch),
            }
        }
        skip_records(reader, &mut line, &mut line_no, record.num_records)?;
    }

    if times.is_empty() {
        Ok(None)
    } else {
        Ok(Some(times))
    }
}
