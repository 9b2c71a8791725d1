//! Final artifact: the time/satellite/measurement indexed table
use crate::gnss_time::TimeSystem;
use gnss::prelude::SV;
use hifitime::{Duration, Epoch};
use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use log::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dataset is a sparse 3 axis table: time (ordered, unique),
/// satellite (sorted by label), and one named array per selected
/// measurement code. Arrays are row major `time * sv`, missing
/// cells hold NaN. The format does not distinguish "not tracked"
/// from "code not measured": both are NaN.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dataset {
    /// Time axis, strictly increasing, duplicate free
    pub time: Vec<Epoch>,
    /// Satellite axis, sorted by "G07" style label
    pub sv: Vec<SV>,
    /// One array per measurement code, each `time.len() * sv.len()`
    /// long. Indicator companions use the `-lli` / `-ssi` suffix.
    #[cfg_attr(feature = "serde", serde(with = "nan_as_null"))]
    vars: BTreeMap<String, Vec<f64>>,
    /// Time system epochs are expressed in
    pub time_system: TimeSystem,
    /// Nominal sampling interval, when the header declared one
    pub interval: Option<Duration>,
    /// Approximate receiver position, ECEF [m]
    pub position: Option<(f64, f64, f64)>,
}

/// Borrowed view over one measurement array, bound to its axes
#[derive(Debug, Clone, Copy)]
pub struct DataArray<'a> {
    pub name: &'a str,
    pub time: &'a [Epoch],
    pub sv: &'a [SV],
    values: &'a [f64],
}

impl Dataset {
    /// Names of all measurement arrays
    pub fn data_vars(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(|k| k.as_str())
    }

    /// Number of measurement arrays
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    /// True if given measurement array exists
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Access one measurement array by code name
    pub fn var(&self, name: &str) -> Option<DataArray<'_>> {
        let (name, values) = self.vars.get_key_value(name)?;
        Some(DataArray {
            name: name.as_str(),
            time: &self.time,
            sv: &self.sv,
            values,
        })
    }

    /// Iterates all (name, array) pairs
    pub fn iter(&self) -> impl Iterator<Item = DataArray<'_>> {
        self.vars.keys().map(|name| self.var(name).unwrap())
    }

    /// Structural equality with NaN cells considered equal,
    /// the comparison an external persistence layer must survive
    pub fn equals(&self, rhs: &Self) -> bool {
        self.time == rhs.time
            && self.sv == rhs.sv
            && self.time_system == rhs.time_system
            && self.interval == rhs.interval
            && self.position == rhs.position
            && self.vars.len() == rhs.vars.len()
            && self.vars.iter().all(|(name, values)| {
                rhs.vars.get(name).is_some_and(|other| {
                    values.len() == other.len()
                        && values
                            .iter()
                            .zip(other.iter())
                            .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
                })
            })
    }

    pub(crate) fn insert_var(&mut self, name: String, values: Vec<f64>) {
        self.vars.insert(name, values);
    }
}

impl<'a> DataArray<'a> {
    /// Array shape, `(time, sv)`
    pub fn shape(&self) -> (usize, usize) {
        (self.time.len(), self.sv.len())
    }

    /// Cell value by axis indices
    pub fn get(&self, t: usize, s: usize) -> Option<f64> {
        self.values.get(t * self.sv.len() + s).copied()
    }

    /// Full time series of one vehicle, by "G07" style label
    pub fn sv_series(&self, label: &str) -> Option<Vec<f64>> {
        let s = self.sv.iter().position(|sv| sv.to_string() == label)?;
        Some(
            (0..self.time.len())
                .map(|t| self.values[t * self.sv.len() + s])
                .collect(),
        )
    }

    /// True if every cell is missing
    pub fn all_nan(&self) -> bool {
        self.values.iter().all(|v| v.is_nan())
    }

    /// NaN aware comparison against another array
    pub fn equals(&self, rhs: &DataArray) -> bool {
        self.time == rhs.time
            && self.sv == rhs.sv
            && self.values.len() == rhs.values.len()
            && self
                .values
                .iter()
                .zip(rhs.values.iter())
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }
}

/// Missing cells cross serialization boundaries as nulls,
/// self describing formats like JSON cannot carry NaN.
#[cfg(feature = "serde")]
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        vars: &BTreeMap<String, Vec<f64>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mapped: BTreeMap<&str, Vec<Option<f64>>> = vars
            .iter()
            .map(|(name, values)| {
                (
                    name.as_str(),
                    values
                        .iter()
                        .map(|v| if v.is_nan() { None } else { Some(*v) })
                        .collect(),
                )
            })
            .collect();
        mapped.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Vec<f64>>, D::Error> {
        let mapped = BTreeMap::<String, Vec<Option<f64>>>::deserialize(deserializer)?;
        Ok(mapped
            .into_iter()
            .map(|(name, values)| {
                (
                    name,
                    values
                        .into_iter()
                        .map(|v| v.unwrap_or(f64::NAN))
                        .collect(),
                )
            })
            .collect())
    }
}

/// DatasetBuilder is the growing form of [Dataset]: satellites
/// are interned to small indices on first sight, cells accumulate
/// as flat (time, sv, var) triplets, and the dense table is only
/// materialized once the whole record was scanned.
#[derive(Debug, Default)]
pub(crate) struct DatasetBuilder {
    time: Vec<Epoch>,
    sv: Vec<SV>,
    sv_index: HashMap<SV, usize>,
    var_names: Vec<String>,
    var_index: HashMap<String, usize>,
    cells: Vec<(u32, u32, u32, f64)>,
}

impl DatasetBuilder {
    /// Declares one measurement array. All arrays are declared
    /// up front from the header intersection, so a code that is
    /// never observed still materializes (as all NaN).
    pub fn declare_var(&mut self, name: &str) -> usize {
        if let Some(index) = self.var_index.get(name) {
            return *index;
        }
        let index = self.var_names.len();
        self.var_names.push(name.to_string());
        self.var_index.insert(name.to_string(), index);
        index
    }

    pub fn var_id(&self, name: &str) -> Option<usize> {
        self.var_index.get(name).copied()
    }

    /// Opens a new epoch row. Epochs arrive in file order: equal
    /// timestamps fold into the same row, a timestamp going
    /// backwards is dropped with a warning so the time axis
    /// invariant holds.
    pub fn push_epoch(&mut self, epoch: Epoch) -> Option<usize> {
        match self.time.last() {
            Some(last) if *last == epoch => Some(self.time.len() - 1),
            Some(last) if *last > epoch => {
                warn!("out of order epoch {} dropped", epoch);
                None
            },
            _ => {
                self.time.push(epoch);
                Some(self.time.len() - 1)
            },
        }
    }

    pub fn intern_sv(&mut self, sv: SV) -> usize {
        if let Some(index) = self.sv_index.get(&sv) {
            return *index;
        }
        let index = self.sv.len();
        self.sv.push(sv);
        self.sv_index.insert(sv, index);
        index
    }

    pub fn push_cell(&mut self, t: usize, sv: usize, var: usize, value: f64) {
        self.cells.push((t as u32, sv as u32, var as u32, value));
    }

    pub fn num_epochs(&self) -> usize {
        self.time.len()
    }

    pub fn observed_sv(&self) -> &[SV] {
        &self.sv
    }

    /// Materializes the dense table: satellite axis sorted by
    /// label, every array backfilled with NaN.
    pub fn build(
        self,
        time_system: TimeSystem,
        interval: Option<Duration>,
        position: Option<(f64, f64, f64)>,
    ) -> Dataset {
        let num_time = self.time.len();
        let num_sv = self.sv.len();

        // sorted satellite axis, remapping interned indices
        let order: Vec<usize> = (0..num_sv)
            .sorted_by_key(|i| self.sv[*i].to_string())
            .collect();
        let mut remap = vec![0_usize; num_sv];
        for (sorted_pos, original) in order.iter().enumerate() {
            remap[*original] = sorted_pos;
        }
        let sv: Vec<SV> = order.iter().map(|i| self.sv[*i]).collect();

        let mut dataset = Dataset {
            time: self.time,
            sv,
            vars: BTreeMap::new(),
            time_system,
            interval,
            position,
        };

        let mut arrays: Vec<Vec<f64>> =
            vec![vec![f64::NAN; num_time * num_sv]; self.var_names.len()];

        for (t, s, var, value) in self.cells {
            let row = t as usize * num_sv + remap[s as usize];
            arrays[var as usize][row] = value;
        }

        for (name, values) in self.var_names.into_iter().zip(arrays) {
            dataset.insert_var(name, values);
        }

        dataset
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gnss::prelude::Constellation;
    use hifitime::TimeScale;

    fn epoch(secs: i64) -> Epoch {
        Epoch::from_gregorian(2020, 1, 1, 0, 0, 0, 0, TimeScale::GPST)
            + Duration::from_seconds(secs as f64)
    }

    #[test]
    fn axis_invariants() {
        let mut builder = DatasetBuilder::default();
        let c1c = builder.declare_var("C1C");

        let g07 = SV::new(Constellation::GPS, 7);
        let e04 = SV::new(Constellation::Galileo, 4);
        let r23 = SV::new(Constellation::Glonass, 23);

        let t0 = builder.push_epoch(epoch(0)).unwrap();
        for (sv, value) in [(g07, 1.0), (r23, 2.0)] {
            let s = builder.intern_sv(sv);
            builder.push_cell(t0, s, c1c, value);
        }

        // duplicate timestamp folds into same row
        assert_eq!(builder.push_epoch(epoch(0)), Some(0));
        // backwards timestamp is refused
        assert_eq!(builder.push_epoch(epoch(-30)), None);

        let t1 = builder.push_epoch(epoch(30)).unwrap();
        let s = builder.intern_sv(e04);
        builder.push_cell(t1, s, c1c, 3.0);

        let dataset = builder.build(TimeSystem::GPS, None, None);
        assert_eq!(dataset.time.len(), 2);
        assert!(dataset.time[0] < dataset.time[1]);

        // satellite axis sorted by label, Galileo first
        let labels: Vec<String> = dataset.sv.iter().map(|sv| sv.to_string()).collect();
        assert_eq!(labels, ["E04", "G07", "R23"]);

        let array = dataset.var("C1C").unwrap();
        assert_eq!(array.shape(), (2, 3));
        assert_eq!(array.sv_series("G07").unwrap()[0], 1.0);
        assert!(array.sv_series("G07").unwrap()[1].is_nan());
        assert_eq!(array.sv_series("E04").unwrap()[1], 3.0);
        assert!(array.sv_series("X99").is_none());
    }

    #[test]
    fn undeclared_codes_materialize_empty() {
        let mut builder = DatasetBuilder::default();
        builder.declare_var("C1C");
        builder.declare_var("S2P");

        let t = builder.push_epoch(epoch(0)).unwrap();
        let s = builder.intern_sv(SV::new(Constellation::GPS, 7));
        let c1c = builder.var_id("C1C").unwrap();
        builder.push_cell(t, s, c1c, 1.0);

        let dataset = builder.build(TimeSystem::GPS, None, None);
        assert_eq!(dataset.num_vars(), 2);
        assert!(dataset.var("S2P").unwrap().all_nan());
        assert_eq!(dataset.var("S2P").unwrap().shape(), (1, 1));
    }

    #[test]
    fn var_name_borrows_from_dataset() {
        let mut builder = DatasetBuilder::default();
        let c1c = builder.declare_var("C1C");
        let t = builder.push_epoch(epoch(0)).unwrap();
        let s = builder.intern_sv(SV::new(Constellation::GPS, 7));
        builder.push_cell(t, s, c1c, 1.0);
        let dataset = builder.build(TimeSystem::GPS, None, None);

        // the view must stay valid after the lookup key is gone
        let array = {
            let key = String::from("C1C");
            dataset.var(&key).unwrap()
        };
        assert_eq!(array.name, "C1C");
        assert_eq!(array.get(0, 0), Some(1.0));
    }

    #[test]
    fn nan_aware_equality() {
        let mut builder = DatasetBuilder::default();
        let c1c = builder.declare_var("C1C");
        let t = builder.push_epoch(epoch(0)).unwrap();
        let s = builder.intern_sv(SV::new(Constellation::GPS, 7));
        builder.intern_sv(SV::new(Constellation::GPS, 9));
        builder.push_cell(t, s, c1c, 1.0);

        let dataset = builder.build(TimeSystem::GPS, None, None);
        let clone = dataset.clone();
        // PartialEq would fail on the NaN cell, equals must not
        assert!(dataset.equals(&clone));

        let mut other = dataset.clone();
        other.insert_var("C1C".to_string(), vec![2.0, f64::NAN]);
        assert!(!dataset.equals(&other));
    }
}
