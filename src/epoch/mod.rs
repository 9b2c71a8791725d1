//! Epoch line interpretation
use crate::error::Error;
use hifitime::{Epoch, TimeScale};
use std::str::FromStr;

mod flag;
pub use flag::EpochFlag;

/// One decoded epoch line: timestamp, validity flag and the
/// number of records (satellite lines, or event payload lines)
/// that follow. Transient: folded into the growing dataset
/// once its records are consumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EpochRecord {
    pub epoch: Epoch,
    pub flag: EpochFlag,
    pub num_records: u16,
}

/// Modern (V3) epoch lines always start with the '>' marker
pub(crate) fn is_new_epoch(line: &str) -> bool {
    line.starts_with('>')
}

/// Parses a datetime interpreted within specified [TimeScale].
/// Expects "yyyy mm dd hh mm ss.sssssss" format, seconds carrying
/// up to 100 ns precision.
pub(crate) fn parse_in_timescale(content: &str, ts: TimeScale) -> Result<Epoch, Error> {
    let mut y = 0_i32;
    let mut m = 0_u8;
    let mut d = 0_u8;
    let mut hh = 0_u8;
    let mut mm = 0_u8;
    let mut ss = 0_u8;
    let mut ns = 0_u32;

    if content.split_ascii_whitespace().count() < 6 {
        return Err(Error::record_decode(content.trim()));
    }

    for (field_index, item) in content.split_ascii_whitespace().take(6).enumerate() {
        match field_index {
            0 => {
                y = item
                    .parse::<i32>()
                    .map_err(|_| Error::record_decode(item))?;
            },
            1 => {
                m = item.parse::<u8>().map_err(|_| Error::record_decode(item))?;
            },
            2 => {
                d = item.parse::<u8>().map_err(|_| Error::record_decode(item))?;
            },
            3 => {
                hh = item.parse::<u8>().map_err(|_| Error::record_decode(item))?;
            },
            4 => {
                mm = item.parse::<u8>().map_err(|_| Error::record_decode(item))?;
            },
            5 => {
                if let Some(dot) = item.find('.') {
                    ss = item[..dot]
                        .parse::<u8>()
                        .map_err(|_| Error::record_decode(item))?;
                    let frac = &item[dot + 1..];
                    if frac.len() > 9 {
                        return Err(Error::record_decode(item));
                    }
                    let scale = 10_u32.pow(9 - frac.len() as u32);
                    ns = frac
                        .parse::<u32>()
                        .map_err(|_| Error::record_decode(item))?
                        * scale;
                } else {
                    ss = item.parse::<u8>().map_err(|_| Error::record_decode(item))?;
                }
            },
            _ => {},
        }
    }

    // Epoch::from_gregorian panics on rubbish input
    if y == 0 {
        return Err(Error::record_decode(content.trim()));
    }

    Epoch::maybe_from_gregorian(y, m, d, hh, mm, ss, ns, ts)
        .map_err(|_| Error::record_decode(content.trim()))
}

/// Parses one V3 epoch line: '>' marker, datetime, flag,
/// record count. The trailing receiver clock offset is tolerated
/// and dropped.
pub(crate) fn parse_epoch_line(line: &str, ts: TimeScale) -> Result<EpochRecord, Error> {
    let content = line.strip_prefix('>').unwrap_or(line);
    let items: Vec<&str> = content.split_ascii_whitespace().collect();
    if items.len() < 8 {
        return Err(Error::record_decode(line.trim()));
    }

    let datetime = items[..6].join(" ");
    let epoch = parse_in_timescale(&datetime, ts)?;

    let flag = EpochFlag::from_str(items[6])?;
    let num_records = items[7]
        .parse::<u16>()
        .map_err(|_| Error::record_decode(items[7]))?;

    Ok(EpochRecord {
        epoch,
        flag,
        num_records,
    })
}
