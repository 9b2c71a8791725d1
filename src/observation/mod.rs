//! Observation record decoding: one satellite line into signals
use crate::{error::Error, observable::Observable};
use gnss::prelude::SV;
use std::str::FromStr;

use log::warn;

mod lli;
mod snr;

pub use lli::LliFlags;
pub use snr::SNR;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// SV identity slot, "XYY" standard
pub(crate) const SVNN_SIZE: usize = 3;
/// F14.3 numeric field
pub(crate) const FIELD_F14_WIDTH: usize = 14;
/// Numeric field plus LLI and SSI digit slots
pub(crate) const FIELD_WIDTH: usize = FIELD_F14_WIDTH + 2;

/// One decoded (satellite, observable) measurement
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignalObservation {
    /// Satellite vehicle this measurement belongs to
    pub sv: SV,
    /// Measured observable
    pub observable: Observable,
    /// Observed value. NaN when the field was blank but an
    /// indicator digit was present.
    pub value: f64,
    /// Possible loss of lock indication
    pub lli: Option<LliFlags>,
    /// Possible signal strength indication
    pub snr: Option<SNR>,
}

/// Identifies the vehicle described by a V3 satellite line
pub(crate) fn parse_sv(line: &str) -> Result<SV, Error> {
    // get() covers both short lines and a multi byte character
    // straddling the slot boundary
    let slot = line
        .get(..SVNN_SIZE)
        .ok_or_else(|| Error::record_decode(line.trim()))?;
    SV::from_str(slot.trim()).map_err(|_| Error::record_decode(slot))
}

/// Decodes all signals of one satellite line, fixed width fields
/// laid out by the header's observable list for this system.
/// Blank fields, including fields dropped by line truncation,
/// are missing values. A non blank field that does not parse is an
/// error, unless `permissive` downgrades it to missing.
pub(crate) fn decode_signal_line(
    line: &str,
    sv: SV,
    observables: &[Observable],
    wanted: &[bool],
    with_indicators: bool,
    permissive: bool,
    signals: &mut Vec<SignalObservation>,
) -> Result<(), Error> {
    let line_width = line.len();

    for (index, observable) in observables.iter().enumerate() {
        let offset = SVNN_SIZE + index * FIELD_WIDTH;
        if offset >= line_width {
            // line truncated: every remaining field is missing
            break;
        }

        let end = (offset + FIELD_F14_WIDTH).min(line_width);
        let field = line
            .get(offset..end)
            .ok_or_else(|| Error::record_decode(line.trim()))?
            .trim();

        let value = if field.is_empty() {
            None
        } else {
            match field.parse::<f64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    if permissive {
                        warn!("{}({}): dropped unparseable \"{}\"", sv, observable, field);
                        None
                    } else {
                        return Err(Error::record_decode(field));
                    }
                },
            }
        };

        let mut lli = Option::<LliFlags>::None;
        let mut snr = Option::<SNR>::None;

        if with_indicators {
            let start = offset + FIELD_F14_WIDTH;
            if let Some(digit) = line.get(start..start + 1) {
                if !digit.trim().is_empty() {
                    match digit.parse::<u8>() {
                        Ok(unsigned) => {
                            lli = LliFlags::from_bits(unsigned);
                        },
                        Err(_) => {
                            warn!("{}({}): invalid lli \"{}\"", sv, observable, digit);
                        },
                    }
                }
            }
            let start = start + 1;
            if let Some(digit) = line.get(start..start + 1) {
                if !digit.trim().is_empty() {
                    if let Ok(found) = SNR::from_str(digit) {
                        snr = Some(found);
                    } else {
                        warn!("{}({}): invalid ssi \"{}\"", sv, observable, digit);
                    }
                }
            }
        }

        if !wanted[index] {
            continue;
        }

        if value.is_some() || lli.is_some() || snr.is_some() {
            signals.push(SignalObservation {
                sv,
                observable: observable.clone(),
                value: value.unwrap_or(f64::NAN),
                lli,
                snr,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use gnss::prelude::Constellation;

    fn observables(csv: &str) -> Vec<Observable> {
        csv.split(',')
            .map(|c| Observable::from_str(c.trim()).unwrap())
            .collect()
    }

    #[test]
    fn sv_identification() {
        let sv = parse_sv("G07  22227666.760").unwrap();
        assert_eq!(sv.constellation, Constellation::GPS);
        assert_eq!(sv.prn, 7);

        assert!(parse_sv("X07  1.0").is_err());
        assert!(parse_sv("G").is_err());
    }

    #[test]
    fn nominal_line() {
        let codes = observables("C1C,L1C,S1C");
        let mut signals = Vec::new();
        let line = "G01  20832393.682   109474991.85478        49.500";
        decode_signal_line(
            line,
            parse_sv(line).unwrap(),
            &codes,
            &[true, true, true],
            false,
            false,
            &mut signals,
        )
        .unwrap();

        assert_eq!(signals.len(), 3);
        assert_eq!(signals[0].value, 20832393.682);
        assert_eq!(signals[0].observable.code(), "C1C");
        assert_eq!(signals[1].value, 109474991.854);
        assert_eq!(signals[2].value, 49.5);
        // indicators not requested
        assert!(signals[1].lli.is_none());
        assert!(signals[1].snr.is_none());
    }

    #[test]
    fn indicators() {
        let codes = observables("C1C,L1C,S1C");
        let mut signals = Vec::new();
        let line = "G01  20832393.682   109474991.85478        49.500";
        decode_signal_line(
            line,
            parse_sv(line).unwrap(),
            &codes,
            &[true, true, true],
            true,
            false,
            &mut signals,
        )
        .unwrap();

        assert_eq!(signals[1].lli, Some(LliFlags::UNDER_ANTI_SPOOFING | LliFlags::HALF_CYCLE_SLIP | LliFlags::LOCK_LOSS));
        assert_eq!(signals[1].snr, Some(SNR::DbHz48_53));
        assert!(signals[0].lli.is_none());
        assert!(signals[0].snr.is_none());
    }

    #[test]
    fn blank_and_truncated_fields_are_missing() {
        let codes = observables("C1C,L1C,S1C,C2P");
        let mut signals = Vec::new();
        // L1C blank, line truncated before C2P
        let line = format!("G05{:>14}  {:>14}  {:>14}", "24178026.635", "", "38.066");
        decode_signal_line(
            &line,
            parse_sv(&line).unwrap(),
            &codes,
            &[true, true, true, true],
            false,
            false,
            &mut signals,
        )
        .unwrap();

        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].observable.code(), "C1C");
        assert_eq!(signals[1].observable.code(), "S1C");
    }

    #[test]
    fn unparseable_field() {
        let codes = observables("C1C,L1C");
        let mut signals = Vec::new();
        let line = format!("G05{:>14}  {:>14}", "24178026.63x", "109474991.854");
        let err = decode_signal_line(
            &line,
            parse_sv(&line).unwrap(),
            &codes,
            &[true, true],
            false,
            false,
            &mut signals,
        );
        assert!(err.is_err());

        // permissive opt-in keeps parsing, field becomes missing
        signals.clear();
        decode_signal_line(
            &line,
            parse_sv(&line).unwrap(),
            &codes,
            &[true, true],
            false,
            true,
            &mut signals,
        )
        .unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].observable.code(), "L1C");
    }

    #[test]
    fn non_ascii_input_is_rejected() {
        // multi byte character straddling the vehicle slot
        assert!(parse_sv("G0é  1.0").is_err());

        // multi byte character straddling the value field
        let codes = observables("C1C");
        let mut signals = Vec::new();
        let line = format!("G07{}é2.0", " ".repeat(13));
        let err = decode_signal_line(
            &line,
            SV::new(Constellation::GPS, 7),
            &codes,
            &[true],
            false,
            false,
            &mut signals,
        );
        assert!(err.is_err());
    }

    #[test]
    fn unselected_codes_are_skipped() {
        let codes = observables("C1C,L1C,S1C");
        let mut signals = Vec::new();
        let line = "G01  20832393.682   109474991.854           49.500";
        decode_signal_line(
            line,
            parse_sv(line).unwrap(),
            &codes,
            &[false, true, false],
            false,
            false,
            &mut signals,
        )
        .unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].observable.code(), "L1C");
    }
}
