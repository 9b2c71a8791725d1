//! Signal strength indication (SSI)
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Signal to noise ratio description, coarsely bucketed by
/// the single SSI digit following each observation field.
#[derive(Default, PartialOrd, Ord, PartialEq, Eq, Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SNR {
    /// SNR ~= 0 dB/Hz
    DbHz0,
    /// SNR < 12 dB/Hz
    DbHz12,
    /// 12 dB/Hz <= SNR < 17 dB/Hz
    DbHz12_17,
    /// 18 dB/Hz <= SNR < 23 dB/Hz
    DbHz18_23,
    /// 24 dB/Hz <= SNR < 29 dB/Hz
    #[default]
    DbHz24_29,
    /// 30 dB/Hz <= SNR < 35 dB/Hz
    DbHz30_35,
    /// 36 dB/Hz <= SNR < 41 dB/Hz
    DbHz36_41,
    /// 42 dB/Hz <= SNR < 47 dB/Hz
    DbHz42_47,
    /// 48 dB/Hz <= SNR < 53 dB/Hz
    DbHz48_53,
    /// SNR >= 54 dB/Hz
    DbHz54,
}

impl SNR {
    /// Returns the raw RINEX digit encoding this bucket
    pub fn digit(&self) -> u8 {
        match self {
            Self::DbHz0 => 0,
            Self::DbHz12 => 1,
            Self::DbHz12_17 => 2,
            Self::DbHz18_23 => 3,
            Self::DbHz24_29 => 4,
            Self::DbHz30_35 => 5,
            Self::DbHz36_41 => 6,
            Self::DbHz42_47 => 7,
            Self::DbHz48_53 => 8,
            Self::DbHz54 => 9,
        }
    }

    /// Returns true if signal quality is bad (very low SNR)
    pub fn bad(self) -> bool {
        self <= SNR::DbHz18_23
    }
}

impl FromStr for SNR {
    type Err = Error;
    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code.trim() {
            "0" => Ok(SNR::DbHz0),
            "1" => Ok(SNR::DbHz12),
            "2" => Ok(SNR::DbHz12_17),
            "3" => Ok(SNR::DbHz18_23),
            "4" => Ok(SNR::DbHz24_29),
            "5" => Ok(SNR::DbHz30_35),
            "6" => Ok(SNR::DbHz36_41),
            "7" => Ok(SNR::DbHz42_47),
            "8" => Ok(SNR::DbHz48_53),
            "9" => Ok(SNR::DbHz54),
            other => Err(Error::record_decode(other)),
        }
    }
}

impl std::fmt::Display for SNR {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.digit())
    }
}

#[cfg(test)]
mod test {
    use super::SNR;
    use std::str::FromStr;

    #[test]
    fn digit_round_trip() {
        for digit in 0..=9_u8 {
            let snr = SNR::from_str(&digit.to_string()).unwrap();
            assert_eq!(snr.digit(), digit);
        }
        assert!(SNR::from_str("a").is_err());
        assert!(SNR::from_str("2").unwrap().bad());
        assert!(!SNR::from_str("8").unwrap().bad());
    }
}
