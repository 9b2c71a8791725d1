use crate::error::Error;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// `EpochFlag` validates an epoch,
/// or describes possible events that occurred
#[derive(Default, Copy, Clone, Debug)]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EpochFlag {
    /// Epoch is sane
    #[default]
    Ok,
    /// Power failure since previous epoch
    PowerFailure,
    /// Antenna is being moved at current epoch
    AntennaBeingMoved,
    /// Site has changed, receiver has moved since last epoch
    NewSiteOccupation,
    /// New header information follows this epoch
    HeaderInformationFollows,
    /// External event - significant event in this epoch
    ExternalEvent,
    /// Cycle slip at this epoch
    CycleSlip,
}

impl EpochFlag {
    /// Returns true if self is a valid epoch
    pub fn is_ok(self) -> bool {
        self == EpochFlag::Ok
    }

    /// Returns true if the records following this epoch line
    /// are satellite observation lines. Event flags (2..6) are
    /// followed by special records instead: header updates,
    /// event descriptions or cycle slip listings, whose count is
    /// carried by the "number of satellites" field.
    pub fn carries_observations(self) -> bool {
        matches!(self, Self::Ok | Self::PowerFailure)
    }
}

impl FromStr for EpochFlag {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(EpochFlag::Ok),
            "1" => Ok(EpochFlag::PowerFailure),
            "2" => Ok(EpochFlag::AntennaBeingMoved),
            "3" => Ok(EpochFlag::NewSiteOccupation),
            "4" => Ok(EpochFlag::HeaderInformationFollows),
            "5" => Ok(EpochFlag::ExternalEvent),
            "6" => Ok(EpochFlag::CycleSlip),
            other => Err(Error::record_decode(other)),
        }
    }
}

impl std::fmt::Display for EpochFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            EpochFlag::Ok => "0".fmt(f),
            EpochFlag::PowerFailure => "1".fmt(f),
            EpochFlag::AntennaBeingMoved => "2".fmt(f),
            EpochFlag::NewSiteOccupation => "3".fmt(f),
            EpochFlag::HeaderInformationFollows => "4".fmt(f),
            EpochFlag::ExternalEvent => "5".fmt(f),
            EpochFlag::CycleSlip => "6".fmt(f),
        }
    }
}

#[cfg(test)]
mod test {
    use super::EpochFlag;
    use std::str::FromStr;

    #[test]
    fn parsing() {
        for (descriptor, expected) in [
            ("0", EpochFlag::Ok),
            ("1", EpochFlag::PowerFailure),
            ("4", EpochFlag::HeaderInformationFollows),
            ("6", EpochFlag::CycleSlip),
        ] {
            let flag = EpochFlag::from_str(descriptor).unwrap();
            assert_eq!(flag, expected);
            assert_eq!(flag.to_string(), descriptor);
        }
        assert!(EpochFlag::from_str("7").is_err());
        assert!(EpochFlag::from_str("x").is_err());
    }

    #[test]
    fn observation_carriers() {
        assert!(EpochFlag::Ok.carries_observations());
        assert!(EpochFlag::PowerFailure.carries_observations());
        assert!(!EpochFlag::AntennaBeingMoved.carries_observations());
        assert!(!EpochFlag::ExternalEvent.carries_observations());
        // cycle slip payloads look like observation lines but
        // are event listings, not measurements
        assert!(!EpochFlag::CycleSlip.carries_observations());
    }
}
