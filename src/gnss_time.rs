//! GNSS time systems, as declared by Observation RINEX headers
use gnss::prelude::Constellation;
use hifitime::TimeScale;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// TimeSystem is the timescale in which epochs of an observation
/// file are expressed. RINEX declares it in the TIME OF FIRST OBS
/// header field; when that field is blank, it is inferred from the
/// dominant constellation among observed vehicles.
/// [TimeSystem::Unknown] marks files where neither applies,
/// typically SBAS only recordings.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimeSystem {
    /// GPS time
    #[default]
    GPS,
    /// Glonass time, steered to UTC(SU)
    GLO,
    /// Galileo time
    GAL,
    /// BeiDou time
    BDS,
    /// QZSS time
    QZS,
    /// IRNSS (NavIC) time
    IRN,
    /// Coordinated Universal Time
    UTC,
    /// Could not be declared nor inferred
    Unknown,
}

impl TimeSystem {
    /// Maps a [Constellation] to the [TimeSystem] its epochs
    /// are conventionally expressed in. SBAS vehicles do not
    /// define a timescale of their own.
    pub fn from_constellation(c: Constellation) -> Self {
        match c {
            Constellation::GPS => Self::GPS,
            Constellation::Glonass => Self::GLO,
            Constellation::Galileo => Self::GAL,
            Constellation::BeiDou => Self::BDS,
            Constellation::QZSS => Self::QZS,
            Constellation::IRNSS => Self::IRN,
            _ => Self::Unknown,
        }
    }

    /// Returns the [hifitime::TimeScale] used to interpret epoch
    /// timestamps expressed in this [TimeSystem].
    pub fn timescale(&self) -> TimeScale {
        match self {
            Self::GPS | Self::QZS | Self::IRN => TimeScale::GPST,
            Self::GAL => TimeScale::GST,
            Self::BDS => TimeScale::BDT,
            Self::GLO | Self::UTC | Self::Unknown => TimeScale::UTC,
        }
    }
}

impl std::str::FromStr for TimeSystem {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "GPS" => Ok(Self::GPS),
            "GLO" => Ok(Self::GLO),
            "GAL" => Ok(Self::GAL),
            "BDS" | "BDT" => Ok(Self::BDS),
            "QZS" => Ok(Self::QZS),
            "IRN" => Ok(Self::IRN),
            "UTC" => Ok(Self::UTC),
            other => Err(crate::error::Error::record_decode(other)),
        }
    }
}

impl std::fmt::Display for TimeSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::GPS => write!(f, "GPS"),
            Self::GLO => write!(f, "GLO"),
            Self::GAL => write!(f, "GAL"),
            Self::BDS => write!(f, "BDS"),
            Self::QZS => write!(f, "QZS"),
            Self::IRN => write!(f, "IRN"),
            Self::UTC => write!(f, "UTC"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::TimeSystem;
    use gnss::prelude::Constellation;
    use hifitime::TimeScale;
    use std::str::FromStr;

    #[test]
    fn label_round_trip() {
        for label in ["GPS", "GLO", "GAL", "BDS", "QZS", "IRN", "UTC"] {
            let ts = TimeSystem::from_str(label).unwrap();
            assert_eq!(ts.to_string(), label);
        }
        assert!(TimeSystem::from_str("XYZ").is_err());
    }

    #[test]
    fn constellation_mapping() {
        assert_eq!(
            TimeSystem::from_constellation(Constellation::GPS),
            TimeSystem::GPS
        );
        assert_eq!(
            TimeSystem::from_constellation(Constellation::Galileo),
            TimeSystem::GAL
        );
        assert_eq!(
            TimeSystem::from_constellation(Constellation::EGNOS),
            TimeSystem::Unknown
        );
        assert_eq!(TimeSystem::GAL.timescale(), TimeScale::GST);
        assert_eq!(TimeSystem::Unknown.timescale(), TimeScale::UTC);
    }
}
