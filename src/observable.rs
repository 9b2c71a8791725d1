//! Observable: physical measurement carried by an observation code
use crate::error::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Observable describes one measurement type a receiver may track,
/// named by its 3 character RINEX code ("C1C", "L1C", ..).
/// The first letter selects the physics, the trailing characters
/// the signal band and tracking mode.
#[derive(Debug, Clone, PartialEq, PartialOrd, Hash, Ord, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Observable {
    /// Carrier phase observation, in whole cycles
    Phase(String),
    /// Doppler shift observation
    Doppler(String),
    /// Signal strength observation
    SSI(String),
    /// Pseudo range observation, in meters
    PseudoRange(String),
}

impl Default for Observable {
    fn default() -> Self {
        Self::Phase("L1C".to_string())
    }
}

impl Observable {
    /// Returns the RINEX code naming this observable
    pub fn code(&self) -> &str {
        match self {
            Self::Phase(c) | Self::Doppler(c) | Self::SSI(c) | Self::PseudoRange(c) => c,
        }
    }

    pub fn is_phase_observable(&self) -> bool {
        matches!(self, Self::Phase(_))
    }

    pub fn is_pseudorange_observable(&self) -> bool {
        matches!(self, Self::PseudoRange(_))
    }

    /// Returns true if this observable is selected by given filter entry.
    /// A full 3 character entry is an exact match, anything shorter is a
    /// prefix wildcard: "C" grabs every pseudo range code, "L1" every
    /// band 1 phase code.
    pub fn matches(&self, filter: &str) -> bool {
        let code = self.code();
        if filter.len() < code.len() {
            code.starts_with(filter)
        } else {
            code == filter
        }
    }
}

impl std::fmt::Display for Observable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Observable {
    type Err = Error;
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let content = content.trim().to_uppercase();
        let len = content.len();
        if !(2..4).contains(&len) {
            return Err(Error::record_decode(&content));
        }
        if content.starts_with('L') {
            Ok(Self::Phase(content))
        } else if content.starts_with('C') || content.starts_with('P') {
            Ok(Self::PseudoRange(content))
        } else if content.starts_with('D') {
            Ok(Self::Doppler(content))
        } else if content.starts_with('S') {
            Ok(Self::SSI(content))
        } else {
            Err(Error::record_decode(&content))
        }
    }
}

#[cfg(test)]
mod test {
    use super::Observable;
    use std::str::FromStr;

    #[test]
    fn parsing() {
        let obs = Observable::from_str("C1C").unwrap();
        assert_eq!(obs, Observable::PseudoRange("C1C".to_string()));
        assert_eq!(obs.code(), "C1C");
        assert_eq!(obs.to_string(), "C1C");

        let obs = Observable::from_str("L2W").unwrap();
        assert!(obs.is_phase_observable());

        assert!(Observable::from_str("S1C").unwrap().matches("S"));
        assert!(Observable::from_str("X1X").is_err());
        assert!(Observable::from_str("").is_err());
        assert!(Observable::from_str("C1C C2C").is_err());
    }

    #[test]
    fn filter_matching() {
        let c1c = Observable::from_str("C1C").unwrap();
        assert!(c1c.matches("C1C"));
        assert!(c1c.matches("C1"));
        assert!(c1c.matches("C"));
        assert!(!c1c.matches("L"));
        assert!(!c1c.matches("C1P"));
        assert!(!c1c.matches("nonsense"));
    }
}
