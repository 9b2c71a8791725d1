//! `RINEX` revision description

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Version describes RINEX standards revisions.
/// Only major revision 3 unlocks observation decoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Version {
    /// Version major number
    pub major: u8,
    /// Version minor number
    pub minor: u8,
}

impl Default for Version {
    fn default() -> Self {
        Self { major: 3, minor: 0 }
    }
}

impl Version {
    /// Returns true if this revision carries modern (V3) observation records
    pub fn is_supported(&self) -> bool {
        self.major == 3
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

impl std::str::FromStr for Version {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.find('.') {
            Some(dot) => {
                let (major, minor) = s.split_at(dot);
                Ok(Self {
                    major: major.trim().parse::<u8>()?,
                    minor: minor[1..].trim().parse::<u8>()?,
                })
            },
            _ => Ok(Self {
                major: s.trim().parse::<u8>()?,
                minor: 0,
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Version;
    use std::str::FromStr;

    #[test]
    fn parsing() {
        let v = Version::from_str("3.05").unwrap();
        assert_eq!(v.major, 3);
        assert_eq!(v.minor, 5);
        assert!(v.is_supported());

        let v = Version::from_str("3.01").unwrap();
        assert_eq!((v.major, v.minor), (3, 1));

        let v = Version::from_str("2.11").unwrap();
        assert!(!v.is_supported());

        assert!(Version::from_str("a.b").is_err());
    }
}
