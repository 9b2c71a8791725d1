//! Loss of lock indication (LLI) for phase tracking
use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Copy, Clone)]
    #[derive(PartialEq, PartialOrd)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct LliFlags: u8 {
        /// Current epoch is marked Ok or Unknown status
        const OK_OR_UNKNOWN = 0x00;
        /// Lock lost between previous observation and current observation,
        /// cycle slip is possible
        const LOCK_LOSS = 0x01;
        /// Half cycle slip marker
        const HALF_CYCLE_SLIP = 0x02;
        /// Observing under anti spoofing,
        /// might suffer from decreased signal quality
        const UNDER_ANTI_SPOOFING = 0x04;
    }
}

#[cfg(test)]
mod test {
    use super::LliFlags;

    #[test]
    fn digit_mapping() {
        let lli = LliFlags::from_bits(1).unwrap();
        assert_eq!(lli, LliFlags::LOCK_LOSS);
        assert_eq!(lli.bits(), 1);

        let lli = LliFlags::from_bits(3).unwrap();
        assert!(lli.intersects(LliFlags::LOCK_LOSS));
        assert!(lli.intersects(LliFlags::HALF_CYCLE_SLIP));

        assert!(LliFlags::from_bits(8).is_none());
    }
}
