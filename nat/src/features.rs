// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! NAT features enabled on a dataplane interface

use bitflags::bitflags;
use std::fmt::Display;

bitflags! {
    /// NAT role of an interface.
    ///
    /// `IN` marks an inside interface (NAT applied on input), `OUT` an outside interface, and
    /// `OUTPUT` on an outside interface requests NAT on the output path. The empty set means
    /// that no NAT is enabled on the interface.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct NatFeatures: u8 {
        const IN = 0b001;
        const OUT = 0b010;
        const OUTPUT = 0b100;
    }
}

impl NatFeatures {
    pub const IN_OUT: NatFeatures = NatFeatures::IN.union(NatFeatures::OUT);
    pub const OUTPUT_OUT: NatFeatures = NatFeatures::OUT.union(NatFeatures::OUTPUT);

    /// Tell if the combination can be configured on an interface
    #[must_use]
    pub fn is_valid(self) -> bool {
        self == Self::IN || self == Self::OUT || self == Self::IN_OUT || self == Self::OUTPUT_OUT
    }
}

impl Default for NatFeatures {
    fn default() -> Self {
        Self::empty()
    }
}

impl Display for NatFeatures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "NONE");
        }
        let mut sep = "";
        for (name, _) in self.iter_names() {
            write!(f, "{sep}{name}")?;
            sep = "+";
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::NatFeatures;

    #[test]
    fn valid_features() {
        assert!(NatFeatures::IN.is_valid());
        assert!(NatFeatures::OUT.is_valid());
        assert!(NatFeatures::IN_OUT.is_valid());
        assert!(NatFeatures::OUTPUT_OUT.is_valid());
        assert!(!NatFeatures::empty().is_valid());
        assert!(!NatFeatures::OUTPUT.is_valid());
        assert!(!(NatFeatures::IN | NatFeatures::OUTPUT).is_valid());
        assert!(!NatFeatures::all().is_valid());
    }

    #[test]
    fn display_features() {
        assert_eq!(NatFeatures::IN_OUT.to_string(), "IN+OUT");
        assert_eq!(NatFeatures::OUTPUT_OUT.to_string(), "OUT+OUTPUT");
        assert_eq!(NatFeatures::empty().to_string(), "NONE");
    }
}
