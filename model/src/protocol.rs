// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! L4 protocols that can be load-balanced

use serde::{Deserialize, Serialize};

/// Transport protocol of a service port or NAT mapping
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(any(test, feature = "bolero"), derive(bolero::TypeGenerator))]
pub enum Protocol {
    #[strum(serialize = "TCP")]
    Tcp,
    #[strum(serialize = "UDP")]
    Udp,
}

#[cfg(test)]
mod test {
    use super::Protocol;
    use std::str::FromStr;

    #[test]
    fn parse_protocol() {
        assert_eq!(Protocol::from_str("TCP"), Ok(Protocol::Tcp));
        assert_eq!(Protocol::from_str("udp"), Ok(Protocol::Udp));
        assert!(Protocol::from_str("").is_err());
        assert!(Protocol::from_str("SCTP").is_err());
        assert_eq!(Protocol::Udp.to_string(), "UDP");
    }
}
