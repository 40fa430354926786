// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The OpenFlow action catalogue.

use super::field::SetField;
use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

/// The highest number a physical or virtual port may use.
pub const OFPP_MAX: u32 = 0xFFFF_FF00;
pub const OFPP_IN_PORT: u32 = 0xFFFF_FFF8;
pub const OFPP_TABLE: u32 = 0xFFFF_FFF9;
pub const OFPP_NORMAL: u32 = 0xFFFF_FFFA;
pub const OFPP_FLOOD: u32 = 0xFFFF_FFFB;
pub const OFPP_ALL: u32 = 0xFFFF_FFFC;
pub const OFPP_CONTROLLER: u32 = 0xFFFF_FFFD;
pub const OFPP_LOCAL: u32 = 0xFFFF_FFFE;
pub const OFPP_ANY: u32 = 0xFFFF_FFFF;

/// A packet destination: either a concrete port or one of the
/// reserved logical ports.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub enum PortNo {
    Port(u32),
    InPort,
    Table,
    Normal,
    Flood,
    All,
    Controller,
    Local,
    Any,
}

impl From<u32> for PortNo {
    fn from(raw: u32) -> Self {
        match raw {
            OFPP_IN_PORT => Self::InPort,
            OFPP_TABLE => Self::Table,
            OFPP_NORMAL => Self::Normal,
            OFPP_FLOOD => Self::Flood,
            OFPP_ALL => Self::All,
            OFPP_CONTROLLER => Self::Controller,
            OFPP_LOCAL => Self::Local,
            OFPP_ANY => Self::Any,
            _ => Self::Port(raw),
        }
    }
}

impl From<PortNo> for u32 {
    fn from(port: PortNo) -> Self {
        match port {
            PortNo::Port(raw) => raw,
            PortNo::InPort => OFPP_IN_PORT,
            PortNo::Table => OFPP_TABLE,
            PortNo::Normal => OFPP_NORMAL,
            PortNo::Flood => OFPP_FLOOD,
            PortNo::All => OFPP_ALL,
            PortNo::Controller => OFPP_CONTROLLER,
            PortNo::Local => OFPP_LOCAL,
            PortNo::Any => OFPP_ANY,
        }
    }
}

impl Display for PortNo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Port(n) => write!(f, "{n}"),
            Self::InPort => write!(f, "in_port"),
            Self::Table => write!(f, "table"),
            Self::Normal => write!(f, "normal"),
            Self::Flood => write!(f, "flood"),
            Self::All => write!(f, "all"),
            Self::Controller => write!(f, "controller"),
            Self::Local => write!(f, "local"),
            Self::Any => write!(f, "any"),
        }
    }
}

/// A group table entry identifier.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct GroupId(pub u32);

impl Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a packet is being handed to the controller.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PacketInReason {
    NoMatch,
    Action,
    InvalidTtl,
}

impl Display for PacketInReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::NoMatch => "no_match",
            Self::Action => "action",
            Self::InvalidTtl => "invalid_ttl",
        };
        write!(f, "{s}")
    }
}

/// An OpenFlow action, already decoded from the wire.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Action {
    Output { port: PortNo },
    Group { group_id: GroupId },
    SetQueue { queue_id: u32 },
    SetMplsTtl { ttl: u8 },
    DecMplsTtl,
    SetNwTtl { ttl: u8 },
    DecNwTtl,
    CopyTtlOut,
    CopyTtlIn,
    PushVlan { ether_type: u16 },
    PopVlan,
    PushMpls { ether_type: u16 },
    PopMpls,
    SetField { field: SetField },

    /// A vendor extension. The engine never acts on it.
    Experimenter { id: u32 },
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Output { port } => write!(f, "output:{port}"),
            Self::Group { group_id } => write!(f, "group:{group_id}"),
            Self::SetQueue { queue_id } => write!(f, "set_queue:{queue_id}"),
            Self::SetMplsTtl { ttl } => write!(f, "set_mpls_ttl:{ttl}"),
            Self::DecMplsTtl => write!(f, "dec_mpls_ttl"),
            Self::SetNwTtl { ttl } => write!(f, "set_nw_ttl:{ttl}"),
            Self::DecNwTtl => write!(f, "dec_nw_ttl"),
            Self::CopyTtlOut => write!(f, "copy_ttl_out"),
            Self::CopyTtlIn => write!(f, "copy_ttl_in"),
            Self::PushVlan { ether_type } => {
                write!(f, "push_vlan:{ether_type:04X}")
            }
            Self::PopVlan => write!(f, "pop_vlan"),
            Self::PushMpls { ether_type } => {
                write!(f, "push_mpls:{ether_type:04X}")
            }
            Self::PopMpls => write!(f, "pop_mpls"),
            Self::SetField { field } => write!(f, "set_field:{field}"),
            Self::Experimenter { id } => write!(f, "experimenter:{id}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reserved_ports_round_trip_through_wire_value() {
        assert_eq!(PortNo::from(OFPP_CONTROLLER), PortNo::Controller);
        assert_eq!(u32::from(PortNo::InPort), OFPP_IN_PORT);
        assert_eq!(PortNo::from(7), PortNo::Port(7));
        assert_eq!(PortNo::from(OFPP_MAX), PortNo::Port(OFPP_MAX));
    }
}
