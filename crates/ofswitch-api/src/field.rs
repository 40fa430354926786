// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Set-field targets.

use super::header::HeaderKind;
use super::ip::Ipv4Addr;
use super::mac::MacAddr;
use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

/// A header field value to write with the set-field action.
///
/// Each variant is owned by exactly one [`HeaderKind`]; MPLS fields
/// apply to the outermost label of the first MPLS tag.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum SetField {
    EthDst(MacAddr),
    EthSrc(MacAddr),
    EthType(u16),
    VlanVid(u16),
    VlanPcp(u8),
    MplsLabel(u32),
    MplsTc(u8),
    MplsBos(bool),
    IpDscp(u8),
    IpEcn(u8),
    IpProto(u8),
    Ipv4Src(Ipv4Addr),
    Ipv4Dst(Ipv4Addr),
}

/// The field a [`SetField`] writes, without its value.
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
pub enum FieldKind {
    EthDst,
    EthSrc,
    EthType,
    VlanVid,
    VlanPcp,
    MplsLabel,
    MplsTc,
    MplsBos,
    IpDscp,
    IpEcn,
    IpProto,
    Ipv4Src,
    Ipv4Dst,
}

impl SetField {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::EthDst(_) => FieldKind::EthDst,
            Self::EthSrc(_) => FieldKind::EthSrc,
            Self::EthType(_) => FieldKind::EthType,
            Self::VlanVid(_) => FieldKind::VlanVid,
            Self::VlanPcp(_) => FieldKind::VlanPcp,
            Self::MplsLabel(_) => FieldKind::MplsLabel,
            Self::MplsTc(_) => FieldKind::MplsTc,
            Self::MplsBos(_) => FieldKind::MplsBos,
            Self::IpDscp(_) => FieldKind::IpDscp,
            Self::IpEcn(_) => FieldKind::IpEcn,
            Self::IpProto(_) => FieldKind::IpProto,
            Self::Ipv4Src(_) => FieldKind::Ipv4Src,
            Self::Ipv4Dst(_) => FieldKind::Ipv4Dst,
        }
    }

    /// The kind of header tag that holds this field.
    pub fn owner(&self) -> HeaderKind {
        self.kind().owner()
    }
}

impl FieldKind {
    pub fn owner(&self) -> HeaderKind {
        use FieldKind::*;

        match self {
            EthDst | EthSrc | EthType => HeaderKind::Ether,
            VlanVid | VlanPcp => HeaderKind::Vlan,
            MplsLabel | MplsTc | MplsBos => HeaderKind::Mpls,
            IpDscp | IpEcn | IpProto | Ipv4Src | Ipv4Dst => HeaderKind::Ipv4,
        }
    }
}

impl Display for SetField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::EthDst(mac) => write!(f, "eth_dst={mac}"),
            Self::EthSrc(mac) => write!(f, "eth_src={mac}"),
            Self::EthType(et) => write!(f, "eth_type={et:04X}"),
            Self::VlanVid(vid) => write!(f, "vlan_vid={vid}"),
            Self::VlanPcp(pcp) => write!(f, "vlan_pcp={pcp}"),
            Self::MplsLabel(label) => write!(f, "mpls_label={label}"),
            Self::MplsTc(tc) => write!(f, "mpls_tc={tc}"),
            Self::MplsBos(bos) => write!(f, "mpls_bos={}", u8::from(*bos)),
            Self::IpDscp(dscp) => write!(f, "ip_dscp={dscp}"),
            Self::IpEcn(ecn) => write!(f, "ip_ecn={ecn}"),
            Self::IpProto(proto) => write!(f, "ip_proto={proto}"),
            Self::Ipv4Src(ip) => write!(f, "ipv4_src={ip}"),
            Self::Ipv4Dst(ip) => write!(f, "ipv4_dst={ip}"),
        }
    }
}
