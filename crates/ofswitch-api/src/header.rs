// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Parsed header tags.
//!
//! A packet's headers are kept as an ordered stack of tags, outermost
//! (Ethernet) first. Parsing raw bytes into tags happens before the
//! action engine sees a packet; the engine only edits the stack.

use super::ip::Ipv4Addr;
use super::mac::MacAddr;
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

pub const ETHER_TYPE_IPV4: u16 = 0x0800;
pub const ETHER_TYPE_VLAN: u16 = 0x8100;
pub const ETHER_TYPE_QINQ: u16 = 0x88A8;
pub const ETHER_TYPE_MPLS: u16 = 0x8847;
pub const ETHER_TYPE_MPLS_MCAST: u16 = 0x8848;

/// The kind of a [`HeaderTag`], used to look tags up in a stack.
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
pub enum HeaderKind {
    Ether,
    Vlan,
    Mpls,
    Ipv4,
}

impl Display for HeaderKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Ether => "ETHER",
            Self::Vlan => "VLAN",
            Self::Mpls => "MPLS",
            Self::Ipv4 => "IPv4",
        };
        write!(f, "{s}")
    }
}

/// A single parsed header occupying one position in the stack.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum HeaderTag {
    Ether(EtherHdr),
    Vlan(VlanTag),
    Mpls(MplsTag),
    Ipv4(Ipv4Hdr),
}

impl HeaderTag {
    pub fn kind(&self) -> HeaderKind {
        match self {
            Self::Ether(_) => HeaderKind::Ether,
            Self::Vlan(_) => HeaderKind::Vlan,
            Self::Mpls(_) => HeaderKind::Mpls,
            Self::Ipv4(_) => HeaderKind::Ipv4,
        }
    }

    /// The TTL this header carries, if it is one of the TTL-bearing
    /// kinds. For MPLS this is the TTL of the outermost label.
    pub fn ttl(&self) -> Option<u8> {
        match self {
            Self::Mpls(mpls) => Some(mpls.outermost().ttl),
            Self::Ipv4(ip4) => Some(ip4.ttl),
            Self::Ether(_) | Self::Vlan(_) => None,
        }
    }
}

impl From<EtherHdr> for HeaderTag {
    fn from(ether: EtherHdr) -> Self {
        Self::Ether(ether)
    }
}

impl From<VlanTag> for HeaderTag {
    fn from(vlan: VlanTag) -> Self {
        Self::Vlan(vlan)
    }
}

impl From<MplsTag> for HeaderTag {
    fn from(mpls: MplsTag) -> Self {
        Self::Mpls(mpls)
    }
}

impl From<Ipv4Hdr> for HeaderTag {
    fn from(ip4: Ipv4Hdr) -> Self {
        Self::Ipv4(ip4)
    }
}

impl Display for HeaderTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Ether(e) => {
                write!(f, "ETHER({} -> {}, {:04X})", e.src, e.dst, e.ether_type)
            }
            Self::Vlan(v) => write!(
                f,
                "VLAN(vid={}, pcp={}, {:04X})",
                v.vid, v.pcp, v.ether_type
            ),
            Self::Mpls(m) => {
                write!(f, "MPLS({:04X}, ttl=[", m.ether_type)?;
                for (i, e) in m.entries().iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", e.ttl)?;
                }
                write!(f, "])")
            }
            Self::Ipv4(ip) => {
                write!(f, "IPv4({} -> {}, ttl={})", ip.src, ip.dst, ip.ttl)
            }
        }
    }
}

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
pub struct EtherHdr {
    pub dst: MacAddr,
    pub src: MacAddr,
    pub ether_type: u16,
}

/// An 802.1Q tag.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
pub struct VlanTag {
    /// Priority code point.
    pub pcp: u8,
    /// VLAN identifier.
    pub vid: u16,
    pub ether_type: u16,
}

/// One label stack entry.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
pub struct MplsEntry {
    pub label: u32,
    /// Traffic class.
    pub tc: u8,
    /// Bottom of stack.
    pub bos: bool,
    pub ttl: u8,
}

/// An MPLS label stack.
///
/// The stack always holds at least one entry; an MPLS tag whose last
/// entry is popped is removed from the header stack instead. Entry 0
/// is the outermost label.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "MplsTagRepr", into = "MplsTagRepr")]
pub struct MplsTag {
    pub ether_type: u16,
    stack: Vec<MplsEntry>,
}

impl MplsTag {
    /// Create a tag holding a single entry.
    pub fn new(ether_type: u16, entry: MplsEntry) -> Self {
        Self { ether_type, stack: vec![entry] }
    }

    /// Create a tag from a list of entries, outermost first.
    ///
    /// Return `None` if `entries` is empty.
    pub fn from_entries(
        ether_type: u16,
        entries: Vec<MplsEntry>,
    ) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }

        Some(Self { ether_type, stack: entries })
    }

    pub fn entries(&self) -> &[MplsEntry] {
        &self.stack
    }

    pub fn entries_mut(&mut self) -> &mut [MplsEntry] {
        &mut self.stack
    }

    pub fn outermost(&self) -> &MplsEntry {
        &self.stack[0]
    }

    pub fn outermost_mut(&mut self) -> &mut MplsEntry {
        &mut self.stack[0]
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Push a new outermost entry.
    pub fn push(&mut self, entry: MplsEntry) {
        self.stack.insert(0, entry);
    }

    /// Remove the outermost entry, unless it is the only one left.
    pub fn pop(&mut self) -> Option<MplsEntry> {
        if self.stack.len() < 2 {
            return None;
        }

        Some(self.stack.remove(0))
    }
}

#[derive(Deserialize, Serialize)]
struct MplsTagRepr {
    ether_type: u16,
    stack: Vec<MplsEntry>,
}

impl TryFrom<MplsTagRepr> for MplsTag {
    type Error = &'static str;

    fn try_from(repr: MplsTagRepr) -> Result<Self, Self::Error> {
        MplsTag::from_entries(repr.ether_type, repr.stack)
            .ok_or("MPLS tag with an empty label stack")
    }
}

impl From<MplsTag> for MplsTagRepr {
    fn from(tag: MplsTag) -> Self {
        Self { ether_type: tag.ether_type, stack: tag.stack }
    }
}

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
pub struct Ipv4Hdr {
    pub dscp: u8,
    pub ecn: u8,
    pub proto: u8,
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub ttl: u8,
}
