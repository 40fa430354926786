// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Common routines for integration tests.

// This type of pedantry is more trouble than it's worth here.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;

// Let's make our lives easier and pub use a bunch of stuff.
pub use ofswitch::ExecCtx;
pub use ofswitch::LogLevel;
pub use ofswitch::LogProvider;
pub use ofswitch::api::Action;
pub use ofswitch::api::ActionCfg;
pub use ofswitch::api::ETHER_TYPE_IPV4;
pub use ofswitch::api::ETHER_TYPE_MPLS;
pub use ofswitch::api::ETHER_TYPE_QINQ;
pub use ofswitch::api::ETHER_TYPE_VLAN;
pub use ofswitch::api::EtherHdr;
pub use ofswitch::api::GroupId;
pub use ofswitch::api::HeaderKind;
pub use ofswitch::api::HeaderTag;
pub use ofswitch::api::Ipv4Addr;
pub use ofswitch::api::Ipv4Hdr;
pub use ofswitch::api::MacAddr;
pub use ofswitch::api::MplsEntry;
pub use ofswitch::api::MplsTag;
pub use ofswitch::api::PacketInReason;
pub use ofswitch::api::PortNo;
pub use ofswitch::api::SetField;
pub use ofswitch::api::VlanTag;
pub use ofswitch::engine::ActionCtx;
pub use ofswitch::engine::action_set::ActionSet;
pub use ofswitch::engine::action_set::ActionSlot;
pub use ofswitch::engine::action_set::Resolution;
pub use ofswitch::engine::action_set::apply_set;
pub use ofswitch::engine::actions::ActionError;
pub use ofswitch::engine::actions::SideEffect;
pub use ofswitch::engine::actions::TtlHeader;
pub use ofswitch::engine::actions::apply_list;
pub use ofswitch::engine::headers::HeaderStack;
pub use ofswitch::engine::packet::Packet;
pub use ofswitch::engine::sink::GroupSink;
pub use ofswitch::engine::sink::PortSink;
pub use ofswitch::engine::sink::SendError;

pub const GUEST_MAC: MacAddr =
    MacAddr::from_const([0xA8, 0x40, 0x25, 0xF7, 0x00, 0x01]);
pub const GW_MAC: MacAddr =
    MacAddr::from_const([0xA8, 0x40, 0x25, 0xFF, 0x77, 0x77]);
pub const GUEST_IP: Ipv4Addr = Ipv4Addr::from_const([10, 0, 0, 5]);
pub const REMOTE_IP: Ipv4Addr = Ipv4Addr::from_const([192, 168, 1, 10]);
pub const IN_PORT: PortNo = PortNo::Port(1);

pub fn eth() -> HeaderTag {
    EtherHdr { dst: GW_MAC, src: GUEST_MAC, ether_type: ETHER_TYPE_IPV4 }
        .into()
}

pub fn vlan(vid: u16, pcp: u8) -> HeaderTag {
    VlanTag { pcp, vid, ether_type: ETHER_TYPE_VLAN }.into()
}

/// An MPLS tag with one label per TTL given, outermost first.
pub fn mpls(ttls: &[u8]) -> HeaderTag {
    let last = ttls.len().saturating_sub(1);
    let entries = ttls
        .iter()
        .enumerate()
        .map(|(i, &ttl)| MplsEntry {
            label: 100 + i as u32,
            tc: 0,
            bos: i == last,
            ttl,
        })
        .collect();
    MplsTag::from_entries(ETHER_TYPE_MPLS, entries)
        .expect("at least one label")
        .into()
}

pub fn ipv4(ttl: u8) -> HeaderTag {
    Ipv4Hdr {
        dscp: 0,
        ecn: 0,
        proto: 17,
        src: GUEST_IP,
        dst: REMOTE_IP,
        ttl,
    }
    .into()
}

/// A packet arriving on [`IN_PORT`] with the given headers.
pub fn pkt(tags: Vec<HeaderTag>) -> Packet {
    Packet::new(IN_PORT, HeaderStack::new(tags), b"payload".to_vec())
}

/// The TTLs found in a header stack, outermost first, with every MPLS
/// label listed separately.
pub fn ttls(hdrs: &HeaderStack) -> Vec<u8> {
    let mut out = vec![];
    for tag in hdrs {
        match tag {
            HeaderTag::Mpls(mpls) => {
                out.extend(mpls.entries().iter().map(|e| e.ttl));
            }
            HeaderTag::Ipv4(ip4) => out.push(ip4.ttl),
            HeaderTag::Ether(_) | HeaderTag::Vlan(_) => (),
        }
    }
    out
}

pub fn kinds(hdrs: &HeaderStack) -> Vec<HeaderKind> {
    hdrs.iter().map(HeaderTag::kind).collect()
}

/// A port sink that remembers everything sent to it.
#[derive(Default)]
pub struct RecordingPorts {
    sent: Mutex<Vec<(PortNo, Packet)>>,
    bad: BTreeSet<u32>,
}

impl RecordingPorts {
    /// Make sends to any of `ports` fail with [`SendError::BadPort`].
    pub fn with_bad_ports(ports: &[PortNo]) -> Self {
        Self {
            sent: Mutex::new(vec![]),
            bad: ports.iter().map(|p| u32::from(*p)).collect(),
        }
    }

    pub fn sent(&self) -> Vec<(PortNo, Packet)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, dst: PortNo) -> Vec<Packet> {
        self.sent()
            .into_iter()
            .filter_map(|(p, pkt)| (p == dst).then_some(pkt))
            .collect()
    }
}

impl PortSink for RecordingPorts {
    fn send(&self, pkt: Packet, dst: PortNo) -> Result<(), SendError> {
        if self.bad.contains(&u32::from(dst)) {
            return Err(SendError::BadPort(dst));
        }

        self.sent.lock().unwrap().push((dst, pkt));
        Ok(())
    }
}

/// A group sink that remembers every group applied.
#[derive(Default)]
pub struct RecordingGroups {
    applied: Mutex<Vec<(GroupId, Packet)>>,
}

impl RecordingGroups {
    pub fn applied(&self) -> Vec<(GroupId, Packet)> {
        self.applied.lock().unwrap().clone()
    }
}

impl GroupSink for RecordingGroups {
    fn apply(&self, group: GroupId, pkt: Packet) {
        self.applied.lock().unwrap().push((group, pkt));
    }
}

/// A log provider that prints each message, like
/// [`ofswitch::PrintlnLog`], and keeps it for later inspection.
#[derive(Clone, Default)]
pub struct RecordingLog {
    entries: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl RecordingLog {
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn at(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|(l, msg)| (l == level).then_some(msg))
            .collect()
    }
}

impl LogProvider for RecordingLog {
    fn log(&self, level: LogLevel, msg: &str) {
        println!("{level} {msg}");
        self.entries.lock().unwrap().push((level, msg.to_string()));
    }
}

/// Everything the engine needs from its surroundings, with recording
/// collaborators in place of a real datapath.
pub struct TestDatapath {
    pub ectx: ExecCtx,
    pub cfg: ActionCfg,
    pub ports: RecordingPorts,
    pub groups: RecordingGroups,
    pub log: RecordingLog,
}

impl Default for TestDatapath {
    fn default() -> Self {
        Self::with_cfg(ActionCfg::default())
    }
}

impl TestDatapath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cfg(cfg: ActionCfg) -> Self {
        Self::with_parts(cfg, RecordingPorts::default())
    }

    pub fn with_parts(cfg: ActionCfg, ports: RecordingPorts) -> Self {
        let log = RecordingLog::default();
        Self {
            ectx: ExecCtx { log: Box::new(log.clone()) },
            cfg,
            ports,
            groups: RecordingGroups::default(),
            log,
        }
    }

    pub fn ctx(&self) -> ActionCtx<'_> {
        ActionCtx {
            ectx: &self.ectx,
            cfg: &self.cfg,
            ports: &self.ports,
            groups: &self.groups,
        }
    }

    /// Run an action list against `pkt`.
    pub fn apply_list(
        &self,
        pkt: Packet,
        actions: &[Action],
    ) -> Result<(Packet, Vec<SideEffect>), ActionError> {
        apply_list(&self.ctx(), pkt, actions)
    }

    /// Write `actions` into the packet's action set and resolve it.
    pub fn apply_set(
        &self,
        mut pkt: Packet,
        actions: &[Action],
    ) -> Result<Resolution, ActionError> {
        pkt.action_set.write_all(actions.iter().copied());
        apply_set(&self.ctx(), pkt)
    }
}
