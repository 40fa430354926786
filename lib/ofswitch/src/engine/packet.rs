// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! A packet as the engine sees it.

use super::action_set::ActionSet;
use super::headers::HeaderStack;
use alloc::vec::Vec;
use ofswitch_api::PacketInReason;
use ofswitch_api::PortNo;

/// A packet with its headers already parsed.
///
/// The payload is carried along untouched; actions only ever edit the
/// header stack and the metadata fields.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Packet {
    pub headers: HeaderStack,
    pub payload: Vec<u8>,

    /// The egress queue selected by a set-queue action.
    pub queue_id: Option<u32>,

    /// Set when the packet is handed to the controller.
    pub packet_in_reason: Option<PacketInReason>,

    /// Actions written by the flow tables, applied when the pipeline
    /// ends.
    pub action_set: ActionSet,

    in_port: PortNo,
}

impl Packet {
    pub fn new(
        in_port: PortNo,
        headers: HeaderStack,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            headers,
            payload,
            queue_id: None,
            packet_in_reason: None,
            action_set: ActionSet::new(),
            in_port,
        }
    }

    /// The port this packet arrived on.
    pub fn in_port(&self) -> PortNo {
        self.in_port
    }
}
