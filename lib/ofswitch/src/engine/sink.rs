// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The dispatch capabilities the engine is handed by its caller.
//!
//! The engine never owns ports or groups. Output and group actions,
//! along with invalid-TTL redirects to the controller, are passed
//! through these traits and not waited on.

use super::packet::Packet;
use crate::d_error::DError;
use ofswitch_api::GroupId;
use ofswitch_api::PortNo;

/// Something that can transmit a packet out of a port.
pub trait PortSink {
    /// Send `pkt` to `dst`, which may be a concrete port or one of the
    /// logical destinations.
    fn send(&self, pkt: Packet, dst: PortNo) -> Result<(), SendError>;
}

/// Something that can run a packet through a group's buckets.
pub trait GroupSink {
    fn apply(&self, group: GroupId, pkt: Packet);
}

#[derive(Clone, Copy, Debug, DError, Eq, PartialEq, thiserror::Error)]
pub enum SendError {
    #[leaf]
    #[error("no such port: {0}")]
    BadPort(PortNo),
}
