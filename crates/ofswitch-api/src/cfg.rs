// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Action engine configuration.

use super::action::PortNo;
use serde::Deserialize;
use serde::Serialize;

/// The VID/PCP given to a pushed VLAN tag when the packet carries no
/// VLAN tag to inherit them from.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct VlanDefaults {
    pub vid: u16,
    pub pcp: u8,
}

impl Default for VlanDefaults {
    fn default() -> Self {
        Self { vid: 1, pcp: 0 }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ActionCfg {
    /// Where a copy of a packet goes when a TTL decrement finds the
    /// TTL already exhausted.
    pub controller: PortNo,

    pub vlan_defaults: VlanDefaults,

    /// Log copy-TTL actions applied to a header layout OpenFlow does
    /// not define a result for.
    pub log_undefined_copy_ttl: bool,
}

impl Default for ActionCfg {
    fn default() -> Self {
        Self {
            controller: PortNo::Controller,
            vlan_defaults: VlanDefaults::default(),
            log_undefined_copy_ttl: true,
        }
    }
}
