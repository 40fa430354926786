// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Pushing and popping VLAN tags and MPLS labels.

use super::headers::Edit;
use super::headers::HeaderStack;
use ofswitch_api::HeaderKind;
use ofswitch_api::HeaderTag;
use ofswitch_api::MplsEntry;
use ofswitch_api::MplsTag;
use ofswitch_api::VlanDefaults;
use ofswitch_api::VlanTag;

/// Insert a VLAN tag right after the Ethernet header.
///
/// The new tag takes its VID and PCP from the outermost existing VLAN
/// tag, or from `defaults` when there is none.
pub(super) fn push_vlan(
    hdrs: &mut HeaderStack,
    ether_type: u16,
    defaults: &VlanDefaults,
) {
    let (vid, pcp) = match hdrs.find(HeaderKind::Vlan) {
        Some((_, HeaderTag::Vlan(vlan))) => (vlan.vid, vlan.pcp),
        _ => (defaults.vid, defaults.pcp),
    };
    let new = VlanTag { pcp, vid, ether_type };

    hdrs.edit_nth(HeaderKind::Ether, 0, |eth| {
        Edit::InsertAfter(eth, new.into())
    });
}

/// Remove the outermost VLAN tag.
///
/// A packet down to its last header keeps it.
pub(super) fn pop_vlan(hdrs: &mut HeaderStack) {
    if hdrs.len() <= 1 {
        return;
    }

    hdrs.edit_nth(HeaderKind::Vlan, 0, |_| Edit::Delete);
}

/// Push an MPLS label.
///
/// With an MPLS tag already present the outermost label is duplicated
/// onto its stack. Otherwise a new single-label tag goes in after the
/// VLAN tag, or after the Ethernet header when there is no VLAN tag,
/// taking its TTL from the IPv4 header if there is one.
pub(super) fn push_mpls(hdrs: &mut HeaderStack, ether_type: u16) {
    if hdrs.find(HeaderKind::Mpls).is_some() {
        hdrs.edit_nth(HeaderKind::Mpls, 0, |tag| match tag {
            HeaderTag::Mpls(mut mpls) => {
                let entry = MplsEntry { bos: false, ..*mpls.outermost() };
                mpls.push(entry);
                Edit::Replace(mpls.into())
            }
            other => Edit::Replace(other),
        });
        return;
    }

    let ttl = hdrs
        .find(HeaderKind::Ipv4)
        .and_then(|(_, tag)| tag.ttl())
        .unwrap_or(0);
    let entry = MplsEntry { label: 0, tc: 0, bos: true, ttl };
    let new = MplsTag::new(ether_type, entry);

    let anchor = if hdrs.find(HeaderKind::Vlan).is_some() {
        HeaderKind::Vlan
    } else {
        HeaderKind::Ether
    };

    hdrs.edit_nth(anchor, 0, |tag| Edit::InsertAfter(tag, new.into()));
}

/// Pop the outermost MPLS label, removing the tag with its last label.
pub(super) fn pop_mpls(hdrs: &mut HeaderStack) {
    hdrs.edit_nth(HeaderKind::Mpls, 0, |tag| match tag {
        HeaderTag::Mpls(mut mpls) => match mpls.pop() {
            Some(_) => Edit::Replace(mpls.into()),
            None => Edit::Delete,
        },
        other => Edit::Replace(other),
    });
}
