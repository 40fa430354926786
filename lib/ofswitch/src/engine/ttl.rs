// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! TTL manipulation: set, decrement, and copy between adjacent
//! TTL-bearing headers.

use super::actions::ActionError;
use super::actions::TtlHeader;
use super::headers::Edit;
use super::headers::HeaderStack;
use ofswitch_api::HeaderKind;
use ofswitch_api::HeaderTag;

/// Which way a copy-TTL action moves the TTL.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum CopyDir {
    /// From next-to-outermost to outermost.
    Out,
    /// From outermost to next-to-outermost.
    In,
}

/// The header layouts OpenFlow defines copy-TTL actions for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CopyShape {
    /// A single MPLS label with an IPv4 header beneath it.
    MplsOverIpv4,
    /// An MPLS tag holding two or more labels.
    MplsStack,
    /// An IPv4 header encapsulating another.
    Ipv4OverIpv4,
}

/// A header located by kind and number of earlier matches to skip.
type HdrPos = (HeaderKind, usize);

fn write_ttl(tag: &mut HeaderTag, ttl: u8) {
    match tag {
        HeaderTag::Mpls(mpls) => mpls.outermost_mut().ttl = ttl,
        HeaderTag::Ipv4(ip4) => ip4.ttl = ttl,
        HeaderTag::Ether(_) | HeaderTag::Vlan(_) => (),
    }
}

fn set_at(hdrs: &mut HeaderStack, (kind, skip): HdrPos, ttl: u8) {
    hdrs.edit_nth(kind, skip, |mut tag| {
        write_ttl(&mut tag, ttl);
        Edit::Replace(tag)
    });
}

fn ttl_at(hdrs: &HeaderStack, (kind, skip): HdrPos) -> Option<u8> {
    hdrs.find_nth(kind, skip).and_then(|(_, tag)| tag.ttl())
}

/// Overwrite the TTL of the first header of the given kind.
pub(super) fn set_ttl(hdrs: &mut HeaderStack, hdr: TtlHeader, ttl: u8) {
    set_at(hdrs, (hdr.kind(), 0), ttl);
}

/// Decrement the TTL of the first header of the given kind.
///
/// A header whose TTL is already zero is left as it is and reported as
/// [`ActionError::InvalidTtl`].
pub(super) fn dec_ttl(
    hdrs: &mut HeaderStack,
    hdr: TtlHeader,
) -> Result<(), ActionError> {
    hdrs.find_and_edit(hdr.kind(), |mut tag| match tag.ttl() {
        Some(ttl @ 1..) => {
            write_ttl(&mut tag, ttl - 1);
            Ok(Edit::Replace(tag))
        }
        _ => Err(ActionError::InvalidTtl(hdr)),
    })
}

fn copy_shape(hdrs: &HeaderStack) -> Option<CopyShape> {
    let mut ttl_hdrs = hdrs.iter().filter(|tag| tag.ttl().is_some());

    match (ttl_hdrs.next(), ttl_hdrs.next()) {
        (Some(HeaderTag::Mpls(mpls)), _) if mpls.len() > 1 => {
            Some(CopyShape::MplsStack)
        }
        (Some(HeaderTag::Mpls(_)), Some(HeaderTag::Ipv4(_))) => {
            Some(CopyShape::MplsOverIpv4)
        }
        (Some(HeaderTag::Ipv4(_)), Some(HeaderTag::Ipv4(_))) => {
            Some(CopyShape::Ipv4OverIpv4)
        }
        _ => None,
    }
}

fn copy_within_mpls(hdrs: &mut HeaderStack, dir: CopyDir) {
    let Some(HeaderTag::Mpls(mpls)) = hdrs.find_mut(HeaderKind::Mpls) else {
        return;
    };

    if let [outer, inner, ..] = mpls.entries_mut() {
        match dir {
            CopyDir::Out => outer.ttl = inner.ttl,
            CopyDir::In => inner.ttl = outer.ttl,
        }
    }
}

/// Copy the TTL between the two outermost TTL-bearing headers.
///
/// Return `false`, leaving the headers as they are, when the packet's
/// layout is not one copy-TTL actions are defined for.
pub(super) fn copy_ttl(hdrs: &mut HeaderStack, dir: CopyDir) -> bool {
    let (outer, inner) = match copy_shape(hdrs) {
        Some(CopyShape::MplsStack) => {
            copy_within_mpls(hdrs, dir);
            return true;
        }
        Some(CopyShape::MplsOverIpv4) => {
            ((HeaderKind::Mpls, 0), (HeaderKind::Ipv4, 0))
        }
        Some(CopyShape::Ipv4OverIpv4) => {
            ((HeaderKind::Ipv4, 0), (HeaderKind::Ipv4, 1))
        }
        None => return false,
    };

    let (src, dst) = match dir {
        CopyDir::Out => (inner, outer),
        CopyDir::In => (outer, inner),
    };

    if let Some(ttl) = ttl_at(hdrs, src) {
        set_at(hdrs, dst, ttl);
    }
    true
}
