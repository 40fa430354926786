// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The header stack and the primitives for editing it.
//!
//! Every lookup returns the first tag of the requested kind, in stack
//! order from outermost to innermost, unless an explicit skip count is
//! given. A lookup or edit that finds no tag of the requested kind
//! leaves the stack as it is: OpenFlow defines actions against absent
//! headers as having no effect, so absence is never an error here.

use alloc::vec::Vec;
use core::convert::Infallible;
use core::fmt;
use core::fmt::Display;
use core::slice;
use ofswitch_api::HeaderKind;
use ofswitch_api::HeaderTag;
use ofswitch_api::SetField;
use serde::Deserialize;
use serde::Serialize;

pub const VLAN_VID_MASK: u16 = 0x0FFF;
pub const VLAN_PCP_MASK: u8 = 0x07;
pub const MPLS_LABEL_MASK: u32 = 0x000F_FFFF;
pub const MPLS_TC_MASK: u8 = 0x07;
pub const IP_DSCP_MASK: u8 = 0x3F;
pub const IP_ECN_MASK: u8 = 0x03;

/// The outcome of an edit callback passed to
/// [`HeaderStack::find_and_edit()`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Edit {
    /// Put this tag in place of the one found.
    Replace(HeaderTag),

    /// Remove the tag found from the stack.
    Delete,

    /// Put the first tag in place of the one found and insert the
    /// second immediately after it.
    InsertAfter(HeaderTag, HeaderTag),
}

/// A packet's parsed headers, outermost first.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct HeaderStack {
    tags: Vec<HeaderTag>,
}

impl HeaderStack {
    pub fn new(tags: Vec<HeaderTag>) -> Self {
        Self { tags }
    }

    pub fn tags(&self) -> &[HeaderTag] {
        &self.tags
    }

    pub fn iter(&self) -> slice::Iter<'_, HeaderTag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn into_inner(self) -> Vec<HeaderTag> {
        self.tags
    }

    /// Return the first tag of the given kind along with its position.
    pub fn find(&self, kind: HeaderKind) -> Option<(usize, &HeaderTag)> {
        self.find_nth(kind, 0)
    }

    /// Return the tag of the given kind after skipping `skip` earlier
    /// matches, along with its position.
    pub fn find_nth(
        &self,
        kind: HeaderKind,
        skip: usize,
    ) -> Option<(usize, &HeaderTag)> {
        self.tags.iter().enumerate().filter(|(_, t)| t.kind() == kind).nth(skip)
    }

    /// Return the first tag of the given kind, mutably.
    pub fn find_mut(&mut self, kind: HeaderKind) -> Option<&mut HeaderTag> {
        self.tags.iter_mut().find(|t| t.kind() == kind)
    }

    /// Apply `edit` to the first tag of the given kind.
    ///
    /// The callback receives a copy of the tag and decides, through the
    /// returned [`Edit`], what takes its place. If no tag of this kind
    /// exists the callback is not invoked and the stack is left as it
    /// is.
    ///
    /// # Errors
    ///
    /// An error returned by the callback is passed through, and the
    /// stack is left as it is.
    pub fn find_and_edit<E, F>(
        &mut self,
        kind: HeaderKind,
        edit: F,
    ) -> Result<(), E>
    where
        F: FnOnce(HeaderTag) -> Result<Edit, E>,
    {
        self.find_nth_and_edit(kind, 0, edit)
    }

    /// Like [`Self::find_and_edit()`], but targets the tag found by
    /// [`Self::find_nth()`].
    pub fn find_nth_and_edit<E, F>(
        &mut self,
        kind: HeaderKind,
        skip: usize,
        edit: F,
    ) -> Result<(), E>
    where
        F: FnOnce(HeaderTag) -> Result<Edit, E>,
    {
        let Some((idx, tag)) = self.find_nth(kind, skip) else {
            return Ok(());
        };

        match edit(tag.clone())? {
            Edit::Replace(new) => self.tags[idx] = new,
            Edit::Delete => {
                self.tags.remove(idx);
            }
            Edit::InsertAfter(orig, new) => {
                self.tags[idx] = orig;
                self.tags.insert(idx + 1, new);
            }
        }

        Ok(())
    }

    /// Like [`Self::find_nth_and_edit()`], for edits that cannot fail.
    pub fn edit_nth<F>(&mut self, kind: HeaderKind, skip: usize, edit: F)
    where
        F: FnOnce(HeaderTag) -> Edit,
    {
        let Ok(()) = self.find_nth_and_edit(kind, skip, |tag| {
            Ok::<_, Infallible>(edit(tag))
        });
    }

    /// Write `field` into whichever tag holds it.
    ///
    /// Set-field actions are validated against the packet's headers
    /// before they reach the engine, so a packet without the owning
    /// header is simply left alone.
    pub fn set_field(&mut self, field: &SetField) {
        if let Some(tag) = self.find_mut(field.owner()) {
            write_field(tag, field);
        }
    }
}

fn write_field(tag: &mut HeaderTag, field: &SetField) {
    match (tag, field) {
        (HeaderTag::Ether(eth), SetField::EthDst(mac)) => eth.dst = *mac,
        (HeaderTag::Ether(eth), SetField::EthSrc(mac)) => eth.src = *mac,
        (HeaderTag::Ether(eth), SetField::EthType(et)) => eth.ether_type = *et,
        (HeaderTag::Vlan(vlan), SetField::VlanVid(vid)) => {
            vlan.vid = *vid & VLAN_VID_MASK;
        }
        (HeaderTag::Vlan(vlan), SetField::VlanPcp(pcp)) => {
            vlan.pcp = *pcp & VLAN_PCP_MASK;
        }
        (HeaderTag::Mpls(mpls), SetField::MplsLabel(label)) => {
            mpls.outermost_mut().label = *label & MPLS_LABEL_MASK;
        }
        (HeaderTag::Mpls(mpls), SetField::MplsTc(tc)) => {
            mpls.outermost_mut().tc = *tc & MPLS_TC_MASK;
        }
        (HeaderTag::Mpls(mpls), SetField::MplsBos(bos)) => {
            mpls.outermost_mut().bos = *bos;
        }
        (HeaderTag::Ipv4(ip4), SetField::IpDscp(dscp)) => {
            ip4.dscp = *dscp & IP_DSCP_MASK;
        }
        (HeaderTag::Ipv4(ip4), SetField::IpEcn(ecn)) => {
            ip4.ecn = *ecn & IP_ECN_MASK;
        }
        (HeaderTag::Ipv4(ip4), SetField::IpProto(proto)) => ip4.proto = *proto,
        (HeaderTag::Ipv4(ip4), SetField::Ipv4Src(ip)) => ip4.src = *ip,
        (HeaderTag::Ipv4(ip4), SetField::Ipv4Dst(ip)) => ip4.dst = *ip,
        // The tag was looked up by the field's owner.
        _ => (),
    }
}

impl From<Vec<HeaderTag>> for HeaderStack {
    fn from(tags: Vec<HeaderTag>) -> Self {
        Self { tags }
    }
}

impl FromIterator<HeaderTag> for HeaderStack {
    fn from_iter<I: IntoIterator<Item = HeaderTag>>(iter: I) -> Self {
        Self { tags: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a HeaderStack {
    type Item = &'a HeaderTag;
    type IntoIter = slice::Iter<'a, HeaderTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

impl Display for HeaderStack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{tag}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ofswitch_api::ETHER_TYPE_IPV4;
    use ofswitch_api::ETHER_TYPE_MPLS;
    use ofswitch_api::ETHER_TYPE_VLAN;
    use ofswitch_api::EtherHdr;
    use ofswitch_api::Ipv4Hdr;
    use ofswitch_api::MacAddr;
    use ofswitch_api::MplsEntry;
    use ofswitch_api::MplsTag;
    use ofswitch_api::VlanTag;

    fn ether() -> HeaderTag {
        HeaderTag::from(EtherHdr {
            dst: MacAddr::BROADCAST,
            src: MacAddr::from_const([0xA8, 0x40, 0x25, 0x00, 0x00, 0x01]),
            ether_type: ETHER_TYPE_IPV4,
        })
    }

    fn ip4(ttl: u8) -> HeaderTag {
        HeaderTag::from(Ipv4Hdr { ttl, ..Default::default() })
    }

    fn vlan(vid: u16) -> HeaderTag {
        HeaderTag::from(VlanTag { pcp: 0, vid, ether_type: ETHER_TYPE_VLAN })
    }

    #[test]
    fn find_returns_first_match() {
        let stack = HeaderStack::new(vec![ether(), ip4(10), ip4(20)]);
        let (idx, tag) = stack.find(HeaderKind::Ipv4).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(tag.ttl(), Some(10));
        assert!(stack.find(HeaderKind::Mpls).is_none());
    }

    #[test]
    fn find_nth_skips_earlier_matches() {
        let stack = HeaderStack::new(vec![ether(), ip4(10), ip4(20)]);
        let (idx, tag) = stack.find_nth(HeaderKind::Ipv4, 1).unwrap();
        assert_eq!(idx, 2);
        assert_eq!(tag.ttl(), Some(20));
        assert!(stack.find_nth(HeaderKind::Ipv4, 2).is_none());
    }

    #[test]
    fn edit_absent_header_is_noop() {
        let mut stack = HeaderStack::new(vec![ether(), ip4(10)]);
        let before = stack.clone();
        let res: Result<(), ()> =
            stack.find_and_edit(HeaderKind::Vlan, |_| Ok(Edit::Delete));
        assert_eq!(res, Ok(()));
        assert_eq!(stack, before);
    }

    #[test]
    fn edit_replace_delete_and_insert() {
        let mut stack = HeaderStack::new(vec![ether(), vlan(10), ip4(64)]);

        stack.edit_nth(HeaderKind::Vlan, 0, |_| Edit::Replace(vlan(20)));
        assert_eq!(stack.tags()[1], vlan(20));

        let res: Result<(), ()> = stack.find_and_edit(HeaderKind::Ether, |t| {
            Ok(Edit::InsertAfter(t, vlan(30)))
        });
        assert!(res.is_ok());
        assert_eq!(stack.tags()[..3], [ether(), vlan(30), vlan(20)]);

        // Only the first VLAN tag goes.
        let res: Result<(), ()> =
            stack.find_and_edit(HeaderKind::Vlan, |_| Ok(Edit::Delete));
        assert!(res.is_ok());
        assert_eq!(stack.tags(), &[ether(), vlan(20), ip4(64)]);
    }

    #[test]
    fn edit_error_leaves_stack_untouched() {
        let mut stack = HeaderStack::new(vec![ether(), ip4(0)]);
        let before = stack.clone();
        let res = stack.find_and_edit(HeaderKind::Ipv4, |_| Err("ttl"));
        assert_eq!(res, Err("ttl"));
        assert_eq!(stack, before);
    }

    #[test]
    fn set_field_targets_owning_header() {
        let mpls = MplsTag::from_entries(
            ETHER_TYPE_MPLS,
            vec![
                MplsEntry { label: 100, ttl: 5, ..Default::default() },
                MplsEntry { label: 200, ttl: 6, bos: true, ..Default::default() },
            ],
        )
        .unwrap();
        let mut stack =
            HeaderStack::new(vec![ether(), vlan(10), mpls.into(), ip4(64)]);

        stack.set_field(&SetField::VlanVid(0xF123));
        stack.set_field(&SetField::MplsLabel(300));
        stack.set_field(&SetField::Ipv4Dst("10.0.0.1".parse().unwrap()));
        stack.set_field(&SetField::EthType(0x88A8));

        let HeaderTag::Vlan(v) = &stack.tags()[1] else { panic!() };
        assert_eq!(v.vid, 0x123);
        let HeaderTag::Mpls(m) = &stack.tags()[2] else { panic!() };
        assert_eq!(m.entries()[0].label, 300);
        assert_eq!(m.entries()[1].label, 200);
        let HeaderTag::Ipv4(ip) = &stack.tags()[3] else { panic!() };
        assert_eq!(ip.dst.to_string(), "10.0.0.1");
        let HeaderTag::Ether(e) = &stack.tags()[0] else { panic!() };
        assert_eq!(e.ether_type, 0x88A8);
    }

    #[test]
    fn set_field_without_owner_is_noop() {
        let mut stack = HeaderStack::new(vec![ether(), ip4(64)]);
        let before = stack.clone();
        stack.set_field(&SetField::MplsTc(3));
        stack.set_field(&SetField::VlanPcp(5));
        assert_eq!(stack, before);
    }
}
