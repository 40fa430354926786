// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Print header stacks and action sets in a human-friendly manner.
//!
//! This is mostly just a place to hang printing routines so that they
//! can be used by both datapath diagnostics and integration tests.

use crate::engine::action_set::ActionSet;
use crate::engine::action_set::ActionSlot;
use crate::engine::headers::HeaderStack;
use itertools::Itertools;
use ofswitch_api::HeaderTag;
use std::io::Write;
use std::string::String;
use tabwriter::TabWriter;

/// Print a [`HeaderStack`].
pub fn print_headers(hdrs: &HeaderStack) -> std::io::Result<()> {
    print_headers_into(&mut std::io::stdout(), hdrs)
}

/// Print a [`HeaderStack`], outermost header first.
pub fn print_headers_into(
    writer: &mut impl Write,
    hdrs: &HeaderStack,
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);

    writeln!(t, "Headers")?;
    write_hrb(&mut t)?;
    writeln!(t, "IDX\tKIND\tTTL\tFIELDS")?;
    write_hr(&mut t)?;
    for (i, tag) in hdrs.iter().enumerate() {
        let ttl = match tag.ttl() {
            Some(ttl) => ttl.to_string(),
            None => String::from("-"),
        };
        writeln!(t, "{i}\t{}\t{ttl}\t{}", tag.kind(), tag_fields(tag))?;
    }
    t.flush()
}

fn tag_fields(tag: &HeaderTag) -> String {
    match tag {
        HeaderTag::Ether(eth) => format!(
            "dst={} src={} type={:04X}",
            eth.dst, eth.src, eth.ether_type
        ),
        HeaderTag::Vlan(vlan) => format!(
            "vid={} pcp={} type={:04X}",
            vlan.vid, vlan.pcp, vlan.ether_type
        ),
        HeaderTag::Mpls(mpls) => {
            let labels = mpls
                .entries()
                .iter()
                .map(|e| {
                    format!(
                        "{}/tc={}/ttl={}{}",
                        e.label,
                        e.tc,
                        e.ttl,
                        if e.bos { "/bos" } else { "" }
                    )
                })
                .join(",");
            format!("type={:04X} labels=[{labels}]", mpls.ether_type)
        }
        HeaderTag::Ipv4(ip4) => format!(
            "src={} dst={} proto={} dscp={} ecn={}",
            ip4.src, ip4.dst, ip4.proto, ip4.dscp, ip4.ecn
        ),
    }
}

/// Print an [`ActionSet`].
pub fn print_action_set(set: &ActionSet) -> std::io::Result<()> {
    print_action_set_into(&mut std::io::stdout(), set)
}

/// Print an [`ActionSet`] in the order its actions would be applied.
pub fn print_action_set_into(
    writer: &mut impl Write,
    set: &ActionSet,
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);

    writeln!(t, "Action Set")?;
    write_hrb(&mut t)?;
    writeln!(t, "SLOT\tACTION")?;
    write_hr(&mut t)?;
    for action in set {
        writeln!(t, "{}\t{action}", ActionSlot::from(action))?;
    }
    t.flush()
}

/// Print a horizontal rule in bold.
pub fn write_hrb(t: &mut impl Write) -> std::io::Result<()> {
    writeln!(t, "{:=<70}", "=")
}

/// Print a horizontal rule.
pub fn write_hr(t: &mut impl Write) -> std::io::Result<()> {
    writeln!(t, "{:-<70}", "-")
}
