// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The action list executor.
//!
//! An action list (OpenFlow's apply-actions instruction) is applied in
//! order, each action seeing the packet as the previous one left it.
//! Output and group actions dispatch a snapshot of the packet as it
//! stands at that point and record the dispatch as a [`SideEffect`].
//!
//! The only way a list stops early is a TTL decrement on a header
//! whose TTL is already zero. A copy of the packet is then handed to
//! the controller with [`PacketInReason::InvalidTtl`] and the rest of
//! the list is abandoned.

use super::ActionCtx;
use super::packet::Packet;
use super::tag;
use super::ttl;
use super::ttl::CopyDir;
use crate::LogLevel;
use crate::d_error::DError;
use crate::d_error::ErrorTrace;
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Display;
use itertools::Itertools;
use ofswitch_api::Action;
use ofswitch_api::GroupId;
use ofswitch_api::HeaderKind;
use ofswitch_api::PacketInReason;
use ofswitch_api::PortNo;
use serde::Deserialize;
use serde::Serialize;

/// How many error layers make it into a log line.
const ERROR_TRACE_DEPTH: usize = 4;

/// A header kind carrying a TTL.
#[derive(
    Clone, Copy, Debug, DError, Deserialize, Eq, PartialEq, Serialize,
)]
pub enum TtlHeader {
    Mpls,
    Ipv4,
}

impl TtlHeader {
    pub fn kind(&self) -> HeaderKind {
        match self {
            Self::Mpls => HeaderKind::Mpls,
            Self::Ipv4 => HeaderKind::Ipv4,
        }
    }
}

impl Display for TtlHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

#[derive(Clone, Copy, Debug, DError, Eq, PartialEq, thiserror::Error)]
pub enum ActionError {
    /// A TTL decrement found the TTL already at zero.
    #[error("invalid TTL on {0} header")]
    InvalidTtl(TtlHeader),
}

/// A dispatch made while applying actions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SideEffect {
    Output { port: PortNo, packet: Packet },
    GroupApply { group_id: GroupId, packet: Packet },
}

impl SideEffect {
    pub fn packet(&self) -> &Packet {
        match self {
            Self::Output { packet, .. } => packet,
            Self::GroupApply { packet, .. } => packet,
        }
    }
}

impl Display for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Output { port, .. } => write!(f, "output:{port}"),
            Self::GroupApply { group_id, .. } => write!(f, "group:{group_id}"),
        }
    }
}

/// Apply `actions` to `pkt` in order.
///
/// On success, return the modified packet along with the side effects
/// of every output and group action, in the order they were applied.
///
/// # Errors
///
/// [`ActionError::InvalidTtl`] if a TTL decrement meets a zero TTL.
/// The packet has already been redirected to the controller by the
/// time this is returned, and no action after the failing one has been
/// applied.
pub fn apply_list(
    ctx: &ActionCtx,
    mut pkt: Packet,
    actions: &[Action],
) -> Result<(Packet, Vec<SideEffect>), ActionError> {
    let mut effects = Vec::new();

    for action in actions {
        apply_action(ctx, &mut pkt, action, &mut effects)?;
    }

    Ok((pkt, effects))
}

fn apply_action(
    ctx: &ActionCtx,
    pkt: &mut Packet,
    action: &Action,
    effects: &mut Vec<SideEffect>,
) -> Result<(), ActionError> {
    match *action {
        Action::Output { port } => {
            send(ctx, pkt.clone(), port);
            effects.push(SideEffect::Output { port, packet: pkt.clone() });
        }

        Action::Group { group_id } => {
            ctx.groups.apply(group_id, pkt.clone());
            let packet = pkt.clone();
            effects.push(SideEffect::GroupApply { group_id, packet });
        }

        Action::SetQueue { queue_id } => pkt.queue_id = Some(queue_id),

        Action::SetMplsTtl { ttl } => {
            ttl::set_ttl(&mut pkt.headers, TtlHeader::Mpls, ttl);
        }

        Action::DecMplsTtl => dec_ttl(ctx, pkt, TtlHeader::Mpls)?,

        Action::SetNwTtl { ttl } => {
            ttl::set_ttl(&mut pkt.headers, TtlHeader::Ipv4, ttl);
        }

        Action::DecNwTtl => dec_ttl(ctx, pkt, TtlHeader::Ipv4)?,

        Action::CopyTtlOut => copy_ttl(ctx, pkt, CopyDir::Out),

        Action::CopyTtlIn => copy_ttl(ctx, pkt, CopyDir::In),

        Action::PushVlan { ether_type } => {
            tag::push_vlan(
                &mut pkt.headers,
                ether_type,
                &ctx.cfg.vlan_defaults,
            );
        }

        Action::PopVlan => tag::pop_vlan(&mut pkt.headers),

        Action::PushMpls { ether_type } => {
            tag::push_mpls(&mut pkt.headers, ether_type);
        }

        Action::PopMpls => tag::pop_mpls(&mut pkt.headers),

        Action::SetField { field } => pkt.headers.set_field(&field),

        Action::Experimenter { .. } => (),
    }

    Ok(())
}

fn send(ctx: &ActionCtx, pkt: Packet, port: PortNo) {
    if let Err(e) = ctx.ports.send(pkt, port) {
        ctx.ectx.log.log(LogLevel::Warn, &format!("output to {port}: {e}"));
    }
}

fn dec_ttl(
    ctx: &ActionCtx,
    pkt: &mut Packet,
    hdr: TtlHeader,
) -> Result<(), ActionError> {
    if let Err(e) = ttl::dec_ttl(&mut pkt.headers, hdr) {
        redirect_to_controller(ctx, pkt, &e);
        return Err(e);
    }

    Ok(())
}

fn redirect_to_controller(ctx: &ActionCtx, pkt: &Packet, err: &ActionError) {
    let controller = ctx.cfg.controller;
    let trace = match ErrorTrace::<ERROR_TRACE_DEPTH>::from_err(err) {
        Ok(trace) => trace,
        Err(trace) => trace,
    };

    ctx.ectx.log.log(
        LogLevel::Note,
        &format!(
            "{trace}: packet from port {} sent to {controller}",
            pkt.in_port()
        ),
    );

    let mut copy = pkt.clone();
    copy.packet_in_reason = Some(PacketInReason::InvalidTtl);
    send(ctx, copy, controller);
}

fn copy_ttl(ctx: &ActionCtx, pkt: &mut Packet, dir: CopyDir) {
    if ttl::copy_ttl(&mut pkt.headers, dir) || !ctx.cfg.log_undefined_copy_ttl
    {
        return;
    }

    let action = match dir {
        CopyDir::Out => Action::CopyTtlOut,
        CopyDir::In => Action::CopyTtlIn,
    };
    let layout = pkt.headers.iter().map(|tag| tag.kind()).join("/");

    ctx.ectx.log.log(
        LogLevel::Note,
        &format!("{action} undefined for headers [{layout}], ignored"),
    );
}
