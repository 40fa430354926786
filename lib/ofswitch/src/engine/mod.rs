// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The engine proper.
//!
//! Three layers make up the engine. The header stack editor
//! ([`headers`]) provides the lookup and edit primitives over a
//! packet's tag stack. The action list executor ([`actions`]) folds an
//! ordered list of actions over a packet, and the action set resolver
//! ([`action_set`]) drains a deferred action set through the executor
//! one action at a time.
pub mod action_set;
pub mod actions;
pub mod headers;
pub mod packet;
pub mod sink;
mod tag;
mod ttl;

use crate::ExecCtx;
use ofswitch_api::ActionCfg;
use sink::GroupSink;
use sink::PortSink;

/// Everything a single invocation of the engine needs besides the
/// packet itself.
pub struct ActionCtx<'a> {
    pub ectx: &'a ExecCtx,
    pub cfg: &'a ActionCfg,
    pub ports: &'a dyn PortSink,
    pub groups: &'a dyn GroupSink,
}
