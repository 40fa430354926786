// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The action-processing core of a software OpenFlow switch.
//!
//! Given a [`Packet`](engine::packet::Packet) whose headers have
//! already been parsed into a stack of tags, the engine applies
//! OpenFlow actions to it, either as an ordered action list
//! ([`engine::actions::apply_list`]) or as a deferred action set
//! ([`engine::action_set::apply_set`]). Dispatch to ports and groups
//! is delegated to the caller through the [`engine::sink`] traits.

#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::len_without_is_empty)]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

#[macro_use]
extern crate alloc;

#[macro_use]
extern crate cfg_if;

use alloc::boxed::Box;

pub use ofswitch_api as api;

pub mod d_error;
pub mod engine;
#[cfg(any(feature = "std", test))]
pub mod print;
pub mod provider;

pub use provider::*;

/// The execution context for the engine.
///
/// The `ExecCtx` provides implementations of platform services the
/// engine relies on but does not own, such as logging.
pub struct ExecCtx {
    pub log: Box<dyn LogProvider>,
}
