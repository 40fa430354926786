// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Types shared between the action engine and the pipeline that feeds
//! it: actions, port numbers, header tags, and engine configuration.

#![no_std]
#![allow(clippy::len_without_is_empty)]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[macro_use]
extern crate alloc;

pub mod action;
pub mod cfg;
pub mod field;
pub mod header;
pub mod ip;
pub mod mac;

pub use action::*;
pub use cfg::*;
pub use field::*;
pub use header::*;
pub use ip::*;
pub use mac::*;

/// The OpenFlow wire version whose action semantics this API models
/// (OpenFlow 1.3).
pub const OFP_VERSION: u8 = 0x04;
