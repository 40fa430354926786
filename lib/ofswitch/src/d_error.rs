// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Utility for converting nested enum errors into a list of static
//! strings, so an error chain can be recorded without paying for
//! `fmt` on every layer.

use core::fmt;
use core::fmt::Display;
pub use derror_macro::DError;

/// A trait used for walking chains of errors.
pub trait DError {
    /// Provide the name of an error's discriminant.
    fn discriminant(&self) -> &'static str;

    /// Provide a reference to the next error in the chain.
    fn child(&self) -> Option<&dyn DError>;
}

/// The names of every `enum` discriminant encountered while walking
/// an error chain, outermost first, holding at most `L` of them.
#[derive(Clone, Debug, Default)]
pub struct ErrorTrace<const L: usize> {
    entries: heapless::Vec<&'static str, L>,
    more: bool,
}

/// Signals that an [`ErrorTrace`] could not hold another entry.
#[derive(Clone, Copy, Debug)]
pub struct ErrorTraceFull;

impl<const L: usize> ErrorTrace<L> {
    pub fn new() -> Self {
        Self { entries: heapless::Vec::new(), more: false }
    }

    /// Flatten a nested error into a trace.
    ///
    /// If `err` has more layers than fit, the trace holding the
    /// outermost `L` of them is returned as the error.
    pub fn from_err(err: &dyn DError) -> Result<Self, Self> {
        let mut out = Self::new();

        if out.append(err).is_err() { Err(out) } else { Ok(out) }
    }

    /// Push all layers of an error into the trace.
    pub fn append(&mut self, err: &dyn DError) -> Result<(), ErrorTraceFull> {
        let mut top: Option<&dyn DError> = Some(err);
        while let Some(el) = top {
            self.append_name(el.discriminant())?;
            top = el.child();
        }
        Ok(())
    }

    /// Append a single name to the trace.
    pub fn append_name(
        &mut self,
        name: &'static str,
    ) -> Result<(), ErrorTraceFull> {
        self.entries.push(name).map_err(|_| {
            self.more = true;
            ErrorTraceFull
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether layers were dropped because the trace was full.
    pub fn truncated(&self) -> bool {
        self.more
    }

    pub fn entries(&self) -> &[&'static str] {
        &self.entries
    }
}

impl<const L: usize> Display for ErrorTrace<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, name) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{name}")?;
        }

        if self.more {
            write!(f, "/...")?;
        }

        Ok(())
    }
}
