// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The action set and its resolver.
//!
//! Flow tables add to a packet's action set through write-actions
//! instructions. The set holds at most one action per [`ActionSlot`],
//! and a later write to an occupied slot replaces the earlier action.
//! When the pipeline ends, [`apply_set()`] applies the set in the fixed
//! order OpenFlow 1.3 gives for it, which is the order the slots are
//! declared in below.

use super::ActionCtx;
use super::actions::ActionError;
use super::actions::SideEffect;
use super::actions::apply_list;
use super::packet::Packet;
use alloc::collections::BTreeMap;
use alloc::collections::btree_map;
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Display;
use core::mem;
use core::slice;
use ofswitch_api::Action;
use ofswitch_api::FieldKind;
use serde::Deserialize;
use serde::Serialize;

/// A position in the action set.
///
/// Slots sort in the order their actions are applied.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub enum ActionSlot {
    CopyTtlIn,
    PopVlan,
    PopMpls,
    PushMpls,
    PushVlan,
    CopyTtlOut,
    DecMplsTtl,
    DecNwTtl,
    SetMplsTtl,
    SetNwTtl,
    SetField(FieldKind),
    SetQueue,
    Experimenter(u32),
    Group,
    Output,
}

impl From<&Action> for ActionSlot {
    fn from(action: &Action) -> Self {
        match action {
            Action::CopyTtlIn => Self::CopyTtlIn,
            Action::PopVlan => Self::PopVlan,
            Action::PopMpls => Self::PopMpls,
            Action::PushMpls { .. } => Self::PushMpls,
            Action::PushVlan { .. } => Self::PushVlan,
            Action::CopyTtlOut => Self::CopyTtlOut,
            Action::DecMplsTtl => Self::DecMplsTtl,
            Action::DecNwTtl => Self::DecNwTtl,
            Action::SetMplsTtl { .. } => Self::SetMplsTtl,
            Action::SetNwTtl { .. } => Self::SetNwTtl,
            Action::SetField { field } => Self::SetField(field.kind()),
            Action::SetQueue { .. } => Self::SetQueue,
            Action::Experimenter { id } => Self::Experimenter(*id),
            Action::Group { .. } => Self::Group,
            Action::Output { .. } => Self::Output,
        }
    }
}

impl Display for ActionSlot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::CopyTtlIn => write!(f, "copy_ttl_in"),
            Self::PopVlan => write!(f, "pop_vlan"),
            Self::PopMpls => write!(f, "pop_mpls"),
            Self::PushMpls => write!(f, "push_mpls"),
            Self::PushVlan => write!(f, "push_vlan"),
            Self::CopyTtlOut => write!(f, "copy_ttl_out"),
            Self::DecMplsTtl => write!(f, "dec_mpls_ttl"),
            Self::DecNwTtl => write!(f, "dec_nw_ttl"),
            Self::SetMplsTtl => write!(f, "set_mpls_ttl"),
            Self::SetNwTtl => write!(f, "set_nw_ttl"),
            Self::SetField(kind) => write!(f, "set_field({kind:?})"),
            Self::SetQueue => write!(f, "set_queue"),
            Self::Experimenter(id) => write!(f, "experimenter({id})"),
            Self::Group => write!(f, "group"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// A packet's deferred actions.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(from = "Vec<Action>", into = "Vec<Action>")]
pub struct ActionSet {
    actions: BTreeMap<ActionSlot, Action>,
}

impl ActionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `action` to the set, returning the action it displaced from
    /// the same slot, if any.
    pub fn write(&mut self, action: Action) -> Option<Action> {
        self.actions.insert(ActionSlot::from(&action), action)
    }

    /// Write each action in turn, so that of several actions for the
    /// same slot the last one stays.
    pub fn write_all<I>(&mut self, actions: I)
    where
        I: IntoIterator<Item = Action>,
    {
        for action in actions {
            self.write(action);
        }
    }

    /// Empty the set (OpenFlow's clear-actions instruction).
    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn remove(&mut self, slot: ActionSlot) -> Option<Action> {
        self.actions.remove(&slot)
    }

    pub fn get(&self, slot: ActionSlot) -> Option<&Action> {
        self.actions.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterate the actions in the order they would be applied.
    pub fn iter(&self) -> btree_map::Values<'_, ActionSlot, Action> {
        self.actions.values()
    }

    /// Remove and return the action that would be applied first.
    pub fn pop_first(&mut self) -> Option<Action> {
        self.actions.pop_first().map(|(_, action)| action)
    }
}

impl Extend<Action> for ActionSet {
    fn extend<I: IntoIterator<Item = Action>>(&mut self, iter: I) {
        self.write_all(iter);
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        let mut set = Self::new();
        set.write_all(iter);
        set
    }
}

impl From<Vec<Action>> for ActionSet {
    fn from(actions: Vec<Action>) -> Self {
        actions.into_iter().collect()
    }
}

impl From<ActionSet> for Vec<Action> {
    fn from(set: ActionSet) -> Self {
        set.actions.into_values().collect()
    }
}

impl<'a> IntoIterator for &'a ActionSet {
    type Item = &'a Action;
    type IntoIter = btree_map::Values<'a, ActionSlot, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// How an action set was resolved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// The set held no group or output action.
    Drop(Packet),

    /// The set ended in a group or output action.
    Effect(SideEffect),
}

/// Apply the packet's action set.
///
/// Actions are taken out of the set one at a time, in slot order, and
/// each is run through [`apply_list()`] on its own. A group action ends
/// resolution, so a coexisting output action is never applied. A set
/// that runs out without reaching a group or output drops the packet.
///
/// # Errors
///
/// Whatever [`apply_list()`] returns for the failing action; no later
/// action in the set is applied.
pub fn apply_set(
    ctx: &ActionCtx,
    mut pkt: Packet,
) -> Result<Resolution, ActionError> {
    let mut set = mem::take(&mut pkt.action_set);

    while let Some(action) = set.pop_first() {
        let terminal =
            matches!(action, Action::Group { .. } | Action::Output { .. });
        let (next, mut effects) =
            apply_list(ctx, pkt, slice::from_ref(&action))?;

        if terminal {
            return Ok(match effects.pop() {
                Some(effect) => Resolution::Effect(effect),
                None => Resolution::Drop(next),
            });
        }

        pkt = next;
    }

    Ok(Resolution::Drop(pkt))
}

#[cfg(test)]
mod test {
    use super::*;
    use ofswitch_api::GroupId;
    use ofswitch_api::PortNo;
    use ofswitch_api::SetField;

    #[test]
    fn iterates_in_priority_order() {
        let set: ActionSet = vec![
            Action::Output { port: PortNo::Port(5) },
            Action::SetQueue { queue_id: 1 },
            Action::Group { group_id: GroupId(9) },
            Action::PushVlan { ether_type: 0x8100 },
            Action::DecNwTtl,
            Action::CopyTtlIn,
            Action::PopMpls,
        ]
        .into();

        let slots: Vec<ActionSlot> = set.iter().map(ActionSlot::from).collect();
        assert_eq!(
            slots,
            [
                ActionSlot::CopyTtlIn,
                ActionSlot::PopMpls,
                ActionSlot::PushVlan,
                ActionSlot::DecNwTtl,
                ActionSlot::SetQueue,
                ActionSlot::Group,
                ActionSlot::Output,
            ]
        );
    }

    #[test]
    fn write_replaces_same_slot() {
        let mut set = ActionSet::new();
        assert_eq!(set.write(Action::SetNwTtl { ttl: 3 }), None);
        assert_eq!(
            set.write(Action::SetNwTtl { ttl: 9 }),
            Some(Action::SetNwTtl { ttl: 3 })
        );
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get(ActionSlot::SetNwTtl),
            Some(&Action::SetNwTtl { ttl: 9 })
        );
    }

    #[test]
    fn set_field_slot_per_field() {
        let mut set = ActionSet::new();
        set.write_all([
            Action::SetField { field: SetField::VlanVid(10) },
            Action::SetField { field: SetField::VlanPcp(2) },
            Action::SetField { field: SetField::VlanVid(20) },
            Action::Experimenter { id: 1 },
            Action::Experimenter { id: 2 },
        ]);
        assert_eq!(set.len(), 4);
        assert_eq!(
            set.get(ActionSlot::SetField(FieldKind::VlanVid)),
            Some(&Action::SetField { field: SetField::VlanVid(20) })
        );
    }

    #[test]
    fn clear_remove_pop() {
        let mut set: ActionSet =
            [Action::PopVlan, Action::Output { port: PortNo::Local }]
                .into_iter()
                .collect();
        assert_eq!(set.pop_first(), Some(Action::PopVlan));
        assert_eq!(
            set.remove(ActionSlot::Output),
            Some(Action::Output { port: PortNo::Local })
        );
        assert!(set.is_empty());

        set.write(Action::DecMplsTtl);
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.pop_first(), None);
    }

    #[test]
    fn serializes_as_ordered_list() {
        let set: ActionSet = ron::from_str(
            "[Output(port: Controller), PopVlan, SetQueue(queue_id: 7)]",
        )
        .unwrap();
        let list: Vec<Action> = set.into();
        assert_eq!(
            list,
            [
                Action::PopVlan,
                Action::SetQueue { queue_id: 7 },
                Action::Output { port: PortNo::Controller },
            ]
        );
    }
}
