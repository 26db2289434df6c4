//! One-dimensional packing of plugin slots along the panel.
//!
//! Fixed plugins get their preferred size. Expandable plugins get their
//! minimum plus an equal share of whatever is left. When demand exceeds the
//! panel length, plugins are truncated or hidden starting from the highest
//! ordinal until everything fits.

use serde::Serialize;

use crate::modules::panel::plugin::SizeHint;

/// How much of a plugin made it onto the panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotVisibility {
    #[default]
    Visible,
    /// Shown smaller than preferred, but at least its minimum.
    Truncated,
    Hidden,
}

/// Packed size of one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedSlot {
    pub size: i32,
    pub visibility: SlotVisibility,
}

/// Result of packing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Packing {
    /// One entry per input hint, same order.
    pub slots: Vec<PackedSlot>,

    /// Some plugins were truncated or hidden.
    pub overflow: bool,
}

/// Size a plugin asks for before leftover space is shared out.
const fn base_size(hint: &SizeHint) -> i32 {
    let minimum = if hint.minimum > 0 { hint.minimum } else { 0 };
    if hint.expandable {
        minimum
    } else if hint.preferred > minimum {
        hint.preferred
    } else {
        minimum
    }
}

/// Pack `hints` (in ordinal order) into `available` pixels.
#[must_use]
pub fn pack(available: i32, hints: &[SizeHint]) -> Packing {
    let available = available.max(0);
    let mut slots: Vec<PackedSlot> = hints
        .iter()
        .map(|hint| PackedSlot {
            size: base_size(hint),
            visibility: SlotVisibility::Visible,
        })
        .collect();

    let demand: i64 = slots.iter().map(|s| i64::from(s.size)).sum();
    let available_wide = i64::from(available);

    if demand <= available_wide {
        share_leftover(&mut slots, hints, available_wide - demand);
        return Packing {
            slots,
            overflow: false,
        };
    }

    let mut excess = demand - available_wide;
    for (slot, hint) in slots.iter_mut().zip(hints).rev() {
        if excess <= 0 {
            break;
        }
        if slot.size == 0 {
            continue;
        }
        let reducible = i64::from(slot.size - hint.minimum.clamp(0, slot.size));
        if reducible >= excess {
            // excess < slot.size here, so it fits in i32
            slot.size -= i32::try_from(excess).unwrap_or(slot.size);
            slot.visibility = SlotVisibility::Truncated;
            excess = 0;
        } else {
            excess -= i64::from(slot.size);
            slot.size = 0;
            slot.visibility = SlotVisibility::Hidden;
        }
    }

    Packing {
        slots,
        overflow: true,
    }
}

/// Split `leftover` equally among expandable slots; the first ones get the remainder.
fn share_leftover(slots: &mut [PackedSlot], hints: &[SizeHint], leftover: i64) {
    let expandable = hints.iter().filter(|h| h.expandable).count();
    if expandable == 0 || leftover <= 0 {
        return;
    }
    let count = i64::try_from(expandable).unwrap_or(i64::MAX);
    let share = leftover / count;
    let mut remainder = leftover % count;

    for (slot, _) in slots.iter_mut().zip(hints).filter(|(_, h)| h.expandable) {
        let mut extra = share;
        if remainder > 0 {
            extra += 1;
            remainder -= 1;
        }
        slot.size = slot.size.saturating_add(i32::try_from(extra).unwrap_or(i32::MAX));
    }
}
