//! # Multi-Day Grouping Module
//!
//! Cook-once-eat-twice handling: a primary slot is linked to reuse slots
//! that mirror its recipe. Reuse slots carry no candidates of their own;
//! they resolve through the group's primary, so a later selection on the
//! primary cascades automatically. Shopping quantities multiply by the
//! group size while the recipe is counted once.
//!
//! Group operations validate fully before touching the plan; a rejected
//! call leaves the record unchanged.

use log::info;

use crate::error::PlanError;
use crate::model::{MultiDayGroup, SlotKey, WeeklyPlan};

/// Link reuse slots to a primary cook slot
///
/// Fails with `InvalidGroupReference` when the primary has no selected
/// recipe, any involved slot already belongs to a group, the reuse list is
/// empty, repeats a slot or contains the primary. No partial mutation on
/// failure.
pub fn create_group(
    plan: &mut WeeklyPlan,
    primary: SlotKey,
    reuse: &[SlotKey],
) -> Result<(), PlanError> {
    if reuse.is_empty() {
        return Err(PlanError::InvalidGroupReference(
            "a group needs at least one reuse slot".to_string(),
        ));
    }

    let mut deduped = reuse.to_vec();
    deduped.sort();
    deduped.dedup();
    if deduped.len() != reuse.len() {
        return Err(PlanError::InvalidGroupReference(
            "duplicate reuse slots".to_string(),
        ));
    }
    if deduped.contains(&primary) {
        return Err(PlanError::InvalidGroupReference(format!(
            "primary slot {primary} cannot reuse itself"
        )));
    }

    let primary_slot = plan
        .slot(primary)
        .ok_or_else(|| PlanError::InvalidGroupReference(format!("unknown slot {primary}")))?;
    if primary_slot.is_reuse || primary_slot.selected_candidate().is_none() {
        return Err(PlanError::InvalidGroupReference(format!(
            "slot {primary} has no recipe to share"
        )));
    }

    for key in std::iter::once(&primary).chain(reuse.iter()) {
        if plan.group_for(*key).is_some() {
            return Err(PlanError::InvalidGroupReference(format!(
                "slot {key} already belongs to a group"
            )));
        }
    }
    for key in reuse {
        if plan.slot(*key).is_none() {
            return Err(PlanError::InvalidGroupReference(format!(
                "unknown slot {key}"
            )));
        }
    }

    // Validation done, mutate
    for key in reuse {
        if let Some(slot) = plan.slot_mut(*key) {
            slot.is_reuse = true;
            slot.candidates.clear();
            slot.selected = 0;
            slot.group = Some(primary);
        }
    }
    if let Some(slot) = plan.slot_mut(primary) {
        slot.group = Some(primary);
    }
    plan.groups.push(MultiDayGroup {
        primary,
        reuse: reuse.to_vec(),
    });

    info!(
        "Created multi-day group: cook on {primary}, reuse on {} slots",
        reuse.len()
    );
    Ok(())
}

/// Dissolve the group cooked at `primary`
///
/// Reuse slots revert to independent empty slots; the primary keeps its
/// recipe and alternatives.
pub fn clear_group(plan: &mut WeeklyPlan, primary: SlotKey) -> Result<(), PlanError> {
    let position = plan
        .groups
        .iter()
        .position(|g| g.primary == primary)
        .ok_or_else(|| {
            PlanError::InvalidGroupReference(format!("no group cooked at {primary}"))
        })?;
    let group = plan.groups.remove(position);

    for key in &group.reuse {
        if let Some(slot) = plan.slot_mut(*key) {
            slot.is_reuse = false;
            slot.group = None;
            slot.candidates.clear();
            slot.selected = 0;
        }
    }
    if let Some(slot) = plan.slot_mut(primary) {
        slot.group = None;
    }

    info!("Cleared multi-day group cooked at {primary}");
    Ok(())
}
