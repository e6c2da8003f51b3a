//! Inventory synchronisation
//!
//! Diffs a freshly scraped batch against the stored inventory, keyed by VIN.
//! Pure functions only: persisting the merged inventory is up to the caller.

use super::ListingRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_REMOVED: &str = "removed";

/// VINs grouped by what a sync will do to them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

fn is_active(record: &ListingRecord) -> bool {
    record.status.as_deref().map_or(true, |s| s == STATUS_ACTIVE)
}

/// Work out which VINs are new, refreshed or gone.
///
/// Incoming records without a VIN are ignored. A VIN seen twice in the
/// incoming batch is added once and updated afterwards.
pub fn plan_sync(existing: &[ListingRecord], incoming: &[ListingRecord]) -> SyncPlan {
    let mut known: HashSet<&str> = existing.iter().filter_map(|r| r.vin.as_deref()).collect();
    let mut incoming_vins: HashSet<&str> = HashSet::new();
    let mut plan = SyncPlan::default();

    for record in incoming {
        let Some(vin) = record.vin.as_deref() else {
            continue;
        };
        incoming_vins.insert(vin);
        if known.insert(vin) {
            plan.added.push(vin.to_string());
        } else {
            plan.updated.push(vin.to_string());
        }
    }

    for record in existing {
        if let Some(vin) = record.vin.as_deref() {
            if is_active(record) && !incoming_vins.contains(vin) {
                plan.removed.push(vin.to_string());
            }
        }
    }

    plan
}

/// Overlay every field `update` carries onto `base`
fn merge_into(base: &mut ListingRecord, update: &ListingRecord) {
    macro_rules! overlay {
        ($($field:ident),*) => {
            $(if update.$field.is_some() { base.$field = update.$field.clone(); })*
        };
    }
    overlay!(title, price, mileage, fuel_type, transmission, year, make, model, status);
    for (key, value) in &update.extra {
        base.extra.insert(key.clone(), value.clone());
    }
}

/// Apply a sync stamped with the current time.
///
/// Existing records keep their order; added records follow in incoming
/// order with status `active`; vanished active records get status `removed`.
pub fn apply_sync(
    existing: &[ListingRecord],
    incoming: &[ListingRecord],
) -> (Vec<ListingRecord>, SyncPlan) {
    apply_sync_at(existing, incoming, Utc::now())
}

/// [`apply_sync`] at a fixed time.
///
/// Added records get `first_seen` and `last_seen`, refreshed records get
/// `last_seen`, removed records get `removed_at`.
pub fn apply_sync_at(
    existing: &[ListingRecord],
    incoming: &[ListingRecord],
    now: DateTime<Utc>,
) -> (Vec<ListingRecord>, SyncPlan) {
    let plan = plan_sync(existing, incoming);

    let mut merged: Vec<ListingRecord> = existing.to_vec();
    let mut position: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.vin.clone().map(|vin| (vin, i)))
        .collect();

    for record in incoming {
        let Some(vin) = record.vin.clone() else {
            continue;
        };
        let known_idx = position.get(&vin).copied();
        match known_idx {
            Some(idx) => {
                merge_into(&mut merged[idx], record);
                merged[idx].last_seen = Some(now);
            }
            None => {
                let mut added = record.clone();
                added.status = Some(STATUS_ACTIVE.to_string());
                added.first_seen = Some(now);
                added.last_seen = Some(now);
                added.removed_at = None;
                position.insert(vin, merged.len());
                merged.push(added);
            }
        }
    }

    let removed: HashSet<&str> = plan.removed.iter().map(String::as_str).collect();
    for record in merged.iter_mut() {
        if record.vin.as_deref().map_or(false, |v| removed.contains(v)) {
            record.status = Some(STATUS_REMOVED.to_string());
            record.removed_at = Some(now);
        }
    }

    debug!(total = merged.len(), "Merged inventory");
    info!(
        added = plan.added.len(),
        updated = plan.updated.len(),
        removed = plan.removed.len(),
        "Inventory sync planned"
    );
    (merged, plan)
}
