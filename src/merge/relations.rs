//! Copies node and container ids from an attempt's `relatedEntities` into
//! its extra info, where the model expects them.
//!
//! The lookup is positional: slot 0 may only supply `nodeId` and slot 1 may
//! only supply `containerId`. Entries in other positions, or in swapped
//! order, are ignored.

use crate::merge::bucket::MergedRecord;

use serde_json::Value;

pub const NODE_ID: &str = "nodeId";
pub const CONTAINER_ID: &str = "containerId";

const RELATION_SLOTS: [(usize, &str); 2] = [(0, NODE_ID), (1, CONTAINER_ID)];

/// Never fails; unexpected shapes leave the field unpopulated.
pub fn extract_relations(record: &mut MergedRecord) {
    let Some(other_info) = record.other_info.as_mut() else {
        return;
    };
    for (slot, tag) in RELATION_SLOTS {
        if let Some(value) = related_entity(record.related_entities.as_ref(), slot, tag) {
            other_info.insert(tag.to_string(), Value::String(value.to_string()));
        }
    }
}

/// The `entity` of `related[slot]` if that entry's type tag is `tag`
/// (ASCII case-insensitive).
fn related_entity<'a>(related: Option<&'a Value>, slot: usize, tag: &str) -> Option<&'a str> {
    let entry = related?.as_array()?.get(slot)?.as_object()?;
    let kind = entry
        .get("entitytype")
        .or_else(|| entry.get("entityType"))?
        .as_str()?;
    if !kind.eq_ignore_ascii_case(tag) {
        return None;
    }
    entry.get("entity")?.as_str()
}
