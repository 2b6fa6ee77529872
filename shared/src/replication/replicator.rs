use log::warn;

use crate::{
    messages::{delivery::Channel, net_message::EntityUpdate},
    world::{entity::Entity, entity_table::EntityTable, error::EntityError},
};

/// One replication pass over the sync candidates of `entities`.
///
/// Each channel is serialized and compared byte for byte with what was last
/// sent; unchanged channels are skipped unless the entity was flagged for a
/// forced resend. The returned updates become the new baselines. An entity
/// that fails to serialize is logged and skipped without affecting others.
pub fn collect_updates(entities: &mut EntityTable) -> Vec<EntityUpdate> {
    let mut updates = Vec::new();
    for entity_id in entities.sync_candidates() {
        let Some(entity) = entities.get_mut(&entity_id) else {
            continue;
        };
        match diff_entity(entity) {
            Ok(mut entity_updates) => updates.append(&mut entity_updates),
            Err(error) => warn!("Skipping {} this tick: {}", entity_id, error),
        }
        entity.clear_force_sync();
    }
    updates
}

fn diff_entity(entity: &mut Entity) -> Result<Vec<EntityUpdate>, EntityError> {
    let forced = entity.is_sync_forced();
    // serialize both channels first so a failure leaves the baselines untouched
    let mut candidates = Vec::with_capacity(Channel::ALL.len());
    for channel in Channel::ALL {
        candidates.push((channel, entity.serialize(channel)?));
    }

    let mut updates = Vec::new();
    for (channel, payload) in candidates {
        // a channel with no fields writes nothing
        if payload.is_empty() {
            continue;
        }
        if !forced && entity.baseline(channel) == Some(payload.as_slice()) {
            continue;
        }
        entity.set_baseline(channel, payload.clone());
        updates.push(EntityUpdate {
            entity_id: entity.id(),
            channel,
            payload,
        });
    }
    Ok(updates)
}

/// Every non-empty channel of `entity`, used to bring a newly ready peer up to date
pub fn full_state(entity: &Entity) -> Vec<EntityUpdate> {
    let mut updates = Vec::new();
    for channel in Channel::ALL {
        match entity.full_update(channel) {
            Ok(update) if update.payload.is_empty() => {}
            Ok(update) => updates.push(update),
            Err(error) => warn!("Cannot snapshot {}: {}", entity.id(), error),
        }
    }
    updates
}
