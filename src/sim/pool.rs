//! Entity arena with per-kind free lists
//!
//! Entities are never dropped. Releasing one parks its slot on the free list
//! for its kind; acquiring pops from that list before growing the arena.

use super::state::{Entity, EntityKind};

/// Index of an entity slot in the arena
pub type EntityId = usize;

#[derive(Debug, Clone, Default)]
pub struct Pool {
    slots: Vec<Entity>,
    free: [Vec<EntityId>; EntityKind::COUNT],
    /// Live ids in spawn order
    active: Vec<EntityId>,
}

impl Pool {
    /// Check out an entity of `kind`, reusing a free slot when one exists
    pub fn acquire(&mut self, kind: EntityKind) -> EntityId {
        let id = match self.free[kind.index()].pop() {
            Some(id) => id,
            None => {
                self.slots.push(Entity::new(kind));
                self.slots.len() - 1
            }
        };

        let entity = &mut self.slots[id];
        entity.clear();
        entity.pos.y = kind.height();
        entity.active = true;
        self.active.push(id);
        id
    }

    /// Return an entity to its free list. Releasing an inactive id is a no-op.
    pub fn release(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.slots.get_mut(id) else {
            return false;
        };
        if !entity.active {
            return false;
        }
        entity.clear();
        let kind = entity.kind;

        if let Some(pos) = self.active.iter().position(|&a| a == id) {
            self.active.remove(pos);
        }
        self.free[kind.index()].push(id);
        true
    }

    /// Release every live entity matching `pred`; returns how many went back
    pub fn release_where(&mut self, pred: impl Fn(&Entity) -> bool) -> usize {
        let doomed: Vec<EntityId> = self
            .active
            .iter()
            .copied()
            .filter(|&id| pred(&self.slots[id]))
            .collect();
        for &id in &doomed {
            self.release(id);
        }
        doomed.len()
    }

    pub fn release_all(&mut self) {
        for id in std::mem::take(&mut self.active) {
            let entity = &mut self.slots[id];
            entity.clear();
            self.free[entity.kind.index()].push(id);
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id).filter(|e| e.active)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(id).filter(|e| e.active)
    }

    pub fn is_active(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn is_free(&self, id: EntityId) -> bool {
        self.slots
            .get(id)
            .is_some_and(|e| self.free[e.kind.index()].contains(&id))
    }

    /// Live ids in spawn order
    pub fn active_ids(&self) -> &[EntityId] {
        &self.active
    }

    /// Copy the live ids into `out` so the pool can be mutated while iterating
    pub fn ids_into(&self, out: &mut Vec<EntityId>) {
        out.clear();
        out.extend_from_slice(&self.active);
    }

    pub fn iter_active(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.active.iter().map(|&id| (id, &self.slots[id]))
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn active_count_of(&self, kind: EntityKind) -> usize {
        self.iter_active().filter(|(_, e)| e.kind == kind).count()
    }

    pub fn free_count(&self, kind: EntityKind) -> usize {
        self.free[kind.index()].len()
    }

    /// Slots ever allocated
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
