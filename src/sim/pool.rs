//! Projectile recycling
//!
//! Factions fire several projectiles per tick and each one lives only until
//! its mass runs out, so instances are recycled instead of rebuilt. The pool
//! owns every projectile; callers hold [`ProjectileId`] handles. Growth is
//! unbounded: memory is traded for a flat allocation profile.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::state::Projectile;

/// Handle to a pooled projectile slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectileId(pub u32);

impl ProjectileId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default)]
pub struct ProjectilePool {
    /// `None` marks a slot whose instance was destroyed by `drain`
    slots: Vec<Option<Projectile>>,
    /// Idle instances, oldest first
    idle: VecDeque<ProjectileId>,
    /// O(1) membership for `idle`
    idle_flags: Vec<bool>,
    vacant: Vec<usize>,
    constructed: u64,
}

impl ProjectilePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take an idle projectile, or construct a new one
    ///
    /// The instance keeps whatever state it had when released; the caller
    /// resets it before use.
    pub fn acquire(&mut self) -> ProjectileId {
        if let Some(id) = self.idle.pop_front() {
            self.idle_flags[id.index()] = false;
            return id;
        }

        self.constructed += 1;
        let index = match self.vacant.pop() {
            Some(index) => {
                self.slots[index] = Some(Projectile::default());
                index
            }
            None => {
                self.slots.push(Some(Projectile::default()));
                self.idle_flags.push(false);
                self.slots.len() - 1
            }
        };
        log::trace!("Projectile slot {} constructed", index);
        ProjectileId(index as u32)
    }

    /// Return a projectile to the idle set
    ///
    /// Returns false if it was already idle or the handle is dead; a double
    /// despawn therefore never yields duplicate idle entries.
    pub fn release(&mut self, id: ProjectileId) -> bool {
        let index = id.index();
        if !matches!(self.slots.get(index), Some(Some(_))) {
            log::warn!("Release of dead projectile slot {}", index);
            return false;
        }
        if self.idle_flags[index] {
            return false;
        }
        self.idle_flags[index] = true;
        self.idle.push_back(id);
        true
    }

    /// Destroy every idle instance; returns how many were destroyed
    pub fn drain(&mut self) -> usize {
        let count = self.idle.len();
        for id in self.idle.drain(..) {
            let index = id.index();
            self.slots[index] = None;
            self.idle_flags[index] = false;
            self.vacant.push(index);
        }
        count
    }

    #[inline]
    pub fn is_idle(&self, id: ProjectileId) -> bool {
        self.idle_flags.get(id.index()).copied().unwrap_or(false)
    }

    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ProjectileId) -> Option<&mut Projectile> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Two distinct projectiles at once
    pub fn get_pair_mut(
        &mut self,
        a: ProjectileId,
        b: ProjectileId,
    ) -> Option<(&mut Projectile, &mut Projectile)> {
        let (i, j) = (a.index(), b.index());
        if i == j || i.max(j) >= self.slots.len() {
            return None;
        }
        if i < j {
            let (head, tail) = self.slots.split_at_mut(j);
            Some((head[i].as_mut()?, tail[0].as_mut()?))
        } else {
            let (head, tail) = self.slots.split_at_mut(i);
            Some((tail[0].as_mut()?, head[j].as_mut()?))
        }
    }

    /// Handles of every checked-out projectile, in slot order
    pub fn active_ids(&self) -> Vec<ProjectileId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(i, slot)| slot.is_some() && !self.idle_flags[*i])
            .map(|(i, _)| ProjectileId(i as u32))
            .collect()
    }

    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    /// Checked-out instances
    pub fn active_len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count() - self.idle.len()
    }

    /// Lifetime count of constructed instances
    pub fn constructed(&self) -> u64 {
        self.constructed
    }
}
