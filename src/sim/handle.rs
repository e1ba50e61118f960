//! Generation-stamped handles
//!
//! A handle is an index plus the generation of the slot at insertion time.
//! Removing a body bumps the slot generation, so any handle still held by a
//! stale timer or monitor resolves to "not found" instead of a different body.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RollError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyHandle {
    pub index: u32,
    pub generation: u32,
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Body({}v{})", self.index, self.generation)
    }
}

/// Identifier of one roll session; strictly increasing per `Session`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session({})", self.0)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena addressed by `BodyHandle`
#[derive(Debug, Clone)]
pub struct BodySet<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Default for BodySet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BodySet<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn insert(&mut self, value: T) -> BodyHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return BodyHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        BodyHandle {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, handle: BodyHandle) -> Result<&T, RollError> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
            .ok_or(RollError::InvalidHandle(handle))
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Result<&mut T, RollError> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_mut())
            .ok_or(RollError::InvalidHandle(handle))
    }

    /// Remove the value, invalidating every outstanding handle to it
    pub fn remove(&mut self, handle: BodyHandle) -> Result<T, RollError> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.value.is_some())
            .ok_or(RollError::InvalidHandle(handle))?;
        let value = slot.value.take().ok_or(RollError::InvalidHandle(handle))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Ok(value)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_ok()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live values in slot order (stable across runs)
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(|s| s.value.as_mut())
    }
}
