//! Fixed-capacity event pools.
//!
//! Each event kind lives in its own `EventPool`. Slots are allocated once
//! up front and never move, so a pointer into a slot stays valid for as
//! long as the event occupies it; that is what lets the kernel write into
//! an event's buffers while the operation is in flight.
//!
//! Freed slots go on a LIFO stack and are handed out again before any
//! never-used slot, mirroring the GVThread slot allocator.

use crate::error::{ReactorError, Result};
use crate::event::Event;

/// Slab of `capacity` event slots addressed by `u32` index.
pub struct EventPool<E> {
    slots: Box<[Option<E>]>,
    /// LIFO stack of released slot indices.
    free_stack: Vec<u32>,
    /// Next never-used slot.
    next_fresh: u32,
    live: usize,
}

impl<E: Event> EventPool<E> {
    pub fn new(capacity: usize) -> Self {
        let slots: Vec<Option<E>> = (0..capacity).map(|_| None).collect();
        Self {
            slots: slots.into_boxed_slice(),
            free_stack: Vec::with_capacity(capacity),
            next_fresh: 0,
            live: 0,
        }
    }

    /// Place `event` in a free slot.
    ///
    /// Returns the slot index and a reference to the event at its final
    /// address.
    pub fn insert(&mut self, event: E) -> Result<(u32, &mut E)> {
        let slot = match self.free_stack.pop() {
            Some(slot) => slot,
            None if (self.next_fresh as usize) < self.slots.len() => {
                self.next_fresh += 1;
                self.next_fresh - 1
            }
            None => {
                return Err(ReactorError::PoolExhausted {
                    kind: E::KIND,
                    capacity: self.slots.len(),
                })
            }
        };
        self.live += 1;
        let event = self.slots[slot as usize].insert(event);
        Ok((slot, event))
    }

    #[inline]
    pub fn get(&self, slot: u32) -> Option<&E> {
        self.slots.get(slot as usize)?.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, slot: u32) -> Option<&mut E> {
        self.slots.get_mut(slot as usize)?.as_mut()
    }

    /// Take the event out of `slot` and release the slot.
    pub fn remove(&mut self, slot: u32) -> Option<E> {
        let event = self.slots.get_mut(slot as usize)?.take()?;
        self.free_stack.push(slot);
        self.live -= 1;
        Some(event)
    }

    /// Slot holding the event for `fd`, if any.
    pub fn find_fd(&self, fd: std::os::fd::RawFd) -> Option<u32> {
        self.iter().find(|(_, e)| e.fd() == fd).map(|(slot, _)| slot)
    }

    /// Live events in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &E)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|e| (i as u32, e)))
    }

    /// Remove every live event, in slot order.
    pub fn drain(&mut self) -> Vec<E> {
        let mut out = Vec::with_capacity(self.live);
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Some(event) = slot.take() {
                self.free_stack.push(i as u32);
                out.push(event);
            }
        }
        self.live = 0;
        out
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
