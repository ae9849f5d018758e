//! Completion callbacks addressed by generation-checked handles.
//!
//! A handle stays valid until its callback is invoked or invalidated. Reusing
//! a slot bumps its generation, so stale handles are rejected in O(1).

pub type Callback = Box<dyn FnOnce()>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CallbackHandle {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    callback: Option<Callback>,
}

#[derive(Default)]
pub struct CallbackRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, callback: Callback) -> CallbackHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.callback = Some(callback);
            return CallbackHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            callback: Some(callback),
        });
        CallbackHandle {
            index,
            generation: 0,
        }
    }

    fn take(&mut self, handle: CallbackHandle) -> Option<Callback> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let callback = slot.callback.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Some(callback)
    }

    pub fn is_valid(&self, handle: CallbackHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .is_some_and(|s| s.generation == handle.generation && s.callback.is_some())
    }

    /// Run the callback if the handle is still valid. Returns whether it ran.
    pub fn invoke(&mut self, handle: CallbackHandle) -> bool {
        match self.take(handle) {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Drop the callback without running it.
    pub fn invalidate(&mut self, handle: CallbackHandle) -> bool {
        self.take(handle).is_some()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.callback.is_some()).count()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("slots", &self.slots.len())
            .field("live", &self.live_count())
            .finish()
    }
}
