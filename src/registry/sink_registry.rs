use std::fmt;

use crate::error::RegistryError;
use crate::log::{log_level::LogLevel, log_sink::LogSink};

/// Number of sink slots when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 32;

/// Longest accepted sink name, in bytes.
pub const MAX_SINK_NAME_LEN: usize = 31;

/// Stable slot index of a registered sink.
///
/// Ids are never renumbered: removing a sink frees its slot without moving
/// any other entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(usize);

impl SinkId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered sink together with its name and level threshold.
pub struct SinkEntry {
    id: SinkId,
    name: String,
    min_level: LogLevel,
    sink: Box<dyn LogSink>,
}

impl SinkEntry {
    #[must_use]
    pub fn id(&self) -> SinkId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    #[must_use]
    pub fn generation(&self) -> Option<u32> {
        self.sink.generation()
    }

    /// Whether an event at `level` passes this sink's filter.
    #[inline]
    #[must_use]
    pub fn accepts(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    #[must_use]
    pub fn info(&self) -> SinkInfo {
        SinkInfo {
            id: self.id,
            name: self.name.clone(),
            min_level: self.min_level,
            generation: self.generation(),
        }
    }

    /// Consumes the entry and hands back the sink it held.
    #[must_use]
    pub fn into_sink(self) -> Box<dyn LogSink> {
        self.sink
    }

    pub(crate) fn parts_mut(&mut self) -> (&str, &mut dyn LogSink) {
        (&self.name, self.sink.as_mut())
    }
}

impl fmt::Debug for SinkEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

/// Owned snapshot of a registry entry, safe to hand out past the lock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkInfo {
    pub id: SinkId,
    pub name: String,
    pub min_level: LogLevel,
    pub generation: Option<u32>,
}

/// Fixed-capacity table of named sinks.
///
/// Enumeration follows registration order, which is tracked separately from
/// slot indices: a sink registered into a slot freed earlier still comes
/// after every sink that was already live.
pub struct SinkRegistry {
    slots: Vec<Option<SinkEntry>>,
    order: Vec<SinkId>,
}

impl SinkRegistry {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            order: Vec::with_capacity(capacity),
        }
    }

    /// Registers `sink` under a unique `name` in the first free slot.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::InvalidName`] - `name` is empty.
    /// * [`RegistryError::NameTooLong`] - `name` exceeds [`MAX_SINK_NAME_LEN`] bytes.
    /// * [`RegistryError::DuplicateName`] - a live sink already uses `name`.
    /// * [`RegistryError::CapacityExceeded`] - every slot is taken.
    pub fn register(
        &mut self,
        name: &str,
        min_level: LogLevel,
        sink: Box<dyn LogSink>,
    ) -> Result<SinkId, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::InvalidName);
        }
        if name.len() > MAX_SINK_NAME_LEN {
            return Err(RegistryError::NameTooLong {
                name: name.to_string(),
                max: MAX_SINK_NAME_LEN,
            });
        }
        if self.iter().any(|e| e.name == name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }

        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(RegistryError::CapacityExceeded(self.slots.len()))?;

        let id = SinkId(index);
        self.slots[index] = Some(SinkEntry {
            id,
            name: name.to_string(),
            min_level,
            sink,
        });
        self.order.push(id);
        Ok(id)
    }

    /// Frees the slot held by `id` and returns its entry.
    pub fn remove(&mut self, id: SinkId) -> Result<SinkEntry, RegistryError> {
        let entry = self
            .slots
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(RegistryError::NotFound)?;
        self.order.retain(|live| *live != id);
        Ok(entry)
    }

    pub fn find_by_name(&self, name: &str) -> Result<&SinkEntry, RegistryError> {
        self.iter()
            .find(|e| e.name == name)
            .ok_or(RegistryError::NotFound)
    }

    #[must_use]
    pub fn get(&self, id: SinkId) -> Option<&SinkEntry> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn set_min_level(&mut self, id: SinkId, min_level: LogLevel) -> Result<(), RegistryError> {
        let entry = self
            .slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(RegistryError::NotFound)?;
        entry.min_level = min_level;
        Ok(())
    }

    /// Live entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SinkEntry> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.slots.get(id.0).and_then(Option::as_ref))
    }

    /// Visits live entries mutably, in registration order.
    pub(crate) fn for_each_live_mut(&mut self, mut f: impl FnMut(&mut SinkEntry)) {
        for id in &self.order {
            if let Some(entry) = self.slots.get_mut(id.0).and_then(Option::as_mut) {
                f(entry);
            }
        }
    }

    /// Removes every entry, returning them in registration order.
    pub fn drain(&mut self) -> Vec<SinkEntry> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|id| self.slots.get_mut(id.0).and_then(Option::take))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkRegistry")
            .field("capacity", &self.capacity())
            .field("live", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}
