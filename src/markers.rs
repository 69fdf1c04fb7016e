// src/markers.rs
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    #[error("No map marker registered for workout ID {0}")]
    NotFound(String),
}

/// Side table from workout id to the renderer's marker handle.
///
/// The index never disposes of a handle itself; callers retire handles through the
/// renderer before replacing or after removing them.
#[derive(Debug)]
pub struct MarkerIndex<H> {
    entries: Vec<(String, H)>,
}

impl<H> Default for MarkerIndex<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<H> MarkerIndex<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `handle` for `id`, replacing an existing handle in place.
    pub fn upsert(&mut self, id: &str, handle: H) {
        match self.entries.iter_mut().find(|(entry_id, _)| entry_id == id) {
            Some((_, existing)) => *existing = handle,
            None => self.entries.push((id.to_string(), handle)),
        }
    }

    /// Removes and returns the handle for `id` so the caller can dispose of it.
    /// # Errors
    /// Returns `MarkerError::NotFound` if `id` has no handle.
    pub fn remove_and_return(&mut self, id: &str) -> Result<H, MarkerError> {
        let index = self
            .entries
            .iter()
            .position(|(entry_id, _)| entry_id == id)
            .ok_or_else(|| MarkerError::NotFound(id.to_string()))?;
        Ok(self.entries.swap_remove(index).1)
    }

    /// Drains every handle for bulk disposal.
    pub fn remove_all(&mut self) -> Vec<H> {
        self.entries.drain(..).map(|(_, handle)| handle).collect()
    }

    pub fn get(&self, id: &str) -> Option<&H> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, handle)| handle)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
