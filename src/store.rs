// src/store.rs
use thiserror::Error;

use crate::workout::Workout;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Workout not found: ID {0}")]
    NotFound(String),
    #[error("A workout with ID {0} already exists")]
    DuplicateId(String),
}

/// The canonical, insertion-ordered collection of workouts.
#[derive(Debug, Default, Clone)]
pub struct WorkoutStore {
    workouts: Vec<Workout>,
}

impl WorkoutStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            workouts: Vec::new(),
        }
    }

    /// Appends a workout.
    /// # Errors
    /// Returns `StoreError::DuplicateId` if the id is already taken.
    pub fn add(&mut self, workout: Workout) -> Result<(), StoreError> {
        if self.contains(workout.id()) {
            return Err(StoreError::DuplicateId(workout.id().to_string()));
        }
        self.workouts.push(workout);
        Ok(())
    }

    /// Swaps the workout with `id` for `workout`, keeping its position.
    /// Returns the record that was replaced.
    /// # Errors
    /// - `StoreError::NotFound` if no workout has `id`.
    /// - `StoreError::DuplicateId` if `workout` carries a different id that is already taken.
    pub fn replace(&mut self, id: &str, workout: Workout) -> Result<Workout, StoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if workout.id() != id && self.contains(workout.id()) {
            return Err(StoreError::DuplicateId(workout.id().to_string()));
        }
        Ok(std::mem::replace(&mut self.workouts[index], workout))
    }

    /// Removes the workout with `id`, keeping the order of the rest.
    /// # Errors
    /// Returns `StoreError::NotFound` if no workout has `id`.
    pub fn remove(&mut self, id: &str) -> Result<Workout, StoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(self.workouts.remove(index))
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id() == id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Workout> {
        self.workouts.iter_mut().find(|w| w.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Empties the collection, returning what was in it.
    pub fn clear(&mut self) -> Vec<Workout> {
        std::mem::take(&mut self.workouts)
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Workout> {
        self.workouts.iter()
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.workouts.iter().position(|w| w.id() == id)
    }
}
