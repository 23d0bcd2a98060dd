//! Typed CRUD repositories over the collection store.
//!
//! Every operation is a whole-collection read-modify-write; there are no
//! sub-record partial updates. Cascade rules: deleting a workout deletes
//! its sets, deleting a supplement deletes its intakes, deleting an
//! exercise deletes nothing else (historical sets orphan by design).

use crate::store::{keys, Store};
use crate::types::*;
use crate::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use uuid::Uuid;

/// A record persisted in a named collection.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const KEY: &'static str;
    fn id(&self) -> &str;
}

macro_rules! impl_record {
    ($ty:ty, $key:expr) => {
        impl Record for $ty {
            const KEY: &'static str = $key;
            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

impl_record!(Exercise, keys::EXERCISES);
impl_record!(Template, keys::TEMPLATES);
impl_record!(WorkoutLocation, keys::LOCATIONS);
impl_record!(Workout, keys::WORKOUTS);
impl_record!(WorkoutSet, keys::SETS);
impl_record!(Supplement, keys::SUPPLEMENTS);
impl_record!(SupplementIntake, keys::INTAKES);
impl_record!(Routine, keys::ROUTINES);

/// Generic typed view of one collection.
pub struct Collection<'a, T: Record> {
    store: &'a Store,
    _marker: PhantomData<T>,
}

impl<'a, T: Record> Collection<'a, T> {
    fn new(store: &'a Store) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub fn list(&self) -> Vec<T> {
        self.store.get(T::KEY, Vec::new())
    }

    pub fn find(&self, id: &str) -> Option<T> {
        self.list().into_iter().find(|r| r.id() == id)
    }

    pub fn add(&self, record: T) -> Result<()> {
        let mut all = self.list();
        all.push(record);
        self.replace_all(&all)
    }

    /// Replace the record with the same id. Returns false if none matched.
    pub fn update(&self, record: T) -> Result<bool> {
        let mut all = self.list();
        let Some(slot) = all.iter_mut().find(|r| r.id() == record.id()) else {
            return Ok(false);
        };
        *slot = record;
        self.replace_all(&all)?;
        Ok(true)
    }

    /// Delete by id. Returns false if the id was not present.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut all = self.list();
        let before = all.len();
        all.retain(|r| r.id() != id);
        if all.len() == before {
            return Ok(false);
        }
        self.replace_all(&all)?;
        Ok(true)
    }

    pub fn replace_all(&self, records: &[T]) -> Result<()> {
        self.store.set(T::KEY, &records)
    }
}

/// Facade over all domain collections plus the settings record.
pub struct Repositories<'a> {
    store: &'a Store,
}

impl<'a> Repositories<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn exercises(&self) -> Collection<'a, Exercise> {
        Collection::new(self.store)
    }
    pub fn templates(&self) -> Collection<'a, Template> {
        Collection::new(self.store)
    }
    pub fn locations(&self) -> Collection<'a, WorkoutLocation> {
        Collection::new(self.store)
    }
    pub fn workouts(&self) -> Collection<'a, Workout> {
        Collection::new(self.store)
    }
    pub fn sets(&self) -> Collection<'a, WorkoutSet> {
        Collection::new(self.store)
    }
    pub fn supplements(&self) -> Collection<'a, Supplement> {
        Collection::new(self.store)
    }
    pub fn intakes(&self) -> Collection<'a, SupplementIntake> {
        Collection::new(self.store)
    }
    pub fn routines(&self) -> Collection<'a, Routine> {
        Collection::new(self.store)
    }

    pub fn settings(&self) -> UserSettings {
        self.store.get(keys::SETTINGS, UserSettings::default())
    }

    pub fn save_settings(&self, settings: &UserSettings) -> Result<()> {
        self.store.set(keys::SETTINGS, settings)
    }

    /// Add a user-created exercise. Assigns an id when empty and always
    /// marks the record custom.
    pub fn add_exercise(&self, mut exercise: Exercise) -> Result<Exercise> {
        if exercise.id.is_empty() {
            exercise.id = Uuid::new_v4().to_string();
        }
        exercise.is_custom = true;
        self.exercises().add(exercise.clone())?;
        Ok(exercise)
    }

    /// Add a location at the end of the sort order.
    pub fn add_location(&self, name: &str) -> Result<WorkoutLocation> {
        let locations = self.locations();
        let sort_order = next_sort_order(locations.list().iter().map(|l| l.sort_order));
        let location = WorkoutLocation {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            sort_order,
        };
        locations.add(location.clone())?;
        Ok(location)
    }

    /// Add a supplement at the end of the sort order.
    pub fn add_supplement(&self, name: &str) -> Result<Supplement> {
        let supplements = self.supplements();
        let sort_order = next_sort_order(supplements.list().iter().map(|s| s.sort_order));
        let supplement = Supplement {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            sort_order,
            is_active: true,
        };
        supplements.add(supplement.clone())?;
        Ok(supplement)
    }

    /// Start a new workout session.
    pub fn start_workout(
        &self,
        template_id: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Workout> {
        let workout = Workout {
            id: Uuid::new_v4().to_string(),
            started_at: at,
            completed_at: None,
            template_id,
        };
        self.workouts().add(workout.clone())?;
        Ok(workout)
    }

    /// Mark a workout complete. Returns false if the id is unknown.
    pub fn finish_workout(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        let Some(mut workout) = self.workouts().find(id) else {
            return Ok(false);
        };
        workout.completed_at = Some(at);
        self.workouts().update(workout)
    }

    /// Log a set against a workout.
    pub fn log_set(
        &self,
        workout_id: &str,
        exercise_id: &str,
        reps: u32,
        weight: f64,
        at: DateTime<Utc>,
    ) -> Result<WorkoutSet> {
        let set = WorkoutSet {
            id: Uuid::new_v4().to_string(),
            workout_id: workout_id.into(),
            exercise_id: exercise_id.into(),
            reps,
            weight,
            logged_at: at,
        };
        self.sets().add(set.clone())?;
        Ok(set)
    }

    /// Delete a workout and cascade to its sets. Returns false if the
    /// workout id was unknown (no sets are touched in that case).
    pub fn delete_workout(&self, id: &str) -> Result<bool> {
        if !self.workouts().delete(id)? {
            return Ok(false);
        }

        let sets = self.sets();
        let remaining: Vec<WorkoutSet> = sets
            .list()
            .into_iter()
            .filter(|s| s.workout_id != id)
            .collect();
        if let Err(e) = sets.replace_all(&remaining) {
            // Parent is gone but dependents remain; surface for a repair pass.
            tracing::error!(
                "Workout {} deleted but its sets could not be removed: {}",
                id,
                e
            );
            return Err(e);
        }
        Ok(true)
    }

    /// Delete a supplement and cascade to its intakes.
    pub fn delete_supplement(&self, id: &str) -> Result<bool> {
        if !self.supplements().delete(id)? {
            return Ok(false);
        }

        let intakes = self.intakes();
        let remaining: Vec<SupplementIntake> = intakes
            .list()
            .into_iter()
            .filter(|i| i.supplement_id != id)
            .collect();
        if let Err(e) = intakes.replace_all(&remaining) {
            tracing::error!(
                "Supplement {} deleted but its intakes could not be removed: {}",
                id,
                e
            );
            return Err(e);
        }
        Ok(true)
    }

    /// Delete an exercise. Historical sets referencing it are preserved and
    /// render as orphaned.
    pub fn delete_exercise(&self, id: &str) -> Result<bool> {
        self.exercises().delete(id)
    }

    /// Record an intake for a supplement on a date. At most one intake per
    /// (supplement, day); returns false if one already exists.
    pub fn log_intake(&self, supplement_id: &str, date: NaiveDate) -> Result<bool> {
        let intakes = self.intakes();
        let already = intakes
            .list()
            .iter()
            .any(|i| i.supplement_id == supplement_id && i.date == date);
        if already {
            return Ok(false);
        }
        intakes.add(SupplementIntake {
            id: Uuid::new_v4().to_string(),
            supplement_id: supplement_id.into(),
            date,
        })?;
        Ok(true)
    }

    /// Activate one routine, deactivating all others. Returns false if the
    /// id is unknown (nothing is changed).
    pub fn set_active_routine(&self, id: &str) -> Result<bool> {
        let routines = self.routines();
        let mut all = routines.list();
        if !all.iter().any(|r| r.id == id) {
            return Ok(false);
        }
        for routine in &mut all {
            routine.is_active = routine.id == id;
        }
        routines.replace_all(&all)?;
        Ok(true)
    }

    /// The currently active routine, if any.
    pub fn active_routine(&self) -> Option<Routine> {
        self.routines().list().into_iter().find(|r| r.is_active)
    }
}

fn next_sort_order(orders: impl Iterator<Item = u32>) -> u32 {
    orders.max().map(|max| max + 1).unwrap_or(0)
}
