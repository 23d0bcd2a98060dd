//! Sequential schema-migration engine.
//!
//! On startup the engine brings the collection set from its last-applied
//! schema version to [`CURRENT_VERSION`] through an ordered chain of pure
//! transforms over raw JSON records. Every step is total and idempotent: it
//! inspects record shape and is a no-op on already-migrated records, so a
//! failed run can safely be retried on the next launch.
//!
//! First run (no `initialized` scalar) skips the chain entirely and seeds
//! every collection directly at the current version from the built-in
//! catalog and historical-import datasets, merged by id.

use crate::catalog::{self, V4_QUALIFIED_TEMPLATES};
use crate::store::{keys, Store};
use crate::{Error, Result, UserSettings};
use serde::Serialize;
use serde_json::{json, Value};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 6;

/// What the engine did on this run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// First run: collections seeded directly at the current version.
    Seeded,
    /// One or more migration steps were applied.
    Migrated { from_version: u32 },
    /// Store was already at the current version.
    UpToDate,
    /// The engine already ran in this process; nothing was done.
    AlreadyRan,
}

/// Startup migration driver.
///
/// Holds an explicit one-shot gate rather than an ambient singleton so
/// tests can construct isolated instances. Concurrent runs could double
/// -merge import data (dedup is by id within a single pass), so `run`
/// refuses to execute twice on the same value.
pub struct Migrator {
    store: Store,
    has_run: bool,
}

impl Migrator {
    pub fn new(store: &Store) -> Self {
        Self {
            store: store.clone(),
            has_run: false,
        }
    }

    /// Bring the store to the current schema version.
    ///
    /// Step failures are logged and stop the chain at that step; collections
    /// already migrated keep their new shape, the stored version is left
    /// untouched, and the next startup retries from there.
    pub fn run(&mut self) -> Result<MigrationOutcome> {
        if self.has_run {
            tracing::warn!("Migration engine invoked twice in one process; ignoring");
            return Ok(MigrationOutcome::AlreadyRan);
        }
        self.has_run = true;

        if !self.store.get(keys::INITIALIZED, false) {
            self.seed_fresh()?;
            self.store.set(keys::INITIALIZED, &true)?;
            self.store.set(keys::MIGRATION_VERSION, &CURRENT_VERSION)?;
            tracing::info!("Seeded fresh store at schema version {}", CURRENT_VERSION);
            return Ok(MigrationOutcome::Seeded);
        }

        let from_version: u32 = self.store.get(keys::MIGRATION_VERSION, 1);
        if from_version >= CURRENT_VERSION {
            tracing::debug!("Store already at schema version {}", from_version);
            return Ok(MigrationOutcome::UpToDate);
        }

        for version in (from_version + 1)..=CURRENT_VERSION {
            if let Err(e) = self.apply_step(version) {
                tracing::error!("Migration step {} failed: {}", version, e);
                return Err(e);
            }
            tracing::info!("Applied migration step {}", version);
        }

        self.store.set(keys::MIGRATION_VERSION, &CURRENT_VERSION)?;
        Ok(MigrationOutcome::Migrated { from_version })
    }

    /// Seed every collection at the current version from built-in data.
    fn seed_fresh(&self) -> Result<()> {
        let catalog = catalog::get_default_catalog();
        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }
        let import = catalog::historical_import();

        let exercises = merge_by_id(to_values(&catalog.exercises)?, to_values(&import.exercises)?);
        self.store.set(keys::EXERCISES, &exercises)?;
        self.store.set(keys::TEMPLATES, &catalog.templates)?;
        self.store.set(keys::LOCATIONS, &catalog.locations)?;
        self.store.set(keys::WORKOUTS, &import.workouts)?;
        self.store.set(keys::SETS, &import.sets)?;
        self.store.set(keys::SETTINGS, &UserSettings::default())?;
        self.store.set(keys::SUPPLEMENTS, &Vec::<Value>::new())?;
        self.store.set(keys::INTAKES, &Vec::<Value>::new())?;
        self.store.set(keys::ROUTINES, &Vec::<Value>::new())?;
        Ok(())
    }

    fn apply_step(&self, version: u32) -> Result<()> {
        match version {
            2 => self.apply_v2(),
            3 => self.apply_v3(),
            4 => self.apply_v4(),
            5 => self.apply_v5(),
            6 => self.apply_v6(),
            other => Err(Error::Migration(format!("unknown step {}", other))),
        }
    }

    /// V2: seed locations if empty; backfill template `workout_type` from
    /// the name; legacy singular `location` becomes `location_id`.
    fn apply_v2(&self) -> Result<()> {
        let locations: Vec<Value> = self.store.get(keys::LOCATIONS, Vec::new());
        if locations.is_empty() {
            self.store.set(keys::LOCATIONS, &catalog::seed_locations())?;
        }

        let templates: Vec<Value> = self.store.get(keys::TEMPLATES, Vec::new());
        self.store.set(keys::TEMPLATES, &step_v2_templates(templates))
    }

    /// V3: merge the fixed historical-import dataset, skipping present ids.
    fn apply_v3(&self) -> Result<()> {
        let import = catalog::historical_import();
        self.merge_into(keys::EXERCISES, to_values(&import.exercises)?)?;
        self.merge_into(keys::WORKOUTS, to_values(&import.workouts)?)?;
        self.merge_into(keys::SETS, to_values(&import.sets)?)
    }

    /// V4: qualify the legacy A-template names; merge the B variants and
    /// their exercises.
    fn apply_v4(&self) -> Result<()> {
        let templates: Vec<Value> = self.store.get(keys::TEMPLATES, Vec::new());
        let templates = merge_by_id(
            step_v4_templates(templates),
            to_values(&catalog::v4_seed_templates())?,
        );
        self.store.set(keys::TEMPLATES, &templates)?;
        self.merge_into(keys::EXERCISES, to_values(&catalog::v4_seed_exercises())?)
    }

    /// V5: derive `location_ids` from equipment kind; drop legacy `location`.
    fn apply_v5(&self) -> Result<()> {
        let exercises: Vec<Value> = self.store.get(keys::EXERCISES, Vec::new());
        self.store.set(keys::EXERCISES, &step_v5_exercises(exercises))
    }

    /// V6: populate empty `primary_muscle_groups` from the legacy singular.
    fn apply_v6(&self) -> Result<()> {
        let exercises: Vec<Value> = self.store.get(keys::EXERCISES, Vec::new());
        self.store.set(keys::EXERCISES, &step_v6_exercises(exercises))
    }

    fn merge_into(&self, key: &str, incoming: Vec<Value>) -> Result<()> {
        let existing: Vec<Value> = self.store.get(key, Vec::new());
        self.store.set(key, &merge_by_id(existing, incoming))
    }
}

fn to_values<T: Serialize>(records: &[T]) -> Result<Vec<Value>> {
    records
        .iter()
        .map(|r| serde_json::to_value(r).map_err(Error::from))
        .collect()
}

fn record_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}

/// Append `incoming` records whose id is not already present in `existing`.
/// Incoming records without a string `id` are dropped; appending them would
/// duplicate them on every rerun.
pub fn merge_by_id(mut existing: Vec<Value>, incoming: Vec<Value>) -> Vec<Value> {
    let present: std::collections::HashSet<String> = existing
        .iter()
        .filter_map(|v| record_id(v).map(str::to_owned))
        .collect();

    for record in incoming {
        match record_id(&record) {
            Some(id) if present.contains(id) => {}
            Some(_) => existing.push(record),
            None => tracing::warn!("Dropping incoming record without an id: {}", record),
        }
    }
    existing
}

/// V2 template transform: infer a missing `workout_type` from the template
/// name, and convert the legacy singular `location` to `location_id`.
pub fn step_v2_templates(templates: Vec<Value>) -> Vec<Value> {
    templates
        .into_iter()
        .map(|mut tpl| {
            let Some(obj) = tpl.as_object_mut() else {
                return tpl;
            };

            if obj.get("workout_type").is_none() {
                let name = obj
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_lowercase();
                let inferred = if name.contains("pull") {
                    "pull"
                } else if name.contains("leg") || name.contains("lower") {
                    "lower"
                } else {
                    "push"
                };
                obj.insert("workout_type".into(), json!(inferred));
            }

            let legacy = obj.remove("location");
            if obj.get("location_id").is_none() {
                let location_id = legacy
                    .as_ref()
                    .and_then(Value::as_str)
                    .unwrap_or("gym")
                    .to_string();
                obj.insert("location_id".into(), json!(location_id));
            }

            tpl
        })
        .collect()
}

/// V4 template transform: append the name qualifier to the legacy template
/// ids unless the name already contains it.
pub fn step_v4_templates(templates: Vec<Value>) -> Vec<Value> {
    templates
        .into_iter()
        .map(|mut tpl| {
            let Some(obj) = tpl.as_object_mut() else {
                return tpl;
            };
            let Some(id) = obj.get("id").and_then(Value::as_str) else {
                return tpl;
            };

            if let Some((_, qualifier)) = V4_QUALIFIED_TEMPLATES.iter().find(|(q_id, _)| *q_id == id)
            {
                let name = obj
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                if !name.contains(qualifier.trim()) {
                    obj.insert("name".into(), json!(format!("{}{}", name, qualifier)));
                }
            }
            tpl
        })
        .collect()
}

/// V5 exercise transform: derive `location_ids` from equipment kind for
/// exercises lacking them, and drop the legacy singular `location`.
pub fn step_v5_exercises(exercises: Vec<Value>) -> Vec<Value> {
    exercises
        .into_iter()
        .map(|mut ex| {
            let Some(obj) = ex.as_object_mut() else {
                return ex;
            };

            let lacking = obj
                .get("location_ids")
                .and_then(Value::as_array)
                .map(|a| a.is_empty())
                .unwrap_or(true);

            if lacking {
                let derived = match obj.get("equipment").and_then(Value::as_str) {
                    Some("machine") | Some("cable") | Some("barbell") => vec!["gym"],
                    Some("bodyweight") | Some("dumbbell") => vec!["gym", "home"],
                    _ => vec!["gym"],
                };
                obj.insert("location_ids".into(), json!(derived));
            }

            obj.remove("location");
            ex
        })
        .collect()
}

/// V6 exercise transform: populate an absent/empty `primary_muscle_groups`
/// array from the legacy singular field, falling back to the default group.
pub fn step_v6_exercises(exercises: Vec<Value>) -> Vec<Value> {
    let default_group = crate::MuscleGroup::DEFAULT.key();

    exercises
        .into_iter()
        .map(|mut ex| {
            let Some(obj) = ex.as_object_mut() else {
                return ex;
            };

            let empty = obj
                .get("primary_muscle_groups")
                .and_then(Value::as_array)
                .map(|a| a.is_empty())
                .unwrap_or(true);

            if empty {
                let group = obj
                    .get("primary_muscle_group")
                    .and_then(Value::as_str)
                    .unwrap_or(default_group)
                    .to_string();
                obj.insert("primary_muscle_groups".into(), json!([group]));
            }
            ex
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Exercise;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_first_run_seeds_at_current_version() {
        let (_dir, store) = temp_store();
        let outcome = Migrator::new(&store).run().unwrap();
        assert_eq!(outcome, MigrationOutcome::Seeded);

        assert!(store.get::<bool>(keys::INITIALIZED, false));
        assert_eq!(
            store.get::<u32>(keys::MIGRATION_VERSION, 0),
            CURRENT_VERSION
        );

        let exercises: Vec<Exercise> = store.get(keys::EXERCISES, Vec::new());
        assert!(!exercises.is_empty());
        // Seed + import merged by id, no duplicates
        let mut ids: Vec<_> = exercises.iter().map(|e| e.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), exercises.len());
        // Every seeded exercise already satisfies the post-migration invariant
        assert!(exercises.iter().all(|e| !e.primary_muscle_groups.is_empty()));
    }

    #[test]
    fn test_second_process_run_is_up_to_date() {
        let (_dir, store) = temp_store();
        Migrator::new(&store).run().unwrap();

        let outcome = Migrator::new(&store).run().unwrap();
        assert_eq!(outcome, MigrationOutcome::UpToDate);
    }

    #[test]
    fn test_one_shot_gate_blocks_double_run() {
        let (_dir, store) = temp_store();
        let mut migrator = Migrator::new(&store);
        migrator.run().unwrap();

        assert_eq!(migrator.run().unwrap(), MigrationOutcome::AlreadyRan);
    }

    #[test]
    fn test_full_chain_from_v1_legacy_shapes() {
        let (_dir, store) = temp_store();

        // A v1-era store: initialized, but templates and exercises still in
        // their original shapes.
        store.set(keys::INITIALIZED, &true).unwrap();
        store.set(keys::MIGRATION_VERSION, &1u32).unwrap();
        store
            .set(
                keys::TEMPLATES,
                &vec![
                    json!({"id": "push_day_gym", "name": "Push Day",
                           "location": "gym", "exercise_ids": ["old_press"]}),
                    json!({"id": "legs_old", "name": "Leg Blast",
                           "exercise_ids": ["old_squat"]}),
                ],
            )
            .unwrap();
        store
            .set(
                keys::EXERCISES,
                &vec![
                    json!({"id": "old_press", "name": "Old Press",
                           "equipment": "barbell", "location": "gym",
                           "primary_muscle_group": "front_delts"}),
                    json!({"id": "old_squat", "name": "Old Squat",
                           "equipment": "dumbbell"}),
                ],
            )
            .unwrap();

        let outcome = Migrator::new(&store).run().unwrap();
        assert_eq!(outcome, MigrationOutcome::Migrated { from_version: 1 });
        assert_eq!(
            store.get::<u32>(keys::MIGRATION_VERSION, 0),
            CURRENT_VERSION
        );

        // Migrated records now deserialize into the typed model.
        let exercises: Vec<Exercise> = store.get(keys::EXERCISES, Vec::new());
        let old_press = exercises.iter().find(|e| e.id == "old_press").unwrap();
        assert_eq!(old_press.location_ids, vec!["gym"]);
        assert_eq!(
            old_press.primary_muscle_groups,
            vec![crate::MuscleGroup::FrontDelts]
        );

        let old_squat = exercises.iter().find(|e| e.id == "old_squat").unwrap();
        assert_eq!(old_squat.location_ids, vec!["gym", "home"]);
        assert_eq!(
            old_squat.primary_muscle_groups,
            vec![crate::MuscleGroup::DEFAULT]
        );

        // V3 import and V4 B-variants were merged in.
        assert!(exercises.iter().any(|e| e.id == "conventional_deadlift"));
        let templates: Vec<Value> = store.get(keys::TEMPLATES, Vec::new());
        assert!(templates
            .iter()
            .any(|t| record_id(t) == Some("push_day_gym_b")));

        // V4 renamed the legacy template, exactly once.
        let push = templates
            .iter()
            .find(|t| record_id(t) == Some("push_day_gym"))
            .unwrap();
        assert_eq!(
            push.get("name").and_then(Value::as_str),
            Some("Push Day A")
        );

        // Re-running the chain from v1 changes nothing further.
        store.set(keys::MIGRATION_VERSION, &1u32).unwrap();
        Migrator::new(&store).run().unwrap();
        let after: Vec<Value> = store.get(keys::TEMPLATES, Vec::new());
        let push_after = after
            .iter()
            .find(|t| record_id(t) == Some("push_day_gym"))
            .unwrap();
        assert_eq!(
            push_after.get("name").and_then(Value::as_str),
            Some("Push Day A")
        );
        let exercises_after: Vec<Exercise> = store.get(keys::EXERCISES, Vec::new());
        assert_eq!(exercises_after.len(), exercises.len());
    }

    #[test]
    fn test_step_v2_is_idempotent() {
        let templates = vec![
            json!({"id": "a", "name": "Pull Day", "location": "home"}),
            json!({"id": "b", "name": "Leg Day"}),
            json!({"id": "c", "name": "Bench", "workout_type": "push",
                   "location_id": "gym"}),
        ];

        let once = step_v2_templates(templates);
        let twice = step_v2_templates(once.clone());
        assert_eq!(once, twice);

        assert_eq!(once[0].get("workout_type"), Some(&json!("pull")));
        assert_eq!(once[0].get("location_id"), Some(&json!("home")));
        assert!(once[0].get("location").is_none());
        assert_eq!(once[1].get("workout_type"), Some(&json!("lower")));
        assert_eq!(once[1].get("location_id"), Some(&json!("gym")));
        assert_eq!(once[2].get("workout_type"), Some(&json!("push")));
    }

    #[test]
    fn test_step_v4_is_idempotent() {
        let templates = vec![
            json!({"id": "push_day_gym", "name": "Push Day"}),
            json!({"id": "pull_day_gym", "name": "Pull Day A"}),
            json!({"id": "custom", "name": "My Day"}),
        ];

        let once = step_v4_templates(templates);
        let twice = step_v4_templates(once.clone());
        assert_eq!(once, twice);

        assert_eq!(once[0].get("name"), Some(&json!("Push Day A")));
        // Already qualified: untouched
        assert_eq!(once[1].get("name"), Some(&json!("Pull Day A")));
        // Not a legacy id: untouched
        assert_eq!(once[2].get("name"), Some(&json!("My Day")));
    }

    #[test]
    fn test_step_v5_is_idempotent_and_maps_equipment() {
        let exercises = vec![
            json!({"id": "a", "equipment": "machine", "location": "gym"}),
            json!({"id": "b", "equipment": "bodyweight"}),
            json!({"id": "c", "equipment": "trapbar"}),
            json!({"id": "d", "equipment": "cable", "location_ids": ["home"]}),
        ];

        let once = step_v5_exercises(exercises);
        let twice = step_v5_exercises(once.clone());
        assert_eq!(once, twice);

        assert_eq!(once[0].get("location_ids"), Some(&json!(["gym"])));
        assert!(once[0].get("location").is_none());
        assert_eq!(once[1].get("location_ids"), Some(&json!(["gym", "home"])));
        // Unrecognized equipment defaults to gym-only
        assert_eq!(once[2].get("location_ids"), Some(&json!(["gym"])));
        // Already migrated: untouched
        assert_eq!(once[3].get("location_ids"), Some(&json!(["home"])));
    }

    #[test]
    fn test_step_v6_is_idempotent_and_falls_back() {
        let exercises = vec![
            json!({"id": "a", "primary_muscle_group": "lats"}),
            json!({"id": "b", "primary_muscle_groups": []}),
            json!({"id": "c", "primary_muscle_groups": ["quads"]}),
            json!({"id": "d"}),
        ];

        let once = step_v6_exercises(exercises);
        let twice = step_v6_exercises(once.clone());
        assert_eq!(once, twice);

        assert_eq!(once[0].get("primary_muscle_groups"), Some(&json!(["lats"])));
        assert_eq!(
            once[1].get("primary_muscle_groups"),
            Some(&json!(["chest"]))
        );
        assert_eq!(
            once[2].get("primary_muscle_groups"),
            Some(&json!(["quads"]))
        );
        assert_eq!(
            once[3].get("primary_muscle_groups"),
            Some(&json!(["chest"]))
        );
    }

    #[test]
    fn test_merge_by_id_skips_existing() {
        let existing = vec![json!({"id": "a", "v": 1}), json!({"id": "b"})];
        let incoming = vec![json!({"id": "a", "v": 2}), json!({"id": "c"})];

        let merged = merge_by_id(existing, incoming);
        assert_eq!(merged.len(), 3);
        // Existing record wins; incoming duplicate dropped
        assert_eq!(merged[0].get("v"), Some(&json!(1)));
        assert_eq!(record_id(&merged[2]), Some("c"));
    }

    #[test]
    fn test_merge_by_id_drops_idless_incoming() {
        let existing = vec![json!({"id": "a"})];
        let incoming = vec![json!({"name": "no id"}), json!({"id": 7})];

        let merged = merge_by_id(existing.clone(), incoming.clone());
        assert_eq!(merged, existing);

        // Rerunning the merge must not grow the collection.
        let again = merge_by_id(merged.clone(), incoming);
        assert_eq!(again, merged);
    }

    #[test]
    fn test_merging_twice_equals_merging_once() {
        let incoming = vec![json!({"id": "x"}), json!({"id": "y"})];
        let once = merge_by_id(Vec::new(), incoming.clone());
        let twice = merge_by_id(once.clone(), incoming);
        assert_eq!(once, twice);
    }
}
