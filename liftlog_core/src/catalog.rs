//! Built-in seed catalog and fixed import datasets.
//!
//! The catalog provides the exercises, templates and locations a fresh
//! install is seeded with, plus the frozen historical-import dataset merged
//! by the V3 migration and the template/exercise additions merged by V4.

use crate::types::*;
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;

/// Built-in seed data: locations, exercises and workout templates.
#[derive(Clone, Debug)]
pub struct Catalog {
    pub locations: Vec<WorkoutLocation>,
    pub exercises: Vec<Exercise>,
    pub templates: Vec<Template>,
}

/// Frozen dataset imported from the user's previous tracking system.
/// Merged into live collections by id; ids never change between releases.
#[derive(Clone, Debug)]
pub struct HistoricalImport {
    pub exercises: Vec<Exercise>,
    pub workouts: Vec<Workout>,
    pub sets: Vec<WorkoutSet>,
}

/// Legacy template ids (two per location) whose display names gained the
/// "A" qualifier when the B variants were introduced in schema V4.
pub const V4_QUALIFIED_TEMPLATES: [(&str, &str); 4] = [
    ("push_day_gym", " A"),
    ("pull_day_gym", " A"),
    ("push_day_home", " A"),
    ("pull_day_home", " A"),
];

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn exercise(
    id: &str,
    name: &str,
    equipment: EquipmentKind,
    primary: &[MuscleGroup],
    secondary: &[MuscleGroup],
    locations: &[&str],
) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        equipment,
        cable_attachment: None,
        primary_muscle_groups: primary.to_vec(),
        secondary_muscle_groups: secondary.to_vec(),
        legacy_primary_muscle_group: None,
        location_ids: locations.iter().map(|l| l.to_string()).collect(),
        is_custom: false,
    }
}

fn cable_exercise(
    id: &str,
    name: &str,
    attachment: &str,
    primary: &[MuscleGroup],
    secondary: &[MuscleGroup],
) -> Exercise {
    let mut ex = exercise(id, name, EquipmentKind::Cable, primary, secondary, &["gym"]);
    ex.cable_attachment = Some(attachment.into());
    ex
}

fn template(
    id: &str,
    name: &str,
    workout_type: WorkoutType,
    location_id: &str,
    exercise_ids: &[&str],
) -> Template {
    Template {
        id: id.into(),
        name: name.into(),
        workout_type,
        location_id: location_id.into(),
        exercise_ids: exercise_ids.iter().map(|e| e.to_string()).collect(),
    }
}

/// Builds the default catalog of locations, exercises and templates
///
/// **Note**: For production use, prefer `get_default_catalog()` which
/// returns a cached reference.
pub fn build_default_catalog() -> Catalog {
    use EquipmentKind::*;
    use MuscleGroup::*;

    let locations = seed_locations();

    let exercises = vec![
        exercise(
            "bench_press",
            "Barbell Bench Press",
            Barbell,
            &[Chest],
            &[Triceps, FrontDelts],
            &["gym"],
        ),
        exercise(
            "incline_db_press",
            "Incline Dumbbell Press",
            Dumbbell,
            &[Chest],
            &[FrontDelts, Triceps],
            &["gym", "home"],
        ),
        cable_exercise("cable_fly", "Cable Fly", "d-handle", &[Chest], &[]),
        exercise(
            "overhead_press",
            "Overhead Press",
            Barbell,
            &[FrontDelts],
            &[SideDelts, Triceps],
            &["gym"],
        ),
        exercise(
            "lateral_raise",
            "Dumbbell Lateral Raise",
            Dumbbell,
            &[SideDelts],
            &[],
            &["gym", "home"],
        ),
        cable_exercise(
            "triceps_pushdown",
            "Triceps Rope Pushdown",
            "rope",
            &[Triceps],
            &[],
        ),
        exercise(
            "pull_up",
            "Pull-up",
            Bodyweight,
            &[Lats],
            &[Biceps],
            &["gym", "home"],
        ),
        exercise(
            "barbell_row",
            "Barbell Row",
            Barbell,
            &[Lats, UpperBack],
            &[RearDelts, Biceps],
            &["gym"],
        ),
        exercise(
            "barbell_curl",
            "Barbell Curl",
            Barbell,
            &[Biceps],
            &[Forearms],
            &["gym"],
        ),
        exercise(
            "back_squat",
            "Barbell Back Squat",
            Barbell,
            &[Quads],
            &[Glutes],
            &["gym"],
        ),
        exercise(
            "goblet_squat",
            "Goblet Squat",
            Dumbbell,
            &[Quads],
            &[Glutes],
            &["gym", "home"],
        ),
        exercise(
            "romanian_deadlift",
            "Romanian Deadlift",
            Barbell,
            &[Hamstrings, Glutes],
            &[LowerBack],
            &["gym"],
        ),
        exercise("leg_press", "Leg Press", Machine, &[Quads], &[Glutes], &["gym"]),
        exercise("leg_curl", "Lying Leg Curl", Machine, &[Hamstrings], &[], &["gym"]),
        exercise(
            "calf_raise",
            "Standing Calf Raise",
            Machine,
            &[Calves],
            &[],
            &["gym"],
        ),
        exercise(
            "plank",
            "Plank",
            Bodyweight,
            &[Abs],
            &[Obliques],
            &["gym", "home"],
        ),
    ]
    .into_iter()
    .chain(v4_seed_exercises())
    .collect();

    let mut templates = vec![
        template(
            "push_day_gym",
            "Push Day A",
            WorkoutType::Push,
            "gym",
            &[
                "bench_press",
                "overhead_press",
                "cable_fly",
                "lateral_raise",
                "triceps_pushdown",
            ],
        ),
        template(
            "pull_day_gym",
            "Pull Day A",
            WorkoutType::Pull,
            "gym",
            &["barbell_row", "pull_up", "face_pull", "barbell_curl"],
        ),
        template(
            "lower_day_gym",
            "Lower Day",
            WorkoutType::Lower,
            "gym",
            &[
                "back_squat",
                "romanian_deadlift",
                "leg_press",
                "leg_curl",
                "calf_raise",
            ],
        ),
        template(
            "push_day_home",
            "Push Day A",
            WorkoutType::Push,
            "home",
            &["incline_db_press", "lateral_raise"],
        ),
        template(
            "pull_day_home",
            "Pull Day A",
            WorkoutType::Pull,
            "home",
            &["pull_up", "hammer_curl"],
        ),
        template(
            "lower_day_home",
            "Lower Day",
            WorkoutType::Lower,
            "home",
            &["goblet_squat", "plank"],
        ),
    ];
    templates.extend(v4_seed_templates());

    Catalog {
        locations,
        exercises,
        templates,
    }
}

/// The two built-in workout locations. Also used by the V2 migration to
/// seed the locations collection when it is empty.
pub fn seed_locations() -> Vec<WorkoutLocation> {
    vec![
        WorkoutLocation {
            id: "gym".into(),
            name: "Gym".into(),
            sort_order: 0,
        },
        WorkoutLocation {
            id: "home".into(),
            name: "Home".into(),
            sort_order: 1,
        },
    ]
}

/// Exercises introduced alongside the V4 template variants. Present in the
/// full seed; merged by id into stores migrated from earlier versions.
pub fn v4_seed_exercises() -> Vec<Exercise> {
    use MuscleGroup::*;
    vec![
        cable_exercise(
            "face_pull",
            "Cable Face Pull",
            "rope",
            &[RearDelts],
            &[Traps],
        ),
        exercise(
            "hammer_curl",
            "Hammer Curl",
            EquipmentKind::Dumbbell,
            &[Biceps],
            &[Forearms],
            &["gym", "home"],
        ),
    ]
}

/// The "B" template variants introduced in schema V4.
pub fn v4_seed_templates() -> Vec<Template> {
    vec![
        template(
            "push_day_gym_b",
            "Push Day B",
            WorkoutType::Push,
            "gym",
            &[
                "overhead_press",
                "incline_db_press",
                "triceps_pushdown",
                "lateral_raise",
            ],
        ),
        template(
            "pull_day_gym_b",
            "Pull Day B",
            WorkoutType::Pull,
            "gym",
            &["pull_up", "barbell_row", "hammer_curl", "face_pull"],
        ),
    ]
}

fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    // All catalog timestamps are fixed, valid instants.
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .expect("valid catalog timestamp")
}

/// The fixed historical-import dataset merged by the V3 migration (and
/// folded into first-run seeding).
pub fn historical_import() -> HistoricalImport {
    use MuscleGroup::*;

    let exercises = vec![exercise(
        "conventional_deadlift",
        "Conventional Deadlift",
        EquipmentKind::Barbell,
        &[Hamstrings, Glutes],
        &[LowerBack, Traps],
        &["gym"],
    )];

    let workouts = vec![
        Workout {
            id: "import_w_2023_11_06".into(),
            started_at: ts(2023, 11, 6, 17, 30),
            completed_at: Some(ts(2023, 11, 6, 18, 20)),
            template_id: None,
        },
        Workout {
            id: "import_w_2023_11_08".into(),
            started_at: ts(2023, 11, 8, 17, 45),
            completed_at: Some(ts(2023, 11, 8, 18, 40)),
            template_id: None,
        },
    ];

    let set = |id: &str, workout: &str, exercise: &str, reps: u32, weight: f64, at| WorkoutSet {
        id: id.into(),
        workout_id: workout.into(),
        exercise_id: exercise.into(),
        reps,
        weight,
        logged_at: at,
    };

    let sets = vec![
        set(
            "import_s1",
            "import_w_2023_11_06",
            "conventional_deadlift",
            5,
            225.0,
            ts(2023, 11, 6, 17, 35),
        ),
        set(
            "import_s2",
            "import_w_2023_11_06",
            "conventional_deadlift",
            5,
            225.0,
            ts(2023, 11, 6, 17, 42),
        ),
        set(
            "import_s3",
            "import_w_2023_11_06",
            "conventional_deadlift",
            5,
            235.0,
            ts(2023, 11, 6, 17, 50),
        ),
        set(
            "import_s4",
            "import_w_2023_11_08",
            "bench_press",
            8,
            135.0,
            ts(2023, 11, 8, 17, 50),
        ),
        set(
            "import_s5",
            "import_w_2023_11_08",
            "bench_press",
            8,
            140.0,
            ts(2023, 11, 8, 17, 58),
        ),
        set(
            "import_s6",
            "import_w_2023_11_08",
            "back_squat",
            5,
            185.0,
            ts(2023, 11, 8, 18, 15),
        ),
    ];

    HistoricalImport {
        exercises,
        workouts,
        sets,
    }
}

impl Catalog {
    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let mut seen = std::collections::HashSet::new();
        for ex in &self.exercises {
            if ex.id.is_empty() {
                errors.push("Exercise has empty ID".to_string());
            }
            if !seen.insert(ex.id.clone()) {
                errors.push(format!("Duplicate exercise id '{}'", ex.id));
            }
            if ex.name.is_empty() {
                errors.push(format!("Exercise '{}' has empty name", ex.id));
            }
            if ex.primary_muscle_groups.is_empty() {
                errors.push(format!("Exercise '{}' has no primary muscle groups", ex.id));
            }
            if ex.location_ids.is_empty() {
                errors.push(format!("Exercise '{}' has no locations", ex.id));
            }
            for loc in &ex.location_ids {
                if !self.locations.iter().any(|l| &l.id == loc) {
                    errors.push(format!(
                        "Exercise '{}' references unknown location '{}'",
                        ex.id, loc
                    ));
                }
            }
        }

        let mut seen = std::collections::HashSet::new();
        for tpl in &self.templates {
            if tpl.id.is_empty() {
                errors.push("Template has empty ID".to_string());
            }
            if !seen.insert(tpl.id.clone()) {
                errors.push(format!("Duplicate template id '{}'", tpl.id));
            }
            if tpl.exercise_ids.is_empty() {
                errors.push(format!("Template '{}' has no exercises", tpl.id));
            }
            if !self.locations.iter().any(|l| l.id == tpl.location_id) {
                errors.push(format!(
                    "Template '{}' references unknown location '{}'",
                    tpl.id, tpl.location_id
                ));
            }
            for ex_id in &tpl.exercise_ids {
                if !self.exercises.iter().any(|e| &e.id == ex_id) {
                    errors.push(format!(
                        "Template '{}' references non-existent exercise '{}'",
                        tpl.id, ex_id
                    ));
                }
            }
        }

        let mut order_seen = std::collections::HashSet::new();
        for loc in &self.locations {
            if !order_seen.insert(loc.sort_order) {
                errors.push(format!(
                    "Location '{}' has duplicate sort_order {}",
                    loc.id, loc.sort_order
                ));
            }
        }

        errors
    }
}
