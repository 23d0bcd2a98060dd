//! Core domain types for the Liftlog workout tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Muscle groups and their coarse categories
//! - Exercises, templates and workout locations
//! - Workouts and logged sets
//! - User settings, routines and supplements

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Muscle Groups
// ============================================================================

/// An individual muscle group an exercise can train.
///
/// The derived `Ord` gives analytics output a stable, deterministic order.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Chest,
    Lats,
    UpperBack,
    LowerBack,
    Traps,
    FrontDelts,
    SideDelts,
    RearDelts,
    Biceps,
    Triceps,
    Forearms,
    Quads,
    Hamstrings,
    Glutes,
    Calves,
    Abs,
    Obliques,
}

impl MuscleGroup {
    /// All muscle groups, in display/aggregation order.
    pub const ALL: [MuscleGroup; 17] = [
        MuscleGroup::Chest,
        MuscleGroup::Lats,
        MuscleGroup::UpperBack,
        MuscleGroup::LowerBack,
        MuscleGroup::Traps,
        MuscleGroup::FrontDelts,
        MuscleGroup::SideDelts,
        MuscleGroup::RearDelts,
        MuscleGroup::Biceps,
        MuscleGroup::Triceps,
        MuscleGroup::Forearms,
        MuscleGroup::Quads,
        MuscleGroup::Hamstrings,
        MuscleGroup::Glutes,
        MuscleGroup::Calves,
        MuscleGroup::Abs,
        MuscleGroup::Obliques,
    ];

    /// Fallback group used when a legacy record carries no muscle data at all.
    pub const DEFAULT: MuscleGroup = MuscleGroup::Chest;

    /// Stable snake_case key, matching the serialized form.
    pub fn key(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "chest",
            MuscleGroup::Lats => "lats",
            MuscleGroup::UpperBack => "upper_back",
            MuscleGroup::LowerBack => "lower_back",
            MuscleGroup::Traps => "traps",
            MuscleGroup::FrontDelts => "front_delts",
            MuscleGroup::SideDelts => "side_delts",
            MuscleGroup::RearDelts => "rear_delts",
            MuscleGroup::Biceps => "biceps",
            MuscleGroup::Triceps => "triceps",
            MuscleGroup::Forearms => "forearms",
            MuscleGroup::Quads => "quads",
            MuscleGroup::Hamstrings => "hamstrings",
            MuscleGroup::Glutes => "glutes",
            MuscleGroup::Calves => "calves",
            MuscleGroup::Abs => "abs",
            MuscleGroup::Obliques => "obliques",
        }
    }

    /// The coarse category this muscle group rolls up into.
    pub fn category(&self) -> VolumeCategory {
        match self {
            MuscleGroup::Chest => VolumeCategory::Chest,
            MuscleGroup::Lats
            | MuscleGroup::UpperBack
            | MuscleGroup::LowerBack
            | MuscleGroup::Traps => VolumeCategory::Back,
            MuscleGroup::FrontDelts | MuscleGroup::SideDelts | MuscleGroup::RearDelts => {
                VolumeCategory::Shoulders
            }
            MuscleGroup::Biceps | MuscleGroup::Triceps | MuscleGroup::Forearms => {
                VolumeCategory::Arms
            }
            MuscleGroup::Quads
            | MuscleGroup::Hamstrings
            | MuscleGroup::Glutes
            | MuscleGroup::Calves => VolumeCategory::Legs,
            MuscleGroup::Abs | MuscleGroup::Obliques => VolumeCategory::Core,
        }
    }
}

/// The six fixed coarse categories muscle volume is re-bucketed into.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum VolumeCategory {
    Chest,
    Back,
    Shoulders,
    Arms,
    Legs,
    Core,
}

impl VolumeCategory {
    pub const ALL: [VolumeCategory; 6] = [
        VolumeCategory::Chest,
        VolumeCategory::Back,
        VolumeCategory::Shoulders,
        VolumeCategory::Arms,
        VolumeCategory::Legs,
        VolumeCategory::Core,
    ];
}

// ============================================================================
// Exercises
// ============================================================================

/// Kind of equipment an exercise is performed with
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentKind {
    Barbell,
    Dumbbell,
    Machine,
    Cable,
    Bodyweight,
}

/// An exercise definition (e.g., "Barbell Bench Press")
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub equipment: EquipmentKind,
    /// Attachment used on cable exercises (rope, d-handle, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cable_attachment: Option<String>,
    /// Canonical muscle-group list. Non-empty once migrated to the current
    /// schema; may be absent on legacy records.
    #[serde(default)]
    pub primary_muscle_groups: Vec<MuscleGroup>,
    #[serde(default)]
    pub secondary_muscle_groups: Vec<MuscleGroup>,
    /// Legacy singular field, superseded by `primary_muscle_groups`. Kept
    /// readable so pre-V6 records resolve without a migration pass.
    #[serde(
        default,
        rename = "primary_muscle_group",
        skip_serializing_if = "Option::is_none"
    )]
    pub legacy_primary_muscle_group: Option<MuscleGroup>,
    #[serde(default)]
    pub location_ids: Vec<String>,
    #[serde(default)]
    pub is_custom: bool,
}

impl Exercise {
    /// Primary muscle groups with the legacy-singular fallback applied.
    ///
    /// Resolution order: canonical array, then legacy singular field, then
    /// the default muscle group. Never empty.
    pub fn effective_primary_groups(&self) -> Vec<MuscleGroup> {
        if !self.primary_muscle_groups.is_empty() {
            return self.primary_muscle_groups.clone();
        }
        vec![self
            .legacy_primary_muscle_group
            .unwrap_or(MuscleGroup::DEFAULT)]
    }

    /// Union of primary and secondary groups, primaries first.
    pub fn all_muscle_groups(&self) -> Vec<MuscleGroup> {
        let mut groups = self.effective_primary_groups();
        for g in &self.secondary_muscle_groups {
            if !groups.contains(g) {
                groups.push(*g);
            }
        }
        groups
    }
}

// ============================================================================
// Templates and Locations
// ============================================================================

/// Broad workout type a template belongs to
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    Push,
    Pull,
    Lower,
}

/// An ordered list of exercises to perform at a location
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub workout_type: WorkoutType,
    pub location_id: String,
    pub exercise_ids: Vec<String>,
}

/// A place where workouts happen (gym, home, ...)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutLocation {
    pub id: String,
    pub name: String,
    pub sort_order: u32,
}

// ============================================================================
// Workouts and Sets
// ============================================================================

/// A workout session. Only completed workouts (non-null `completed_at`)
/// count toward calendar and volume views.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub template_id: Option<String>,
}

/// A single logged set. `workout_id` and `exercise_id` are soft references;
/// dangling values resolve to "unknown" at every consumption site.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub id: String,
    pub workout_id: String,
    pub exercise_id: String,
    pub reps: u32,
    pub weight: f64,
    pub logged_at: DateTime<Utc>,
}

// ============================================================================
// Settings and Routines
// ============================================================================

/// Day the user's training week starts on
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeekStartDay {
    Sunday,
    Monday,
}

impl WeekStartDay {
    /// The week-start date on or before `date`.
    pub fn week_start(&self, date: NaiveDate) -> NaiveDate {
        let target = match self {
            WeekStartDay::Sunday => Weekday::Sun,
            WeekStartDay::Monday => Weekday::Mon,
        };
        let offset = (7 + date.weekday().num_days_from_monday() as i64
            - target.num_days_from_monday() as i64)
            % 7;
        date - Duration::days(offset)
    }
}

/// User preferences and weekly muscle-group targets
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserSettings {
    pub week_start_day: WeekStartDay,
    pub protein_goal_grams: u32,
    pub sleep_goal_hours: f64,
    pub rest_timer_seconds: u32,
    /// Weekly set target per muscle group. A target of 0 means the group is
    /// tracked in volume views but excluded from scoring.
    #[serde(default)]
    pub muscle_group_targets: BTreeMap<MuscleGroup, u32>,
}

impl Default for UserSettings {
    fn default() -> Self {
        let mut targets = BTreeMap::new();
        for group in MuscleGroup::ALL {
            let target = match group {
                MuscleGroup::Chest
                | MuscleGroup::Lats
                | MuscleGroup::Quads
                | MuscleGroup::Hamstrings => 10,
                MuscleGroup::FrontDelts
                | MuscleGroup::SideDelts
                | MuscleGroup::Biceps
                | MuscleGroup::Triceps
                | MuscleGroup::Glutes
                | MuscleGroup::UpperBack => 6,
                // Tracked but not scored by default
                _ => 0,
            };
            targets.insert(group, target);
        }
        Self {
            week_start_day: WeekStartDay::Monday,
            protein_goal_grams: 160,
            sleep_goal_hours: 8.0,
            rest_timer_seconds: 120,
            muscle_group_targets: targets,
        }
    }
}

/// A weekly routine: exactly 7 day slots (0 = first day of the user's week),
/// each with zero or more template ids. Empty = rest day; multiple = same-day
/// multi-workout.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Routine {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    pub day_schedule: [Vec<String>; 7],
}

// ============================================================================
// Supplements
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Supplement {
    pub id: String,
    pub name: String,
    pub sort_order: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// One intake record per (supplement, calendar date).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SupplementIntake {
    pub id: String,
    pub supplement_id: String,
    pub date: NaiveDate,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_start_monday_from_wednesday() {
        // 2024-06-12 is a Wednesday
        let wednesday = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let start = WeekStartDay::Monday.week_start(wednesday);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(start.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_week_start_is_identity_on_start_day() {
        let monday = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(WeekStartDay::Monday.week_start(monday), monday);

        let sunday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
        assert_eq!(WeekStartDay::Sunday.week_start(sunday), sunday);
    }

    #[test]
    fn test_week_start_sunday_from_saturday() {
        // 2024-06-15 is a Saturday; the Sunday on/before is 2024-06-09
        let saturday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let start = WeekStartDay::Sunday.week_start(saturday);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 6, 9).unwrap());
    }

    #[test]
    fn test_effective_primary_groups_fallbacks() {
        let mut exercise = Exercise {
            id: "x".into(),
            name: "X".into(),
            equipment: EquipmentKind::Barbell,
            cable_attachment: None,
            primary_muscle_groups: vec![MuscleGroup::Quads, MuscleGroup::Glutes],
            secondary_muscle_groups: vec![],
            legacy_primary_muscle_group: Some(MuscleGroup::Hamstrings),
            location_ids: vec![],
            is_custom: false,
        };

        // Canonical array wins
        assert_eq!(
            exercise.effective_primary_groups(),
            vec![MuscleGroup::Quads, MuscleGroup::Glutes]
        );

        // Legacy singular fallback
        exercise.primary_muscle_groups.clear();
        assert_eq!(
            exercise.effective_primary_groups(),
            vec![MuscleGroup::Hamstrings]
        );

        // Default when nothing is present
        exercise.legacy_primary_muscle_group = None;
        assert_eq!(
            exercise.effective_primary_groups(),
            vec![MuscleGroup::DEFAULT]
        );
    }

    #[test]
    fn test_every_muscle_group_has_a_category() {
        for group in MuscleGroup::ALL {
            // Exhaustive match in category() makes this a compile-time fact;
            // assert membership in the fixed six anyway.
            assert!(VolumeCategory::ALL.contains(&group.category()));
        }
    }

    #[test]
    fn test_muscle_group_key_matches_serde() {
        for group in MuscleGroup::ALL {
            let json = serde_json::to_string(&group).unwrap();
            assert_eq!(json, format!("\"{}\"", group.key()));
        }
    }

    #[test]
    fn test_legacy_exercise_deserializes() {
        let raw = r#"{
            "id": "old_press",
            "name": "Old Press",
            "equipment": "barbell",
            "primary_muscle_group": "front_delts"
        }"#;
        let exercise: Exercise = serde_json::from_str(raw).unwrap();
        assert!(exercise.primary_muscle_groups.is_empty());
        assert_eq!(
            exercise.legacy_primary_muscle_group,
            Some(MuscleGroup::FrontDelts)
        );
        assert_eq!(
            exercise.effective_primary_groups(),
            vec![MuscleGroup::FrontDelts]
        );
    }
}
