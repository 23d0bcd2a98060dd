//! Volume analytics engine.
//!
//! Pure functions aggregating logged sets into per-muscle-group training
//! volume, training score, personal records, trends and routine
//! projections. Repositories load the data; everything here computes over
//! slices, so identical inputs always produce identical, identically
//! ordered output.
//!
//! Crediting rule: a logged set credits EVERY primary muscle group of its
//! exercise with a full +1. Multi-primary sets are never split or divided.
//! Only sets belonging to completed workouts count; sets whose workout is
//! missing or still open are skipped.

use crate::types::*;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Sets a routine projection assumes per scheduled exercise.
pub const PROJECTED_SETS_PER_EXERCISE: u32 = 3;

/// Deadband for classifying week-over-week changes as up/down/stable.
pub const TREND_DEADBAND_PERCENT: f64 = 10.0;

/// Per-exercise share of a muscle group's weekly sets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExerciseVolume {
    pub exercise_id: String,
    pub sets: u32,
}

/// Weekly working-set volume for one muscle group.
#[derive(Clone, Debug, PartialEq)]
pub struct MuscleVolume {
    pub muscle: MuscleGroup,
    pub sets: u32,
    /// Configured weekly target; 0 = tracked but not scored.
    pub target: u32,
    pub per_exercise: Vec<ExerciseVolume>,
}

/// One week of volume, anchored to the user's week-start day.
#[derive(Clone, Debug, PartialEq)]
pub struct WeeklyVolume {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub volumes: Vec<MuscleVolume>,
    /// Sets summed over muscle groups with target > 0 only.
    pub total_sets: u32,
    /// Targets summed over muscle groups with target > 0 only.
    pub target_sets: u32,
}

/// Volume re-bucketed into one of the six coarse categories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryVolume {
    pub category: VolumeCategory,
    pub sets: u32,
    pub target: u32,
}

/// All-time bests for a single exercise.
#[derive(Clone, Debug, PartialEq)]
pub struct PersonalRecords {
    /// Heaviest weight ever logged, independent of reps.
    pub max_weight: f64,
    /// Most reps ever logged, independent of weight.
    pub max_reps: u32,
    /// weight × reps of the best single set.
    pub best_volume: f64,
    pub best_volume_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Week-over-week change for one muscle group.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeTrend {
    pub muscle: MuscleGroup,
    pub current_sets: u32,
    pub previous_sets: u32,
    pub percent_change: f64,
    pub direction: TrendDirection,
}

fn index_exercises(exercises: &[Exercise]) -> HashMap<&str, &Exercise> {
    exercises.iter().map(|e| (e.id.as_str(), e)).collect()
}

/// Per-muscle-group set volume for sets logged within `[start, end]`
/// (inclusive calendar dates).
///
/// Every muscle group in `targets` starts at 0, so untrained tracked
/// groups still appear. Only sets of completed workouts are counted; sets
/// whose workout or exercise cannot be resolved are skipped, never fatal.
pub fn volume_for_range(
    sets: &[WorkoutSet],
    exercises: &[Exercise],
    workouts: &[Workout],
    targets: &BTreeMap<MuscleGroup, u32>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<MuscleVolume> {
    let by_id = index_exercises(exercises);
    let completed: HashSet<&str> = workouts
        .iter()
        .filter(|w| w.completed_at.is_some())
        .map(|w| w.id.as_str())
        .collect();

    let mut acc: BTreeMap<MuscleGroup, (u32, BTreeMap<String, u32>)> = targets
        .keys()
        .map(|g| (*g, (0, BTreeMap::new())))
        .collect();

    for set in sets {
        let day = set.logged_at.date_naive();
        if day < start || day > end {
            continue;
        }
        if !completed.contains(set.workout_id.as_str()) {
            tracing::debug!(
                "Set {} belongs to missing or open workout {}; skipping",
                set.id,
                set.workout_id
            );
            continue;
        }
        let Some(exercise) = by_id.get(set.exercise_id.as_str()) else {
            tracing::debug!(
                "Set {} references unknown exercise {}; skipping",
                set.id,
                set.exercise_id
            );
            continue;
        };

        // Full +1 credit to every primary group, legacy fallback included.
        for group in exercise.effective_primary_groups() {
            let (total, per_exercise) = acc.entry(group).or_default();
            *total += 1;
            *per_exercise.entry(set.exercise_id.clone()).or_default() += 1;
        }
    }

    acc.into_iter()
        .map(|(muscle, (sets, per_exercise))| MuscleVolume {
            muscle,
            sets,
            target: targets.get(&muscle).copied().unwrap_or(0),
            per_exercise: per_exercise
                .into_iter()
                .map(|(exercise_id, sets)| ExerciseVolume { exercise_id, sets })
                .collect(),
        })
        .collect()
}

/// Volume for the week containing `reference`, bounded by the user's
/// configured week-start day.
pub fn weekly_volume(
    sets: &[WorkoutSet],
    exercises: &[Exercise],
    workouts: &[Workout],
    settings: &UserSettings,
    reference: NaiveDate,
) -> WeeklyVolume {
    let week_start = settings.week_start_day.week_start(reference);
    let week_end = week_start + Duration::days(6);

    let volumes = volume_for_range(
        sets,
        exercises,
        workouts,
        &settings.muscle_group_targets,
        week_start,
        week_end,
    );

    // Only targeted groups count toward the totals.
    let (total_sets, target_sets) = volumes
        .iter()
        .filter(|v| v.target > 0)
        .fold((0, 0), |(s, t), v| (s + v.sets, t + v.target));

    WeeklyVolume {
        week_start,
        week_end,
        volumes,
        total_sets,
        target_sets,
    }
}

/// `n` consecutive weekly volumes ending at the week containing
/// `reference`, oldest first.
pub fn volume_history(
    sets: &[WorkoutSet],
    exercises: &[Exercise],
    workouts: &[Workout],
    settings: &UserSettings,
    reference: NaiveDate,
    n: usize,
) -> Vec<WeeklyVolume> {
    (0..n)
        .rev()
        .map(|weeks_back| {
            let anchor = reference - Duration::days(7 * weeks_back as i64);
            weekly_volume(sets, exercises, workouts, settings, anchor)
        })
        .collect()
}

/// Percentage of aggregate weekly target achieved, over target > 0 groups
/// only, rounded and capped at 100. Returns 0 when nothing is targeted.
pub fn training_score(volumes: &[MuscleVolume]) -> u32 {
    let (sets, targets) = volumes
        .iter()
        .filter(|v| v.target > 0)
        .fold((0u32, 0u32), |(s, t), v| (s + v.sets, t + v.target));

    if targets == 0 {
        return 0;
    }
    let score = (100.0 * f64::from(sets) / f64::from(targets)).round() as u32;
    score.min(100)
}

/// Deterministic forward estimate of the weekly volume a routine's schedule
/// would produce, at a fixed 3 sets per scheduled exercise. Independent of
/// actual logs.
pub fn projected_volume(
    routine: &Routine,
    templates: &[Template],
    exercises: &[Exercise],
    targets: &BTreeMap<MuscleGroup, u32>,
) -> Vec<MuscleVolume> {
    let exercises_by_id = index_exercises(exercises);
    let templates_by_id: HashMap<&str, &Template> =
        templates.iter().map(|t| (t.id.as_str(), t)).collect();

    let mut acc: BTreeMap<MuscleGroup, (u32, BTreeMap<String, u32>)> = targets
        .keys()
        .map(|g| (*g, (0, BTreeMap::new())))
        .collect();

    for day in &routine.day_schedule {
        for template_id in day {
            let Some(template) = templates_by_id.get(template_id.as_str()) else {
                continue;
            };
            for exercise_id in &template.exercise_ids {
                let Some(exercise) = exercises_by_id.get(exercise_id.as_str()) else {
                    continue;
                };
                for group in exercise.effective_primary_groups() {
                    let (total, per_exercise) = acc.entry(group).or_default();
                    *total += PROJECTED_SETS_PER_EXERCISE;
                    *per_exercise.entry(exercise_id.clone()).or_default() +=
                        PROJECTED_SETS_PER_EXERCISE;
                }
            }
        }
    }

    acc.into_iter()
        .map(|(muscle, (sets, per_exercise))| MuscleVolume {
            muscle,
            sets,
            target: targets.get(&muscle).copied().unwrap_or(0),
            per_exercise: per_exercise
                .into_iter()
                .map(|(exercise_id, sets)| ExerciseVolume { exercise_id, sets })
                .collect(),
        })
        .collect()
}

/// Re-bucket muscle-group volumes into the six fixed coarse categories.
pub fn aggregate_into_categories(volumes: &[MuscleVolume]) -> Vec<CategoryVolume> {
    let mut acc: BTreeMap<VolumeCategory, (u32, u32)> = VolumeCategory::ALL
        .iter()
        .map(|c| (*c, (0, 0)))
        .collect();

    for volume in volumes {
        let (sets, targets) = acc.entry(volume.muscle.category()).or_default();
        *sets += volume.sets;
        *targets += volume.target;
    }

    VolumeCategory::ALL
        .iter()
        .map(|category| {
            let (sets, target) = acc[category];
            CategoryVolume {
                category: *category,
                sets,
                target,
            }
        })
        .collect()
}

/// All-time records for one exercise over all historical sets. Max weight
/// and max reps are tracked independently; the best-volume set is the one
/// maximizing weight × reps. Returns None if the exercise has no sets.
pub fn personal_records(exercise_id: &str, sets: &[WorkoutSet]) -> Option<PersonalRecords> {
    let mut records: Option<PersonalRecords> = None;

    for set in sets.iter().filter(|s| s.exercise_id == exercise_id) {
        let volume = set.weight * f64::from(set.reps);
        match records.as_mut() {
            None => {
                records = Some(PersonalRecords {
                    max_weight: set.weight,
                    max_reps: set.reps,
                    best_volume: volume,
                    best_volume_at: set.logged_at,
                });
            }
            Some(r) => {
                r.max_weight = r.max_weight.max(set.weight);
                r.max_reps = r.max_reps.max(set.reps);
                if volume > r.best_volume {
                    r.best_volume = volume;
                    r.best_volume_at = set.logged_at;
                }
            }
        }
    }

    records
}

/// Current-week vs previous-week volume per muscle group.
///
/// Percent change is 100 when the previous week is 0 and the current is
/// positive; direction uses a ±10% deadband.
pub fn volume_trends(
    sets: &[WorkoutSet],
    exercises: &[Exercise],
    workouts: &[Workout],
    settings: &UserSettings,
    reference: NaiveDate,
) -> Vec<VolumeTrend> {
    let current = weekly_volume(sets, exercises, workouts, settings, reference);
    let previous = weekly_volume(
        sets,
        exercises,
        workouts,
        settings,
        reference - Duration::days(7),
    );

    let previous_by_muscle: BTreeMap<MuscleGroup, u32> = previous
        .volumes
        .iter()
        .map(|v| (v.muscle, v.sets))
        .collect();

    current
        .volumes
        .iter()
        .map(|v| {
            let previous_sets = previous_by_muscle.get(&v.muscle).copied().unwrap_or(0);
            let percent_change = if previous_sets == 0 {
                if v.sets > 0 {
                    100.0
                } else {
                    0.0
                }
            } else {
                (f64::from(v.sets) - f64::from(previous_sets)) / f64::from(previous_sets) * 100.0
            };

            let direction = if percent_change > TREND_DEADBAND_PERCENT {
                TrendDirection::Up
            } else if percent_change < -TREND_DEADBAND_PERCENT {
                TrendDirection::Down
            } else {
                TrendDirection::Stable
            };

            VolumeTrend {
                muscle: v.muscle,
                current_sets: v.sets,
                previous_sets,
                percent_change,
                direction,
            }
        })
        .collect()
}
