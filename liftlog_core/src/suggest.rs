//! Exercise suggestions for closing weekly volume shortfalls.
//!
//! Given the current week's volumes, the engine computes which targeted
//! muscle groups are behind, then ranks the exercises available at a
//! location by how directly they close those gaps.

use crate::types::{Exercise, MuscleGroup};
use crate::volume::MuscleVolume;

/// Maximum sets a single suggestion will ever recommend.
const MAX_SUGGESTED_SETS: u32 = 4;

/// A muscle group behind on its weekly target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shortfall {
    pub muscle: MuscleGroup,
    pub current: u32,
    pub target: u32,
}

impl Shortfall {
    /// Remaining sets to hit the target.
    pub fn amount(&self) -> u32 {
        self.target.saturating_sub(self.current)
    }

    fn completion(&self) -> f64 {
        f64::from(self.current) / f64::from(self.target)
    }
}

/// A ranked candidate exercise for the shortfall set.
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseSuggestion {
    pub exercise_id: String,
    pub name: String,
    /// Shortfall muscles this exercise hits as a primary group.
    pub primary_matches: Vec<MuscleGroup>,
    /// Shortfall muscles hit only as a secondary group.
    pub secondary_matches: Vec<MuscleGroup>,
    pub suggested_sets: u32,
    /// Default-selected in the UI. Secondary-only matches are suggested but
    /// left unselected.
    pub preselected: bool,
}

/// Muscle groups where `target > 0` and `current < target`, most behind
/// first (ascending current/target, tie-broken by muscle for determinism).
pub fn shortfalls(volumes: &[MuscleVolume]) -> Vec<Shortfall> {
    let mut behind: Vec<Shortfall> = volumes
        .iter()
        .filter(|v| v.target > 0 && v.sets < v.target)
        .map(|v| Shortfall {
            muscle: v.muscle,
            current: v.sets,
            target: v.target,
        })
        .collect();

    behind.sort_by(|a, b| {
        a.completion()
            .partial_cmp(&b.completion())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.muscle.cmp(&b.muscle))
    });
    behind
}

/// Rank the exercises available at `location_id` against the shortfall set.
///
/// Candidates whose (primary ∪ secondary) groups miss every shortfall are
/// dropped. Ordering: count of shortfall muscles hit as primary
/// (descending), tie-broken by the largest matched shortfall (descending).
pub fn suggest_exercises(
    exercises: &[Exercise],
    location_id: &str,
    shortfalls: &[Shortfall],
) -> Vec<ExerciseSuggestion> {
    let mut suggestions: Vec<(ExerciseSuggestion, u32)> = exercises
        .iter()
        .filter(|e| e.location_ids.iter().any(|l| l == location_id))
        .filter_map(|e| {
            let primaries = e.effective_primary_groups();

            let primary_matches: Vec<MuscleGroup> = shortfalls
                .iter()
                .map(|s| s.muscle)
                .filter(|m| primaries.contains(m))
                .collect();
            let secondary_matches: Vec<MuscleGroup> = shortfalls
                .iter()
                .map(|s| s.muscle)
                .filter(|m| !primaries.contains(m) && e.secondary_muscle_groups.contains(m))
                .collect();

            if primary_matches.is_empty() && secondary_matches.is_empty() {
                return None;
            }

            let max_matched_shortfall = shortfalls
                .iter()
                .filter(|s| {
                    primary_matches.contains(&s.muscle) || secondary_matches.contains(&s.muscle)
                })
                .map(Shortfall::amount)
                .max()
                .unwrap_or(0);

            let suggestion = ExerciseSuggestion {
                exercise_id: e.id.clone(),
                name: e.name.clone(),
                preselected: !primary_matches.is_empty(),
                primary_matches,
                secondary_matches,
                suggested_sets: max_matched_shortfall.div_ceil(2).min(MAX_SUGGESTED_SETS),
            };
            Some((suggestion, max_matched_shortfall))
        })
        .collect();

    suggestions.sort_by(|(a, a_max), (b, b_max)| {
        b.primary_matches
            .len()
            .cmp(&a.primary_matches.len())
            .then_with(|| b_max.cmp(a_max))
            .then_with(|| a.name.cmp(&b.name))
    });

    suggestions.into_iter().map(|(s, _)| s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EquipmentKind;
    use crate::volume::MuscleVolume;

    fn exercise(id: &str, primary: &[MuscleGroup], secondary: &[MuscleGroup]) -> Exercise {
        Exercise {
            id: id.into(),
            name: id.to_uppercase(),
            equipment: EquipmentKind::Barbell,
            cable_attachment: None,
            primary_muscle_groups: primary.to_vec(),
            secondary_muscle_groups: secondary.to_vec(),
            legacy_primary_muscle_group: None,
            location_ids: vec!["gym".into()],
            is_custom: false,
        }
    }

    fn volume(muscle: MuscleGroup, sets: u32, target: u32) -> MuscleVolume {
        MuscleVolume {
            muscle,
            sets,
            target,
            per_exercise: vec![],
        }
    }

    #[test]
    fn test_shortfalls_most_behind_first() {
        let volumes = vec![
            volume(MuscleGroup::Chest, 9, 10),  // 90% complete
            volume(MuscleGroup::Quads, 2, 10),  // 20% complete
            volume(MuscleGroup::Lats, 10, 10),  // met
            volume(MuscleGroup::Abs, 0, 0),     // untargeted
        ];

        let behind = shortfalls(&volumes);
        assert_eq!(behind.len(), 2);
        assert_eq!(behind[0].muscle, MuscleGroup::Quads);
        assert_eq!(behind[0].amount(), 8);
        assert_eq!(behind[1].muscle, MuscleGroup::Chest);
    }

    #[test]
    fn test_scenario_d_primary_hit_count_ranks_first() {
        // Shortfalls: quads behind by 4, chest behind by 1
        let behind = vec![
            Shortfall {
                muscle: MuscleGroup::Quads,
                current: 6,
                target: 10,
            },
            Shortfall {
                muscle: MuscleGroup::Chest,
                current: 9,
                target: 10,
            },
        ];
        let exercises = vec![
            exercise("bench", &[MuscleGroup::Chest], &[]),
            exercise("squat", &[MuscleGroup::Quads], &[]),
        ];

        let suggestions = suggest_exercises(&exercises, "gym", &behind);
        assert_eq!(suggestions.len(), 2);
        // Equal primary-hit counts; squat wins on larger matched shortfall
        assert_eq!(suggestions[0].exercise_id, "squat");
        assert_eq!(suggestions[1].exercise_id, "bench");
    }

    #[test]
    fn test_suggested_sets_half_of_shortfall_capped_at_4() {
        let behind = vec![Shortfall {
            muscle: MuscleGroup::Quads,
            current: 0,
            target: 10,
        }];
        let exercises = vec![exercise("squat", &[MuscleGroup::Quads], &[])];

        let suggestions = suggest_exercises(&exercises, "gym", &behind);
        // ceil(10 / 2) = 5, capped at 4
        assert_eq!(suggestions[0].suggested_sets, 4);

        let small = vec![Shortfall {
            muscle: MuscleGroup::Quads,
            current: 7,
            target: 10,
        }];
        let suggestions = suggest_exercises(&exercises, "gym", &small);
        // ceil(3 / 2) = 2
        assert_eq!(suggestions[0].suggested_sets, 2);
    }

    #[test]
    fn test_secondary_only_match_is_suggested_but_unselected() {
        let behind = vec![Shortfall {
            muscle: MuscleGroup::Triceps,
            current: 1,
            target: 6,
        }];
        let exercises = vec![
            exercise("bench", &[MuscleGroup::Chest], &[MuscleGroup::Triceps]),
            exercise("pushdown", &[MuscleGroup::Triceps], &[]),
            exercise("curl", &[MuscleGroup::Biceps], &[]),
        ];

        let suggestions = suggest_exercises(&exercises, "gym", &behind);
        // curl matches nothing and is dropped
        assert_eq!(suggestions.len(), 2);

        let pushdown = suggestions
            .iter()
            .find(|s| s.exercise_id == "pushdown")
            .unwrap();
        assert!(pushdown.preselected);

        let bench = suggestions.iter().find(|s| s.exercise_id == "bench").unwrap();
        assert!(!bench.preselected);
        assert_eq!(bench.secondary_matches, vec![MuscleGroup::Triceps]);
    }

    #[test]
    fn test_location_filters_candidates() {
        let behind = vec![Shortfall {
            muscle: MuscleGroup::Quads,
            current: 0,
            target: 10,
        }];
        let mut home_squat = exercise("goblet", &[MuscleGroup::Quads], &[]);
        home_squat.location_ids = vec!["home".into()];
        let exercises = vec![exercise("squat", &[MuscleGroup::Quads], &[]), home_squat];

        let at_home = suggest_exercises(&exercises, "home", &behind);
        assert_eq!(at_home.len(), 1);
        assert_eq!(at_home[0].exercise_id, "goblet");
    }

    #[test]
    fn test_more_primary_hits_outranks_bigger_shortfall() {
        let behind = vec![
            Shortfall {
                muscle: MuscleGroup::Hamstrings,
                current: 0,
                target: 10, // amount 10
            },
            Shortfall {
                muscle: MuscleGroup::Glutes,
                current: 4,
                target: 6, // amount 2
            },
        ];
        let exercises = vec![
            exercise("leg_curl", &[MuscleGroup::Hamstrings], &[]),
            exercise(
                "rdl",
                &[MuscleGroup::Hamstrings, MuscleGroup::Glutes],
                &[],
            ),
        ];

        let suggestions = suggest_exercises(&exercises, "gym", &behind);
        assert_eq!(suggestions[0].exercise_id, "rdl"); // two primary hits
        assert_eq!(suggestions[1].exercise_id, "leg_curl");
    }
}
