//! Built-in exercise catalog: muscle group → exercise → variant axes.
//!
//! The catalog drives the dependent selectors of the log-entry form: the
//! day's muscle groups pick the exercises on offer, the exercise picks the
//! equipment, grip and laterality values on offer, and the picked values
//! compose the label stored with the set.

use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<ExerciseCatalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static ExerciseCatalog {
    &DEFAULT_CATALOG
}

/// What an empty muscle-group selection offers
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmptySelection {
    /// No exercises until a group is chosen
    #[default]
    Nothing,
    /// The whole catalog, unfiltered
    Everything,
}

/// Exercises keyed by name with their variant axes
pub type ExerciseMap = BTreeMap<String, ExerciseVariants>;

/// Static mapping from muscle group to its exercises
#[derive(Clone, Debug, Default)]
pub struct ExerciseCatalog {
    groups: BTreeMap<String, ExerciseMap>,
}

fn variants(equipment: &[&str], grips: &[&str], modes: &[&str]) -> ExerciseVariants {
    let owned = |values: &[&str]| values.iter().map(|v| v.to_string()).collect();
    ExerciseVariants {
        equipment: owned(equipment),
        grips: owned(grips),
        modes: owned(modes),
        metric: MetricKind::WeightReps,
    }
}

fn cardio(equipment: &[&str]) -> ExerciseVariants {
    ExerciseVariants {
        metric: MetricKind::SpeedDuration,
        ..variants(equipment, &[], &[])
    }
}

const LATERAL: &[&str] = &["Both", SINGLE_VARIANT];

/// Builds the default catalog
#[rustfmt::skip]
pub fn build_default_catalog() -> ExerciseCatalog {
    let mut catalog = ExerciseCatalog::default();

    catalog.insert("Chest", "Bench Press", variants(&["Barbell", "Dumbbell", "Smith Machine"], &["Wide", "Close"], &[]));
    catalog.insert("Chest", "Incline Press", variants(&["Barbell", "Dumbbell", "Machine"], &[], &[]));
    catalog.insert("Chest", "Chest Fly", variants(&["Cable", "Dumbbell", "Machine"], &[], LATERAL));
    catalog.insert("Chest", "Push Up", variants(&[], &["Wide", "Close", "Diamond"], &[]));
    catalog.insert("Chest", "Dips", variants(&[], &[], &[]));

    catalog.insert("Back", "Pull Up", variants(&[], &["Wide", "Neutral", "Chin-up"], &[]));
    catalog.insert("Back", "Lat Pulldown", variants(&["Cable", "Machine"], &["Wide", "Close", "Neutral", "Underhand"], LATERAL));
    catalog.insert("Back", "Row", variants(&["Barbell", "Dumbbell", "Cable", "Machine"], &["Overhand", "Underhand", "Neutral"], LATERAL));
    catalog.insert("Back", "Deadlift", variants(&["Barbell", "Trap Bar"], &["Double Overhand", "Mixed", "Hook"], &[]));

    catalog.insert("Shoulders", "Overhead Press", variants(&["Barbell", "Dumbbell", "Machine"], &[], LATERAL));
    catalog.insert("Shoulders", "Lateral Raise", variants(&["Dumbbell", "Cable"], &[], LATERAL));
    catalog.insert("Shoulders", "Face Pull", variants(&["Cable"], &["Rope"], &[]));
    catalog.insert("Shoulders", "Rear Delt Fly", variants(&["Dumbbell", "Cable", "Machine"], &[], &[]));

    catalog.insert("Legs", "Squat", variants(&["Barbell", "Smith Machine", "Goblet"], &[], &[]));
    // Same name as the Back entry; selecting both groups keeps this one.
    catalog.insert("Legs", "Deadlift", variants(&["Barbell", "Dumbbell", "Trap Bar"], &[], LATERAL));
    catalog.insert("Legs", "Leg Press", variants(&["Machine"], &[], LATERAL));
    catalog.insert("Legs", "Lunge", variants(&["Dumbbell", "Barbell", "Bodyweight"], &[], &[]));
    catalog.insert("Legs", "Leg Curl", variants(&["Machine"], &[], LATERAL));
    catalog.insert("Legs", "Leg Extension", variants(&["Machine"], &[], LATERAL));
    catalog.insert("Legs", "Kettlebell Swing", variants(&["Double", SINGLE_VARIANT], &[], &[]));
    catalog.insert("Legs", "Calf Raise", variants(&["Machine", "Dumbbell"], &[], LATERAL));

    catalog.insert("Arms", "Bicep Curl", variants(&["Barbell", "Dumbbell", "Cable", "EZ Bar"], &["Supinated", "Hammer"], LATERAL));
    catalog.insert("Arms", "Tricep Extension", variants(&["Cable", "Dumbbell"], &["Rope", "Straight Bar", "V-Bar"], LATERAL));
    catalog.insert("Arms", "Preacher Curl", variants(&["EZ Bar", "Dumbbell", "Machine"], &[], LATERAL));

    catalog.insert("Core", "Plank", variants(&[], &[], &[]));
    catalog.insert("Core", "Hanging Leg Raise", variants(&[], &[], &[]));
    catalog.insert("Core", "Cable Crunch", variants(&["Cable"], &[], &[]));

    catalog.insert("Cardio", "Treadmill", cardio(&[]));
    catalog.insert("Cardio", "Cycling", cardio(&["Stationary Bike", "Outdoor"]));
    catalog.insert("Cardio", "Rowing Machine", cardio(&[]));
    catalog.insert("Cardio", "Stair Climber", cardio(&[]));

    catalog
}

impl ExerciseCatalog {
    /// Add or replace one exercise under a muscle group
    pub fn insert(&mut self, group: &str, exercise: &str, variants: ExerciseVariants) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(exercise.to_string(), variants);
    }

    /// All configured muscle-group names
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn group(&self, name: &str) -> Option<&ExerciseMap> {
        self.groups.get(name)
    }

    /// Case-insensitive lookup of a configured group name
    pub fn canonical_group(&self, name: &str) -> Option<&str> {
        self.groups
            .keys()
            .find(|g| g.eq_ignore_ascii_case(name.trim()))
            .map(String::as_str)
    }

    /// Union of the exercises configured for the selected groups.
    ///
    /// Groups merge in selection order; an exercise name defined by two
    /// groups takes the definition of the later one. Unknown groups add
    /// nothing.
    pub fn exercises_for<S: AsRef<str>>(&self, selected: &[S], policy: EmptySelection) -> ExerciseMap {
        let mut merged = ExerciseMap::new();

        if selected.is_empty() {
            if policy == EmptySelection::Everything {
                for exercises in self.groups.values() {
                    merged.extend(exercises.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
            return merged;
        }

        for group in selected {
            match self.groups.get(group.as_ref()) {
                Some(exercises) => {
                    merged.extend(exercises.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                None => tracing::debug!("No catalog entries for muscle group {:?}", group.as_ref()),
            }
        }

        merged
    }

    /// Variant axes of one exercise within the merged view of the selected groups
    pub fn variants<S: AsRef<str>>(
        &self,
        selected: &[S],
        policy: EmptySelection,
        exercise: &str,
    ) -> Option<ExerciseVariants> {
        let merged = self.exercises_for(selected, policy);
        find_exercise(&merged, exercise).map(|(_, v)| v.clone())
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.groups.is_empty() {
            errors.push("Catalog has no muscle groups".to_string());
        }

        for (group, exercises) in &self.groups {
            if group.trim().is_empty() {
                errors.push("Catalog has a muscle group with an empty name".to_string());
            }
            if exercises.is_empty() {
                errors.push(format!("Muscle group '{}' has no exercises", group));
            }
            for (name, v) in exercises {
                if name.trim().is_empty() {
                    errors.push(format!("Muscle group '{}' has an exercise with an empty name", group));
                }
                let axes = [("equipment", &v.equipment), ("grip", &v.grips), ("mode", &v.modes)];
                for (axis, values) in axes {
                    if values.iter().any(|value| value.trim().is_empty()) {
                        errors.push(format!("Exercise '{}' has an empty {} value", name, axis));
                    }
                    for (i, value) in values.iter().enumerate() {
                        if values[..i].iter().any(|earlier| earlier.eq_ignore_ascii_case(value)) {
                            errors.push(format!("Exercise '{}' lists {} '{}' twice", name, axis, value));
                        }
                    }
                }
            }
        }

        errors
    }

    /// Fail with [`Error::CatalogValidation`] when `validate` reports problems
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            return Ok(());
        }
        for error in &errors {
            tracing::error!("Catalog: {}", error);
        }
        Err(Error::CatalogValidation(errors.join("; ")))
    }
}

/// Case-insensitive exercise lookup returning the configured name
pub fn find_exercise<'a>(
    exercises: &'a ExerciseMap,
    name: &str,
) -> Option<(&'a String, &'a ExerciseVariants)> {
    let name = name.trim();
    exercises
        .get_key_value(name)
        .or_else(|| exercises.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)))
}

fn canonical_value(axis: &str, allowed: &[String], chosen: Option<&String>) -> Result<Option<String>> {
    let Some(chosen) = chosen else {
        return Ok(None);
    };
    if allowed.is_empty() {
        return Err(Error::Validation(format!(
            "this exercise has no {} options, got '{}'",
            axis, chosen
        )));
    }
    allowed
        .iter()
        .find(|value| value.eq_ignore_ascii_case(chosen.trim()))
        .map(|value| Some(value.clone()))
        .ok_or_else(|| {
            Error::Validation(format!(
                "unknown {} '{}', expected one of: {}",
                axis,
                chosen,
                allowed.join(", ")
            ))
        })
}

/// Check a choice against the exercise's axes, returning it with configured spelling
pub fn normalize_choice(variants: &ExerciseVariants, choice: &VariantChoice) -> Result<VariantChoice> {
    let normalized = VariantChoice {
        equipment: canonical_value("equipment", &variants.equipment, choice.equipment.as_ref())?,
        grip: canonical_value("grip", &variants.grips, choice.grip.as_ref())?,
        mode: canonical_value("mode", &variants.modes, choice.mode.as_ref())?,
        side: choice.side,
    };

    if normalized.side.is_some() && !normalized.is_single() {
        return Err(Error::Validation(format!(
            "a side is only recorded for the '{}' variant",
            SINGLE_VARIANT
        )));
    }

    Ok(normalized)
}

/// Compose the stored display label for a logged set.
///
/// Qualifiers follow the fixed order equipment, grip, mode, side. The side
/// only appears when mode or equipment is the single variant.
pub fn compose_label(base: &str, choice: &VariantChoice) -> String {
    let mut qualifiers: Vec<String> = [&choice.equipment, &choice.grip, &choice.mode]
        .into_iter()
        .flatten()
        .filter(|q| !q.is_empty())
        .cloned()
        .collect();

    if choice.is_single() {
        if let Some(side) = choice.side {
            qualifiers.push(side.to_string());
        }
    }

    if qualifiers.is_empty() {
        base.to_string()
    } else {
        format!("{} ({})", base, qualifiers.join(", "))
    }
}

/// A fully resolved log-entry selection
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedExercise {
    pub label: String,
    pub metric: MetricKind,
}

/// Resolve an exercise and its variant choice against the selected groups
pub fn resolve_exercise<S: AsRef<str>>(
    catalog: &ExerciseCatalog,
    groups: &[S],
    policy: EmptySelection,
    exercise: &str,
    choice: &VariantChoice,
) -> Result<ResolvedExercise> {
    let merged = catalog.exercises_for(groups, policy);
    let (name, variants) = find_exercise(&merged, exercise).ok_or_else(|| {
        Error::Validation(format!(
            "'{}' is not offered for muscle groups [{}]",
            exercise,
            groups.iter().map(|g| g.as_ref()).collect::<Vec<_>>().join(", ")
        ))
    })?;

    let choice = normalize_choice(variants, choice)?;
    Ok(ResolvedExercise {
        label: compose_label(name, &choice),
        metric: variants.metric,
    })
}
