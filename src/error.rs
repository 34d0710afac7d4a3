//! # Planning Error Types Module
//!
//! This module defines the domain error types used throughout the planning
//! engine. Local recovery is the rule: a failing candidate source, detail
//! fetch, or classification call drops the affected recipe and the run
//! completes partially. Only user-facing operations return these errors.

use crate::model::SlotKey;

/// Errors surfaced by the planning engine
#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Meal history could not be loaded; the run degrades to a uniform profile
    ProfileUnavailable(String),
    /// A slot could not be filled with any in-policy candidate
    NoCandidatesFound(SlotKey),
    /// The requested recipe contains a non-replaceable excluded ingredient
    ExclusionConflict {
        ingredient: String,
        recipe_title: String,
    },
    /// Multi-day operation on a slot without a recipe, on an already grouped
    /// slot, or with an invalid slot reference
    InvalidGroupReference(String),
    /// Selected index is beyond the slot's alternatives list
    StaleSelection { requested: usize, available: usize },
    /// A plan generation run is already in flight
    GenerationInProgress,
    /// Rating outside the 1-5 star range
    InvalidRating(u8),
    /// No weekly plan has been generated yet
    NoPlan,
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanError::ProfileUnavailable(msg) => write!(f, "Profile unavailable: {msg}"),
            PlanError::NoCandidatesFound(slot) => {
                write!(f, "No candidates found for slot {slot}")
            }
            PlanError::ExclusionConflict {
                ingredient,
                recipe_title,
            } => write!(
                f,
                "Recipe '{recipe_title}' contains excluded ingredient '{ingredient}' with no replacement"
            ),
            PlanError::InvalidGroupReference(msg) => write!(f, "Invalid group reference: {msg}"),
            PlanError::StaleSelection {
                requested,
                available,
            } => write!(
                f,
                "Selection index {requested} out of range ({available} alternatives)"
            ),
            PlanError::GenerationInProgress => {
                write!(f, "A plan generation run is already in progress")
            }
            PlanError::InvalidRating(stars) => {
                write!(f, "Rating must be 1-5 stars, got {stars}")
            }
            PlanError::NoPlan => write!(f, "No weekly plan has been generated yet"),
        }
    }
}

impl std::error::Error for PlanError {}

impl From<anyhow::Error> for PlanError {
    fn from(err: anyhow::Error) -> Self {
        PlanError::ProfileUnavailable(err.to_string())
    }
}
