//! # Meal Planner
//!
//! A weekly meal recommendation and allocation engine: builds a taste
//! profile from cook history, scores recipe candidates against it, fills
//! the week's 14 lunch and dinner slots with a 60/40 mix of favorites and
//! newly scouted recipes, and aggregates the result into store-split
//! shopping lists.

pub mod allocator;
pub mod availability;
pub mod engine;
pub mod error;
pub mod exclusion;
pub mod model;
pub mod multi_day;
pub mod normalize;
pub mod profile;
pub mod scoring;
pub mod shopping;
pub mod sources;
