/*
 * This module consolidates the core, presentation-agnostic logic of the
 * application. It re-exports the data model and the key abstractions
 * (`RandomnessOperations`, `HistoryStoreOperations`) together with their
 * concrete implementations, the exercise catalog, the visibility policy,
 * and the completion log.
 */
pub mod exercise_store;
pub mod history;
pub mod models;
pub mod path_utils;
pub mod persistence;
pub mod selection;
pub mod visibility;

// Re-export key structures and enums
pub use models::{Exercise, ExerciseDraft, ExerciseId, HistoryEntry, Location, Role, UserAccount};

// Re-export catalog related items
pub use exercise_store::{ExerciseStore, StoreError};

// Re-export selection related items
pub use selection::{
    CoreRandomness, RandomnessOperations, SelectionError, REP_COUNT_MAX, REP_COUNT_MIN,
};

// Re-export history and persistence related items
pub use history::{HistoryFilter, HistoryLog};
pub use persistence::{HistoryStoreOperations, JsonHistoryStore, PersistenceError};
