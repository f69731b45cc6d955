/*
 * This module owns the canonical list of exercise records and the validation
 * rules for creating and editing them. All catalog mutations in the
 * application go through `ExerciseStore`; callers that hold session state
 * derived from the catalog (current lesson, edit target, selection set) are
 * expected to run their consistency pass after every mutation here.
 *
 * Ordering contract: the newest record is first. `add` prepends, and `list`
 * returns records in that store order for rendering.
 */
use super::models::{Exercise, ExerciseDraft, ExerciseId};
use std::collections::HashSet;

#[derive(Debug)]
pub enum StoreError {
    /* A required free-text field was empty after trimming. */
    EmptyField(&'static str),
    NotFound(ExerciseId),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::EmptyField(field) => write!(f, "{field} must not be empty"),
            StoreError::NotFound(id) => write!(f, "No exercise with id {id}"),
        }
    }
}

impl std::error::Error for StoreError {}

pub type Result<T> = std::result::Result<T, StoreError>;

pub struct ExerciseStore {
    records: Vec<Exercise>,
    next_id: u64,
}

impl ExerciseStore {
    pub fn new() -> Self {
        ExerciseStore {
            records: Vec::new(),
            next_id: 1,
        }
    }

    /*
     * Validates a draft and turns it into the trimmed field values an
     * `Exercise` stores. Checked before any mutation so a failed save
     * leaves the store untouched.
     */
    fn validated_fields(draft: &ExerciseDraft) -> Result<(String, String, Option<String>)> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(StoreError::EmptyField("title"));
        }
        let instructions = draft.instructions.trim();
        if instructions.is_empty() {
            return Err(StoreError::EmptyField("instructions"));
        }
        let video_url = draft.video_url.trim();
        let video_url = if video_url.is_empty() {
            None
        } else {
            Some(video_url.to_string())
        };
        Ok((title.to_string(), instructions.to_string(), video_url))
    }

    /*
     * Creates a new exercise from a validated draft and returns its fresh
     * id. The record is inserted first so the most recent addition renders
     * on top of the catalog.
     */
    pub fn add(&mut self, draft: &ExerciseDraft) -> Result<ExerciseId> {
        let (title, instructions, video_url) = Self::validated_fields(draft)?;
        let id = ExerciseId(self.next_id);
        self.next_id += 1;

        self.records.insert(
            0,
            Exercise {
                id,
                title,
                instructions,
                video_url,
                location: draft.location,
                uses_rep_count: draft.uses_rep_count,
            },
        );
        log::debug!(
            "ExerciseStore: Added exercise {id} ('{}'), {} total.",
            self.records[0].title,
            self.records.len()
        );
        Ok(id)
    }

    /*
     * Overwrites all editable fields of an existing record from a validated
     * draft. The id and the record's position in store order are unchanged.
     */
    pub fn update(&mut self, id: ExerciseId, draft: &ExerciseDraft) -> Result<&Exercise> {
        let (title, instructions, video_url) = Self::validated_fields(draft)?;
        let record = self
            .records
            .iter_mut()
            .find(|ex| ex.id == id)
            .ok_or(StoreError::NotFound(id))?;

        record.title = title;
        record.instructions = instructions;
        record.video_url = video_url;
        record.location = draft.location;
        record.uses_rep_count = draft.uses_rep_count;
        log::debug!("ExerciseStore: Updated exercise {id} ('{}').", record.title);
        Ok(record)
    }

    /// Removes one record. Idempotent: removing an absent id is not an
    /// error, the call just reports that nothing happened.
    pub fn remove(&mut self, id: ExerciseId) -> bool {
        let before = self.records.len();
        self.records.retain(|ex| ex.id != id);
        let removed = self.records.len() < before;
        if removed {
            log::debug!("ExerciseStore: Removed exercise {id}.");
        } else {
            log::trace!("ExerciseStore: Remove of absent exercise {id} ignored.");
        }
        removed
    }

    /// Removes every matching record as a single state transition and
    /// returns how many were dropped. Callers run their consistency pass
    /// once afterwards, not per id.
    pub fn remove_many(&mut self, ids: &HashSet<ExerciseId>) -> usize {
        let before = self.records.len();
        self.records.retain(|ex| !ids.contains(&ex.id));
        let removed = before - self.records.len();
        log::debug!(
            "ExerciseStore: Batch removed {removed} of {} requested exercises.",
            ids.len()
        );
        removed
    }

    pub fn get(&self, id: ExerciseId) -> Option<&Exercise> {
        self.records.iter().find(|ex| ex.id == id)
    }

    pub fn contains(&self, id: ExerciseId) -> bool {
        self.get(id).is_some()
    }

    /// Records in store order, newest first.
    pub fn list(&self) -> &[Exercise] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for ExerciseStore {
    fn default() -> Self {
        Self::new()
    }
}
