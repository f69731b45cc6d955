use crate::core::{
    selection, visibility, Exercise, ExerciseDraft, ExerciseId, ExerciseStore, HistoryEntry,
    HistoryFilter, HistoryLog, HistoryStoreOperations, Location, RandomnessOperations, Role,
    SelectionError, StoreError, UserAccount,
};
use std::collections::HashSet;
use std::sync::Arc;
use time::{Date, OffsetDateTime};

#[derive(Debug)]
pub enum SessionError {
    Store(StoreError),
    Selection(SelectionError),
    /* A management operation was invoked by an actor without the capability. */
    NotPermitted,
    /* mark_done or a video request with nothing active. */
    NoLesson,
    /* resolve_pick without a begin_pick in flight. */
    NoPendingPick,
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        SessionError::Store(err)
    }
}

impl From<SelectionError> for SessionError {
    fn from(err: SelectionError) -> Self {
        SessionError::Selection(err)
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Store(e) => write!(f, "{e}"),
            SessionError::Selection(e) => write!(f, "{e}"),
            SessionError::NotPermitted => {
                write!(f, "The active account is not allowed to manage sessions")
            }
            SessionError::NoLesson => write!(f, "No lesson is currently active"),
            SessionError::NoPendingPick => write!(f, "No randomize request is pending"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Store(e) => Some(e),
            SessionError::Selection(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

/*
 * Owns the whole session: the exercise catalog, the completion log, the
 * user directory, and every piece of transient state the presentation
 * layer renders (current lesson, edit form, bulk selection, filters,
 * pending-pick flag). All mutations come through the methods below, and
 * every mutating method finishes by running `reconcile`, the explicit
 * consistency pass that keeps the session state valid against the catalog
 * and the visibility policy. Nothing here waits or sleeps; the simulated
 * pick latency belongs to the presentation layer, which calls
 * `begin_pick` and later `resolve_pick`.
 */
pub struct SessionController {
    store: ExerciseStore,
    history: HistoryLog,
    user_directory: Vec<UserAccount>,
    active_user_email: Option<String>,
    location_filter: Option<Location>,
    history_filter: HistoryFilter,
    /* The lesson is stored by id and read through the store, so an edit can
     * never leave a stale copy on display. */
    current_lesson_id: Option<ExerciseId>,
    editing_target_id: Option<ExerciseId>,
    form_draft: ExerciseDraft,
    selected_ids: HashSet<ExerciseId>,
    /* Present iff the current lesson carries `uses_rep_count`. */
    rep_count: Option<u8>,
    manager_open: bool,
    pick_pending: bool,
    randomness: Arc<dyn RandomnessOperations>,
}

impl SessionController {
    /*
     * Builds a controller with an empty catalog and directory. The history
     * store is consulted once, here, to restore the persisted log. Seed
     * data is installed afterwards through `add_exercise` and
     * `set_user_directory`.
     */
    pub fn new(
        randomness: Arc<dyn RandomnessOperations>,
        history_store: Arc<dyn HistoryStoreOperations>,
    ) -> Self {
        let history = HistoryLog::load(history_store);
        SessionController {
            store: ExerciseStore::new(),
            history,
            user_directory: Vec::new(),
            active_user_email: None,
            location_filter: None,
            history_filter: HistoryFilter::default(),
            current_lesson_id: None,
            editing_target_id: None,
            form_draft: ExerciseDraft::default(),
            selected_ids: HashSet::new(),
            rep_count: None,
            manager_open: false,
            pick_pending: false,
            randomness,
        }
    }

    // ---- derived state the presentation layer reads ----

    pub fn active_user(&self) -> Option<&UserAccount> {
        let email = self.active_user_email.as_deref()?;
        self.user_directory.iter().find(|user| user.email == email)
    }

    pub fn is_admin(&self) -> bool {
        self.active_user().is_some_and(|user| user.is_admin())
    }

    /// Whether the current actor may use the management surface. With no
    /// user directory installed there is no access-control data at all and
    /// management is open to the (single) tenant.
    pub fn can_manage(&self) -> bool {
        self.user_directory.is_empty() || self.is_admin()
    }

    /// The pool the actor can see and pick from: access filter first, then
    /// location filter.
    pub fn visible_exercises(&self) -> Vec<&Exercise> {
        visibility::visible_exercises(
            &self.user_directory,
            self.active_user_email.as_deref(),
            self.location_filter,
            self.store.list(),
        )
    }

    /// Every record in the catalog, for the management list. Store order,
    /// newest first.
    pub fn catalog(&self) -> &[Exercise] {
        self.store.list()
    }

    pub fn current_lesson(&self) -> Option<&Exercise> {
        self.current_lesson_id.and_then(|id| self.store.get(id))
    }

    pub fn rep_count(&self) -> Option<u8> {
        self.rep_count
    }

    pub fn form_draft(&self) -> &ExerciseDraft {
        &self.form_draft
    }

    pub fn editing_target_id(&self) -> Option<ExerciseId> {
        self.editing_target_id
    }

    pub fn selected_ids(&self) -> &HashSet<ExerciseId> {
        &self.selected_ids
    }

    pub fn manager_open(&self) -> bool {
        self.manager_open
    }

    pub fn pick_pending(&self) -> bool {
        self.pick_pending
    }

    pub fn location_filter(&self) -> Option<Location> {
        self.location_filter
    }

    pub fn history_filter(&self) -> HistoryFilter {
        self.history_filter
    }

    pub fn user_directory(&self) -> &[UserAccount] {
        &self.user_directory
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Flat history view for the active filter, newest first.
    pub fn history_view(&self, reference: Date) -> Vec<&HistoryEntry> {
        self.history.filter_by_mode(self.history_filter, reference)
    }

    /// Day-bucketed history summary, most recent day first.
    pub fn history_by_day(&self) -> Vec<(Date, Vec<&HistoryEntry>)> {
        self.history.grouped_by_day()
    }

    // ---- actor and filter context ----

    /*
     * Installs the user directory and selects the default actor: the first
     * customer, falling back to the first entry. The consistency pass then
     * hides whatever the new actor may not see.
     */
    pub fn set_user_directory(&mut self, directory: Vec<UserAccount>) {
        self.active_user_email = directory
            .iter()
            .find(|user| user.role == Role::Customer)
            .or_else(|| directory.first())
            .map(|user| user.email.clone());
        log::debug!(
            "SessionController: Installed user directory with {} accounts; active {:?}.",
            directory.len(),
            self.active_user_email
        );
        self.user_directory = directory;
        self.reconcile();
    }

    /// Switches the active actor. An email that resolves to no directory
    /// entry is kept but hides every exercise until a known account is
    /// chosen. Returns whether the email resolved.
    pub fn set_actor(&mut self, email: &str) -> bool {
        log::trace!("SessionController: Switching actor to '{email}'.");
        self.active_user_email = Some(email.to_string());
        let resolved = self.active_user().is_some();
        if !resolved {
            log::warn!(
                "SessionController: Unknown account '{email}'; exercises stay hidden until a known account is selected."
            );
        }
        self.reconcile();
        resolved
    }

    pub fn set_location_filter(&mut self, filter: Option<Location>) {
        log::debug!("SessionController: Location filter set to {filter:?}.");
        self.location_filter = filter;
        self.reconcile();
    }

    pub fn set_history_filter(&mut self, filter: HistoryFilter) {
        self.history_filter = filter;
    }

    // ---- the randomize protocol ----

    /*
     * First half of a randomize request. Refuses when nothing is eligible
     * and ignores re-entrant requests while one is pending (returns false),
     * so a double-click cannot race two picks onto the lesson slot. The
     * presentation layer may wait between the two halves; the store is
     * never blocked meanwhile.
     */
    pub fn begin_pick(&mut self) -> Result<bool> {
        if self.pick_pending {
            log::debug!("SessionController: Randomize already pending; ignoring request.");
            return Ok(false);
        }
        if self.visible_exercises().is_empty() {
            return Err(SelectionError::EmptyPool.into());
        }
        self.pick_pending = true;
        Ok(true)
    }

    /*
     * Second half: picks from the pool as it exists NOW, not as it existed
     * at request time, so edits and deletions that landed in between are
     * honored. A pool that emptied in the meantime fails with EmptyPool and
     * leaves the current lesson unchanged. The rep count is rolled fresh
     * for the new lesson, discarding any prior value.
     */
    pub fn resolve_pick(&mut self) -> Result<ExerciseId> {
        if !self.pick_pending {
            return Err(SessionError::NoPendingPick);
        }
        self.pick_pending = false;

        let (picked_id, rolled) = {
            let pool = self.visible_exercises();
            let picked = selection::pick_random(&pool, self.randomness.as_ref())?;
            (
                picked.id,
                selection::roll_rep_count(picked, self.randomness.as_ref()),
            )
        };
        self.current_lesson_id = Some(picked_id);
        self.rep_count = rolled;
        log::debug!("SessionController: Lesson {picked_id} is now active (rep count {rolled:?}).");
        self.reconcile();
        Ok(picked_id)
    }

    /// Rolls a new rep count for the current lesson without changing the
    /// lesson itself. None when there is no lesson or the drill does not
    /// use one.
    pub fn reroll_rep_count(&mut self) -> Option<u8> {
        let rolled = self
            .current_lesson()
            .and_then(|lesson| selection::roll_rep_count(lesson, self.randomness.as_ref()));
        self.rep_count = rolled;
        rolled
    }

    // ---- completing sessions ----

    /// Records the current lesson as completed at the given moment. The
    /// entry snapshots the title, so later edits or deletions of the
    /// exercise never touch history.
    pub fn mark_done(&mut self, completed_at: OffsetDateTime) -> Result<&HistoryEntry> {
        let title = match self.current_lesson() {
            Some(lesson) => lesson.title.clone(),
            None => return Err(SessionError::NoLesson),
        };
        Ok(self.history.append(&title, completed_at))
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ---- the management surface ----

    /*
     * Opens the management surface. With a lesson active the form starts
     * as an edit of that lesson; otherwise it starts as a blank
     * "create new" draft.
     */
    pub fn open_manager(&mut self) -> Result<()> {
        if !self.can_manage() {
            return Err(SessionError::NotPermitted);
        }
        match self.current_lesson().cloned() {
            Some(lesson) => {
                self.editing_target_id = Some(lesson.id);
                self.form_draft = ExerciseDraft::from_exercise(&lesson);
            }
            None => {
                self.editing_target_id = None;
                self.form_draft = ExerciseDraft::default();
            }
        }
        self.manager_open = true;
        Ok(())
    }

    pub fn close_manager(&mut self) {
        self.manager_open = false;
    }

    /// Loads an existing record into the form for editing.
    pub fn edit_from_list(&mut self, id: ExerciseId) -> Result<()> {
        if !self.can_manage() {
            return Err(SessionError::NotPermitted);
        }
        let target = self
            .store
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(id))?;
        self.editing_target_id = Some(target.id);
        self.form_draft = ExerciseDraft::from_exercise(&target);
        Ok(())
    }

    /// Resets the form to a blank "create new" draft.
    pub fn start_new_draft(&mut self) -> Result<()> {
        if !self.can_manage() {
            return Err(SessionError::NotPermitted);
        }
        self.editing_target_id = None;
        self.form_draft = ExerciseDraft::default();
        Ok(())
    }

    /// Replaces the working draft. Validation happens at save time.
    pub fn set_form_draft(&mut self, draft: ExerciseDraft) {
        self.form_draft = draft;
    }

    /*
     * Saves the working draft. A validation failure leaves every piece of
     * state untouched, including the open management surface, so the user
     * can fix the form. On success: an edit overwrites the target record
     * (the lesson display refreshes by construction, since it reads
     * through the store), a create inserts the new record and makes it the
     * current lesson. Both paths close the management surface.
     */
    pub fn save_draft(&mut self) -> Result<ExerciseId> {
        if !self.can_manage() {
            return Err(SessionError::NotPermitted);
        }
        let draft = self.form_draft.clone();
        let saved_id = match self.editing_target_id {
            Some(target) => {
                self.store.update(target, &draft)?;
                target
            }
            None => {
                let new_id = self.store.add(&draft)?;
                self.current_lesson_id = Some(new_id);
                // The lesson changed, so any rep count from the previous
                // lesson is stale; the consistency pass rolls a fresh one
                // if the new drill wants it.
                self.rep_count = None;
                new_id
            }
        };
        self.manager_open = false;
        self.reconcile();
        Ok(saved_id)
    }

    /// Adds a record directly, without touching the form or the current
    /// lesson. Used for bulk installs such as the seed catalog.
    pub fn add_exercise(&mut self, draft: &ExerciseDraft) -> Result<ExerciseId> {
        if !self.can_manage() {
            return Err(SessionError::NotPermitted);
        }
        let id = self.store.add(draft)?;
        self.reconcile();
        Ok(id)
    }

    /// Deletes one record. Deleting an id that is already gone is a no-op.
    pub fn delete_one(&mut self, id: ExerciseId) -> Result<()> {
        if !self.can_manage() {
            return Err(SessionError::NotPermitted);
        }
        self.store.remove(id);
        self.reconcile();
        Ok(())
    }

    /// Deletes every record in the bulk selection as one transition and
    /// returns how many were removed. The consistency pass runs once for
    /// the whole batch.
    pub fn delete_selected(&mut self) -> Result<usize> {
        if !self.can_manage() {
            return Err(SessionError::NotPermitted);
        }
        if self.selected_ids.is_empty() {
            return Ok(0);
        }
        let doomed = self.selected_ids.clone();
        let removed = self.store.remove_many(&doomed);
        self.selected_ids.clear();
        self.reconcile();
        Ok(removed)
    }

    /// Toggles one record in the bulk selection. Returns whether the id is
    /// selected afterwards.
    pub fn toggle_select(&mut self, id: ExerciseId) -> Result<bool> {
        if !self.can_manage() {
            return Err(SessionError::NotPermitted);
        }
        if !self.store.contains(id) {
            return Err(StoreError::NotFound(id).into());
        }
        let selected = if self.selected_ids.remove(&id) {
            false
        } else {
            self.selected_ids.insert(id);
            true
        };
        Ok(selected)
    }

    /// Selects the whole catalog, or clears the selection when everything
    /// is already selected.
    pub fn toggle_select_all(&mut self) -> Result<()> {
        if !self.can_manage() {
            return Err(SessionError::NotPermitted);
        }
        if self.selected_ids.len() == self.store.len() {
            self.selected_ids.clear();
        } else {
            self.selected_ids = self.store.list().iter().map(|ex| ex.id).collect();
        }
        Ok(())
    }

    // ---- the consistency pass ----

    /*
     * Re-establishes every session invariant against the current catalog
     * and visibility context. Every mutating method above ends here, so the
     * rules run as explicit post-mutation hooks rather than as reactions
     * observed from the outside:
     *   - a current lesson outside the visible pool is cleared, along with
     *     its rep count;
     *   - the rep count exists iff the current lesson wants one (an edit
     *     that set the flag rolls a fresh value, an edit that cleared it
     *     drops the value);
     *   - an edit target that no longer exists resets the form to
     *     "create new";
     *   - the bulk selection only references live records;
     *   - the management surface closes when the actor loses the
     *     capability.
     */
    fn reconcile(&mut self) {
        if let Some(id) = self.current_lesson_id {
            let still_visible = self.visible_exercises().iter().any(|ex| ex.id == id);
            if !still_visible {
                log::debug!(
                    "SessionController: Lesson {id} left the visible pool; clearing display."
                );
                self.current_lesson_id = None;
                self.rep_count = None;
            }
        }

        let rolled = match self.current_lesson() {
            Some(lesson) if lesson.uses_rep_count => match self.rep_count {
                Some(value) => Some(value),
                None => selection::roll_rep_count(lesson, self.randomness.as_ref()),
            },
            _ => None,
        };
        self.rep_count = rolled;

        if let Some(target) = self.editing_target_id {
            if !self.store.contains(target) {
                log::debug!(
                    "SessionController: Edit target {target} was deleted; resetting the form."
                );
                self.editing_target_id = None;
                self.form_draft = ExerciseDraft::default();
            }
        }

        let store = &self.store;
        self.selected_ids.retain(|id| store.contains(*id));

        if self.manager_open && !self.can_manage() {
            log::debug!("SessionController: Actor lost management capability; closing manager.");
            self.manager_open = false;
        }
    }
}
