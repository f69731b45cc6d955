/*
 * The completion log: an append-only record of finished sessions with
 * date-bucketed views. The log loads its persisted snapshot once at
 * construction and hands the full snapshot back to the injected store
 * after every append and clear. Persistence failures are logged and
 * swallowed; the in-memory log is authoritative for the running session.
 *
 * Ordering: storage keeps append order, but every read-side view sorts by
 * timestamp (newest first) because persisted data may arrive out of order.
 */
use super::models::HistoryEntry;
use super::persistence::HistoryStoreOperations;
use std::collections::BTreeMap;
use std::sync::Arc;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Which slice of the log a flat view shows. `Day(None)` means "the
/// reference date", i.e. today from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFilter {
    Day(Option<Date>),
    Week,
    All,
}

impl Default for HistoryFilter {
    fn default() -> Self {
        HistoryFilter::Day(None)
    }
}

/// 12-hour wall-clock label for a completion moment, e.g. "10:00 AM".
/// Captured once at completion time and stored verbatim on the entry.
pub fn time_label(moment: OffsetDateTime) -> String {
    let description = format_description!("[hour repr:12 padding:zero]:[minute] [period]");
    match moment.format(&description) {
        Ok(label) => label,
        Err(e) => {
            log::warn!("History: Could not format time label ({e}); storing empty label.");
            String::new()
        }
    }
}

pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
    next_id: u64,
    store: Arc<dyn HistoryStoreOperations>,
}

impl HistoryLog {
    /*
     * Builds the log from whatever the store can produce. Consulted
     * exactly once; unreadable history degrades to an empty log instead
     * of failing construction. The id counter is seeded past the largest
     * loaded id so fresh entries keep the monotonic ordering.
     */
    pub fn load(store: Arc<dyn HistoryStoreOperations>) -> Self {
        let entries = match store.load() {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("HistoryLog: Could not read persisted history ({e}); starting empty.");
                Vec::new()
            }
        };
        let next_id = entries.iter().map(|entry| entry.id).max().map_or(1, |m| m + 1);
        log::debug!(
            "HistoryLog: Initialized with {} entries, next id {next_id}.",
            entries.len()
        );
        HistoryLog {
            entries,
            next_id,
            store,
        }
    }

    /// Appends an immutable completion record and persists the new
    /// snapshot. The title is a snapshot, never a live reference; later
    /// catalog edits and deletions leave history untouched.
    pub fn append(&mut self, title: &str, completed_at: OffsetDateTime) -> &HistoryEntry {
        let entry = HistoryEntry {
            id: self.next_id,
            title: title.to_string(),
            completed_at,
            time_label: time_label(completed_at),
        };
        self.next_id += 1;
        log::debug!(
            "HistoryLog: Recorded completion of '{}' at {completed_at} (entry {}).",
            entry.title,
            entry.id
        );
        self.entries.push(entry);
        self.persist();
        &self.entries[self.entries.len() - 1]
    }

    /// Empties the log and the backing persisted copy.
    pub fn clear(&mut self) {
        log::debug!("HistoryLog: Clearing {} entries.", self.entries.len());
        self.entries.clear();
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.entries) {
            log::warn!("HistoryLog: Could not persist history ({e}); keeping in-memory log.");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in append order, as persisted.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// All entries, newest first. Id breaks timestamp ties so the order is
    /// total even for same-second completions.
    pub fn entries_desc(&self) -> Vec<&HistoryEntry> {
        let mut view: Vec<&HistoryEntry> = self.entries.iter().collect();
        view.sort_by(|a, b| {
            b.completed_at
                .cmp(&a.completed_at)
                .then(b.id.cmp(&a.id))
        });
        view
    }

    /*
     * Flat filtered view, newest first.
     * Day: entries whose calendar day equals the requested date (or the
     * reference date when unspecified). Week: a trailing window of whole
     * days, reference day and the six before it. All: everything.
     */
    pub fn filter_by_mode(&self, mode: HistoryFilter, reference: Date) -> Vec<&HistoryEntry> {
        let mut view: Vec<&HistoryEntry> = self
            .entries
            .iter()
            .filter(|entry| match mode {
                HistoryFilter::All => true,
                HistoryFilter::Day(day) => entry.day() == day.unwrap_or(reference),
                HistoryFilter::Week => {
                    let age_days = (reference - entry.day()).whole_days();
                    (0..=6).contains(&age_days)
                }
            })
            .collect();
        view.sort_by(|a, b| {
            b.completed_at
                .cmp(&a.completed_at)
                .then(b.id.cmp(&a.id))
        });
        view
    }

    /*
     * Day-bucketed summary: one bucket per calendar day with at least one
     * entry, most recent day first. Within a bucket entries keep append
     * order; any truncation for display is the renderer's business, the
     * grouping always retains everything.
     */
    pub fn grouped_by_day(&self) -> Vec<(Date, Vec<&HistoryEntry>)> {
        let mut buckets: BTreeMap<Date, Vec<&HistoryEntry>> = BTreeMap::new();
        for entry in &self.entries {
            buckets.entry(entry.day()).or_default().push(entry);
        }
        buckets.into_iter().rev().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::persistence::{PersistenceError, Result as PersistenceResult};
    use std::io;
    use std::sync::Mutex;
    use time::macros::{date, datetime};

    /* In-memory store capturing every snapshot handed to save(). */
    struct MockHistoryStore {
        load_result: Mutex<Option<PersistenceResult<Vec<HistoryEntry>>>>,
        saved_snapshots: Mutex<Vec<Vec<HistoryEntry>>>,
    }

    impl MockHistoryStore {
        fn new() -> Self {
            MockHistoryStore {
                load_result: Mutex::new(None),
                saved_snapshots: Mutex::new(Vec::new()),
            }
        }

        fn with_entries(entries: Vec<HistoryEntry>) -> Self {
            let store = Self::new();
            *store.load_result.lock().unwrap() = Some(Ok(entries));
            store
        }

        fn failing_load() -> Self {
            let store = Self::new();
            *store.load_result.lock().unwrap() = Some(Err(PersistenceError::Io(
                io::Error::new(io::ErrorKind::PermissionDenied, "mock load failure"),
            )));
            store
        }

        fn saved_snapshots(&self) -> Vec<Vec<HistoryEntry>> {
            self.saved_snapshots.lock().unwrap().clone()
        }
    }

    impl HistoryStoreOperations for MockHistoryStore {
        fn load(&self) -> PersistenceResult<Vec<HistoryEntry>> {
            match self.load_result.lock().unwrap().take() {
                Some(result) => result,
                None => Ok(Vec::new()),
            }
        }

        fn save(&self, entries: &[HistoryEntry]) -> PersistenceResult<()> {
            self.saved_snapshots.lock().unwrap().push(entries.to_vec());
            Ok(())
        }
    }

    fn entry(id: u64, title: &str, completed_at: OffsetDateTime) -> HistoryEntry {
        HistoryEntry {
            id,
            title: title.to_string(),
            completed_at,
            time_label: time_label(completed_at),
        }
    }

    #[test]
    fn test_time_label_is_twelve_hour_clock() {
        assert_eq!(time_label(datetime!(2024-01-01 10:00:00 UTC)), "10:00 AM");
        assert_eq!(time_label(datetime!(2024-01-01 17:05:00 UTC)), "05:05 PM");
        assert_eq!(time_label(datetime!(2024-01-01 00:30:00 UTC)), "12:30 AM");
    }

    #[test]
    fn test_append_assigns_monotonic_ids_and_persists() {
        let store = Arc::new(MockHistoryStore::new());
        let mut log = HistoryLog::load(Arc::clone(&store) as Arc<dyn HistoryStoreOperations>);

        let first_id = log.append("Sit", datetime!(2024-01-01 10:00:00 UTC)).id;
        let second_id = log.append("Recall", datetime!(2024-01-01 11:00:00 UTC)).id;

        assert!(second_id > first_id);
        let snapshots = store.saved_snapshots();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1].len(), 2);
    }

    #[test]
    fn test_id_counter_seeds_past_loaded_entries() {
        let store = Arc::new(MockHistoryStore::with_entries(vec![entry(
            17,
            "Sit",
            datetime!(2024-01-01 10:00:00 UTC),
        )]));
        let mut log = HistoryLog::load(store as Arc<dyn HistoryStoreOperations>);
        let appended = log.append("Recall", datetime!(2024-01-02 09:00:00 UTC)).id;
        assert_eq!(appended, 18);
    }

    #[test]
    fn test_failed_load_degrades_to_empty_log() {
        let store = Arc::new(MockHistoryStore::failing_load());
        let log = HistoryLog::load(store as Arc<dyn HistoryStoreOperations>);
        assert!(log.is_empty());
    }

    #[test]
    fn test_clear_persists_the_empty_snapshot() {
        let store = Arc::new(MockHistoryStore::new());
        let mut log = HistoryLog::load(Arc::clone(&store) as Arc<dyn HistoryStoreOperations>);
        log.append("Sit", datetime!(2024-01-01 10:00:00 UTC));
        log.clear();

        assert!(log.is_empty());
        let snapshots = store.saved_snapshots();
        assert!(snapshots.last().unwrap().is_empty());
    }

    #[test]
    fn test_entries_desc_sorts_by_timestamp_not_insertion() {
        let store = Arc::new(MockHistoryStore::with_entries(vec![
            entry(1, "Older", datetime!(2024-01-01 08:00:00 UTC)),
            entry(3, "Newest", datetime!(2024-01-03 08:00:00 UTC)),
            entry(2, "Middle", datetime!(2024-01-02 08:00:00 UTC)),
        ]));
        let log = HistoryLog::load(store as Arc<dyn HistoryStoreOperations>);

        let titles: Vec<&str> = log.entries_desc().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Newest", "Middle", "Older"]);
    }

    #[test]
    fn test_day_filter_defaults_to_reference_date() {
        let store = Arc::new(MockHistoryStore::new());
        let mut log = HistoryLog::load(store as Arc<dyn HistoryStoreOperations>);
        log.append("Today", datetime!(2024-03-10 09:00:00 UTC));
        log.append("Yesterday", datetime!(2024-03-09 09:00:00 UTC));

        let view = log.filter_by_mode(HistoryFilter::Day(None), date!(2024-03-10));
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].title, "Today");

        let explicit = log.filter_by_mode(
            HistoryFilter::Day(Some(date!(2024-03-09))),
            date!(2024-03-10),
        );
        assert_eq!(explicit.len(), 1);
        assert_eq!(explicit[0].title, "Yesterday");
    }

    #[test]
    fn test_week_filter_is_trailing_seven_day_window() {
        let store = Arc::new(MockHistoryStore::new());
        let mut log = HistoryLog::load(store as Arc<dyn HistoryStoreOperations>);
        log.append("Today", datetime!(2024-03-10 09:00:00 UTC));
        log.append("Six days ago", datetime!(2024-03-04 23:59:00 UTC));
        log.append("Seven days ago", datetime!(2024-03-03 00:00:00 UTC));

        let view = log.filter_by_mode(HistoryFilter::Week, date!(2024-03-10));
        let titles: Vec<&str> = view.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Today", "Six days ago"]);
    }

    #[test]
    fn test_week_filter_excludes_future_entries() {
        let store = Arc::new(MockHistoryStore::new());
        let mut log = HistoryLog::load(store as Arc<dyn HistoryStoreOperations>);
        log.append("Tomorrow", datetime!(2024-03-11 09:00:00 UTC));
        let view = log.filter_by_mode(HistoryFilter::Week, date!(2024-03-10));
        assert!(view.is_empty());
    }

    #[test]
    fn test_grouped_by_day_orders_days_descending_with_full_buckets() {
        let store = Arc::new(MockHistoryStore::new());
        let mut log = HistoryLog::load(store as Arc<dyn HistoryStoreOperations>);
        // Three distinct days with 2, 1 and 3 entries respectively.
        log.append("A1", datetime!(2024-03-01 09:00:00 UTC));
        log.append("A2", datetime!(2024-03-01 10:00:00 UTC));
        log.append("B1", datetime!(2024-03-02 09:00:00 UTC));
        log.append("C1", datetime!(2024-03-03 09:00:00 UTC));
        log.append("C2", datetime!(2024-03-03 10:00:00 UTC));
        log.append("C3", datetime!(2024-03-03 11:00:00 UTC));

        let grouped = log.grouped_by_day();
        let days: Vec<Date> = grouped.iter().map(|(day, _)| *day).collect();
        assert_eq!(
            days,
            vec![date!(2024-03-03), date!(2024-03-02), date!(2024-03-01)]
        );
        let sizes: Vec<usize> = grouped.iter().map(|(_, bucket)| bucket.len()).collect();
        assert_eq!(sizes, vec![3, 1, 2]);

        // Every entry lands in exactly one bucket.
        let total: usize = sizes.iter().sum();
        assert_eq!(total, log.len());

        // Buckets preserve append order.
        let c_titles: Vec<&str> = grouped[0].1.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(c_titles, vec!["C1", "C2", "C3"]);
    }
}
