use crate::error::{ChemvizError, Result};
use crate::upload::{UploadId, UploadRecord};

/// Ordered list of past uploads (most recent first) plus the selected one.
///
/// `selected` is always either a member of `items` (by id) or the most recent
/// successful upload that no history fetch has reconciled yet.
#[derive(Debug, Clone, Default)]
pub struct HistoryState {
    items: Vec<UploadRecord>,
    selected: Option<UploadRecord>,
    /// Upload selected ahead of the history refresh that will contain it.
    unreconciled_upload: Option<UploadId>,
}

impl HistoryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[UploadRecord] {
        &self.items
    }

    pub fn selected(&self) -> Option<&UploadRecord> {
        self.selected.as_ref()
    }

    pub fn selected_id(&self) -> Option<UploadId> {
        self.selected.as_ref().map(|record| record.id)
    }

    pub fn unreconciled_upload(&self) -> Option<UploadId> {
        self.unreconciled_upload
    }

    pub fn contains(&self, id: UploadId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    /// Replaces `items` wholesale with the server's current list.
    ///
    /// A selection the list still contains is refreshed to the listed record.
    /// An upload the server has not listed yet stays selected as is. A
    /// selection that has vanished otherwise falls back to the first item.
    /// With nothing selected, the first item is selected.
    pub fn on_history_fetched(&mut self, list: Vec<UploadRecord>) {
        self.items = list;

        if let Some(pending) = self.unreconciled_upload
            && self.contains(pending)
        {
            tracing::debug!(upload_id = %pending, "Upload reconciled with history");
            self.unreconciled_upload = None;
        }

        let Some(id) = self.selected_id() else {
            self.selected = self.items.first().cloned();
            return;
        };

        if let Some(listed) = self.items.iter().find(|item| item.id == id) {
            self.selected = Some(listed.clone());
        } else if self.unreconciled_upload != Some(id) {
            tracing::debug!(upload_id = %id, "Selected upload no longer listed");
            self.selected = self.items.first().cloned();
        }
    }

    /// Selects a freshly uploaded record immediately, ahead of the history
    /// refresh that reconciles `items`.
    pub fn on_upload_succeeded(&mut self, record: UploadRecord) {
        self.unreconciled_upload = (!self.contains(record.id)).then_some(record.id);
        self.selected = Some(record);
    }

    /// Selects the listed item with matching id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` and leaves the selection unchanged when no listed
    /// item has this id.
    pub fn select(&mut self, id: UploadId) -> Result<&UploadRecord> {
        let record = self
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| ChemvizError::not_found("upload", id.to_string()))?;

        // An explicit choice of a listed item supersedes a pending upload.
        self.unreconciled_upload = None;
        Ok(&*self.selected.insert(record))
    }

    /// Failed history fetch at mount: show an empty history.
    pub fn degrade_to_empty(&mut self) {
        self.items.clear();
        self.selected = None;
        self.unreconciled_upload = None;
    }

    pub fn clear(&mut self) {
        self.degrade_to_empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::{Summary, UploadId};
    use chrono::Utc;

    fn record(id: i64, total: u64) -> UploadRecord {
        UploadRecord {
            id: UploadId(id),
            name: format!("upload-{}.csv", id),
            uploaded_at: Utc::now(),
            rows: Vec::new(),
            summary: Summary {
                total_records: total,
                ..Summary::default()
            },
        }
    }

    fn assert_no_dangling(state: &HistoryState) {
        if let Some(id) = state.selected_id() {
            assert!(state.contains(id) || state.unreconciled_upload() == Some(id));
        }
    }

    #[test]
    fn first_fetch_selects_most_recent() {
        let mut state = HistoryState::new();
        state.on_history_fetched(vec![record(2, 5), record(1, 3)]);

        assert_eq!(state.selected_id(), Some(UploadId(2)));
        assert_eq!(state.items().len(), 2);
    }

    #[test]
    fn empty_fetch_selects_nothing() {
        let mut state = HistoryState::new();
        state.on_history_fetched(Vec::new());
        assert!(state.selected().is_none());
    }

    #[test]
    fn fetch_replaces_rather_than_merges() {
        let mut state = HistoryState::new();
        state.on_history_fetched(vec![record(1, 1), record(2, 2)]);
        state.on_history_fetched(vec![record(3, 3)]);

        let ids: Vec<UploadId> = state.items().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![UploadId(3)]);
        assert_no_dangling(&state);
    }

    #[test]
    fn fetch_keeps_listed_selection() {
        let mut state = HistoryState::new();
        state.on_history_fetched(vec![record(3, 3), record(2, 2)]);
        state.select(UploadId(2)).unwrap();

        state.on_history_fetched(vec![record(4, 4), record(3, 3), record(2, 2)]);
        assert_eq!(state.selected_id(), Some(UploadId(2)));
    }

    #[test]
    fn upload_selected_before_refresh() {
        let mut state = HistoryState::new();
        state.on_history_fetched(vec![record(1, 1)]);

        state.on_upload_succeeded(record(42, 10));
        assert_eq!(state.selected_id(), Some(UploadId(42)));
        assert_eq!(state.unreconciled_upload(), Some(UploadId(42)));
        assert_no_dangling(&state);

        // A stale list without the upload does not evict it.
        state.on_history_fetched(vec![record(1, 1)]);
        assert_eq!(state.selected_id(), Some(UploadId(42)));
        assert_no_dangling(&state);

        state.on_history_fetched(vec![record(42, 10), record(1, 1)]);
        assert_eq!(state.selected_id(), Some(UploadId(42)));
        assert_eq!(state.unreconciled_upload(), None);
        assert_eq!(state.selected().unwrap().summary.total_records, 10);
    }

    #[test]
    fn reconciled_upload_takes_listed_record() {
        let mut state = HistoryState::new();
        let mut uploaded = record(42, 50);
        uploaded.name = "local.csv".to_string();
        state.on_upload_succeeded(uploaded);

        let mut listed = record(42, 100);
        listed.name = "server.csv".to_string();
        state.on_history_fetched(vec![listed, record(1, 1)]);

        assert_eq!(state.selected(), Some(&state.items()[0]));
        assert_eq!(state.selected().unwrap().name, "server.csv");
        assert_eq!(state.selected().unwrap().summary.total_records, 100);
    }

    #[test]
    fn vanished_selection_falls_back_to_first() {
        let mut state = HistoryState::new();
        state.on_history_fetched(vec![record(2, 2), record(1, 1)]);
        state.select(UploadId(1)).unwrap();

        state.on_history_fetched(vec![record(3, 3), record(2, 2)]);
        assert_eq!(state.selected_id(), Some(UploadId(3)));
        assert_no_dangling(&state);
    }

    #[test]
    fn select_replaces_projection_source() {
        let mut state = HistoryState::new();
        state.on_history_fetched(vec![record(2, 20), record(1, 10)]);

        let selected = state.select(UploadId(1)).unwrap();
        assert_eq!(selected.summary.total_records, 10);
        assert_eq!(state.selected().unwrap().summary.total_records, 10);
    }

    #[test]
    fn select_unknown_id_is_not_found() {
        let mut state = HistoryState::new();
        state.on_history_fetched(vec![record(1, 1)]);

        let err = state.select(UploadId(9)).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(state.selected_id(), Some(UploadId(1)));
    }

    #[test]
    fn selecting_listed_item_drops_pending_upload() {
        let mut state = HistoryState::new();
        state.on_history_fetched(vec![record(1, 1)]);
        state.on_upload_succeeded(record(42, 10));

        state.select(UploadId(1)).unwrap();
        assert_eq!(state.unreconciled_upload(), None);

        state.on_history_fetched(vec![record(1, 1)]);
        assert_eq!(state.selected_id(), Some(UploadId(1)));
    }

    #[test]
    fn degrade_clears_everything() {
        let mut state = HistoryState::new();
        state.on_history_fetched(vec![record(1, 1)]);
        state.degrade_to_empty();

        assert!(state.items().is_empty());
        assert!(state.selected().is_none());
    }
}
