//! Navigation and selection state of a file picker, as explicit transitions.
//!
//! A picker shows one slot (view + path) at a time. Every fetch for a slot is
//! tagged with a generation; completions carrying any other generation are
//! dropped, so only the most recently started fetch can commit.

use serde::Serialize;

use crate::models::resource::{DirectoryListing, ResourceRecord};
use crate::models::view::PickerView;
use crate::scope_path;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Slot {
    pub view: PickerView,
    pub path: String,
}

impl Slot {
    /// Only the files view is path-addressed; recent and favorites always sit at `/`.
    pub fn new(view: PickerView, path: &str) -> Self {
        let path = match view {
            PickerView::Files => scope_path::normalize(path),
            PickerView::Recent | PickerView::Favorites => "/".to_string(),
        };
        Self { view, path }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Phase {
    Idle,
    Loading { generation: u64 },
    Loaded { generation: u64, listing: DirectoryListing },
    Failed { generation: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PickerEvent {
    Navigate(Slot),
    FetchStarted { generation: u64 },
    FetchCompleted { generation: u64, listing: DirectoryListing },
    FetchFailed { generation: u64 },
    FetchCancelled { generation: u64 },
    /// The thumbnail of record `id` from the listing of `generation` arrived.
    PreviewLoaded { generation: u64, id: String },
    ToggleSelect { id: String, multiselect: bool },
    SelectAll { ids: Vec<String> },
    ClearSelection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickerState {
    pub slot: Slot,
    pub phase: Phase,
    pub selected_ids: Vec<String>,
}

impl PickerState {
    pub fn new(slot: Slot) -> Self {
        Self {
            slot,
            phase: Phase::Idle,
            selected_ids: Vec::new(),
        }
    }

    pub fn apply(mut self, event: PickerEvent) -> Self {
        match event {
            PickerEvent::Navigate(slot) => {
                if slot != self.slot {
                    self.slot = slot;
                    self.phase = Phase::Idle;
                    self.selected_ids.clear();
                }
            }
            PickerEvent::FetchStarted { generation } => {
                self.phase = Phase::Loading { generation };
            }
            PickerEvent::FetchCompleted {
                generation,
                listing,
            } => {
                if self.is_loading(generation) {
                    self.phase = Phase::Loaded {
                        generation,
                        listing,
                    };
                }
            }
            PickerEvent::FetchFailed { generation } => {
                if self.is_loading(generation) {
                    self.phase = Phase::Failed { generation };
                }
            }
            PickerEvent::FetchCancelled { generation } => {
                if self.is_loading(generation) {
                    self.phase = Phase::Idle;
                }
            }
            PickerEvent::PreviewLoaded { generation, id } => {
                if let Phase::Loaded {
                    generation: current,
                    listing,
                } = &mut self.phase
                {
                    if *current == generation {
                        if let Some(record) = listing.contents.iter_mut().find(|r| r.id == id) {
                            record.mark_loaded();
                        }
                    }
                }
            }
            PickerEvent::ToggleSelect { id, multiselect } => {
                if !self.records().iter().any(|r| r.id == id) {
                    return self;
                }
                if let Some(pos) = self.selected_ids.iter().position(|s| *s == id) {
                    self.selected_ids.remove(pos);
                } else if multiselect {
                    self.selected_ids.push(id);
                } else {
                    self.selected_ids = vec![id];
                }
            }
            PickerEvent::SelectAll { ids } => {
                if self.selected_ids.len() < ids.len() {
                    self.selected_ids = ids;
                } else {
                    self.selected_ids.clear();
                }
            }
            PickerEvent::ClearSelection => self.selected_ids.clear(),
        }
        self
    }

    fn is_loading(&self, generation: u64) -> bool {
        matches!(self.phase, Phase::Loading { generation: g } if g == generation)
    }

    pub fn loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    pub fn records(&self) -> &[ResourceRecord] {
        match &self.phase {
            Phase::Loaded { listing, .. } => &listing.contents,
            _ => &[],
        }
    }

    pub fn folder(&self) -> Option<&ResourceRecord> {
        match &self.phase {
            Phase::Loaded { listing, .. } => listing.folder.as_ref(),
            _ => None,
        }
    }

    pub fn selected_records(&self) -> Vec<&ResourceRecord> {
        self.selected_ids
            .iter()
            .filter_map(|id| self.records().iter().find(|r| r.id == *id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resource::{test_record, ResourceType};

    fn listing(names: &[&str]) -> DirectoryListing {
        DirectoryListing {
            folder: None,
            contents: names
                .iter()
                .map(|n| test_record(n, n, ResourceType::File))
                .collect(),
        }
    }

    fn loaded(names: &[&str]) -> PickerState {
        PickerState::new(Slot::new(PickerView::Files, "/"))
            .apply(PickerEvent::FetchStarted { generation: 1 })
            .apply(PickerEvent::FetchCompleted {
                generation: 1,
                listing: listing(names),
            })
    }

    #[test]
    fn non_files_views_pin_path_to_root() {
        assert_eq!(Slot::new(PickerView::Recent, "/deep/dir").path, "/");
        assert_eq!(Slot::new(PickerView::Files, "/deep/dir/").path, "/deep/dir");
    }

    #[test]
    fn idle_loading_loaded() {
        let state = PickerState::new(Slot::new(PickerView::Files, "/a"));
        assert_eq!(state.phase, Phase::Idle);
        let state = state.apply(PickerEvent::FetchStarted { generation: 3 });
        assert!(state.loading());
        let state = state.apply(PickerEvent::FetchCompleted {
            generation: 3,
            listing: listing(&["x"]),
        });
        assert_eq!(state.records().len(), 1);
    }

    #[test]
    fn preview_loaded_flags_only_current_listing() {
        let state = loaded(&["a", "b"]).apply(PickerEvent::PreviewLoaded {
            generation: 1,
            id: "b".to_string(),
        });
        assert!(!state.records()[0].loaded);
        assert!(state.records()[1].loaded);

        let state = state.apply(PickerEvent::PreviewLoaded {
            generation: 0,
            id: "a".to_string(),
        });
        assert!(!state.records()[0].loaded);
    }

    #[test]
    fn stale_completion_after_navigation_is_ignored() {
        let a = Slot::new(PickerView::Files, "/a");
        let b = Slot::new(PickerView::Files, "/b");
        let state = PickerState::new(a)
            .apply(PickerEvent::FetchStarted { generation: 1 })
            .apply(PickerEvent::Navigate(b.clone()))
            .apply(PickerEvent::FetchStarted { generation: 2 })
            .apply(PickerEvent::FetchCompleted {
                generation: 2,
                listing: listing(&["from-b"]),
            })
            .apply(PickerEvent::FetchCompleted {
                generation: 1,
                listing: listing(&["from-a"]),
            });

        assert_eq!(state.slot, b);
        assert_eq!(state.records()[0].id, "from-b");
    }

    #[test]
    fn stale_failure_does_not_clobber_newer_load() {
        let state = PickerState::new(Slot::new(PickerView::Files, "/"))
            .apply(PickerEvent::FetchStarted { generation: 1 })
            .apply(PickerEvent::FetchStarted { generation: 2 })
            .apply(PickerEvent::FetchFailed { generation: 1 });
        assert_eq!(state.phase, Phase::Loading { generation: 2 });

        let state = state.apply(PickerEvent::FetchFailed { generation: 2 });
        assert_eq!(state.phase, Phase::Failed { generation: 2 });
    }

    #[test]
    fn navigation_clears_selection_but_same_slot_keeps_it() {
        let state = loaded(&["a", "b"]).apply(PickerEvent::ToggleSelect {
            id: "a".to_string(),
            multiselect: true,
        });
        let same = state
            .clone()
            .apply(PickerEvent::Navigate(Slot::new(PickerView::Files, "/")));
        assert_eq!(same.selected_ids, vec!["a"]);

        let moved = state.apply(PickerEvent::Navigate(Slot::new(PickerView::Favorites, "/")));
        assert!(moved.selected_ids.is_empty());
        assert_eq!(moved.phase, Phase::Idle);
    }

    #[test]
    fn toggle_select_single_and_multi() {
        let state = loaded(&["a", "b", "c"])
            .apply(PickerEvent::ToggleSelect {
                id: "a".to_string(),
                multiselect: false,
            })
            .apply(PickerEvent::ToggleSelect {
                id: "b".to_string(),
                multiselect: false,
            });
        assert_eq!(state.selected_ids, vec!["b"]);

        let state = state
            .apply(PickerEvent::ToggleSelect {
                id: "c".to_string(),
                multiselect: true,
            })
            .apply(PickerEvent::ToggleSelect {
                id: "b".to_string(),
                multiselect: true,
            });
        assert_eq!(state.selected_ids, vec!["c"]);
        assert_eq!(state.selected_records()[0].id, "c");
    }

    #[test]
    fn toggle_select_ignores_unknown_ids() {
        let state = loaded(&["a"]).apply(PickerEvent::ToggleSelect {
            id: "zzz".to_string(),
            multiselect: true,
        });
        assert!(state.selected_ids.is_empty());
    }

    #[test]
    fn select_all_toggles() {
        let ids = vec!["a".to_string(), "b".to_string()];
        let state = loaded(&["a", "b"]).apply(PickerEvent::SelectAll { ids: ids.clone() });
        assert_eq!(state.selected_ids, ids);
        let state = state.apply(PickerEvent::SelectAll { ids });
        assert!(state.selected_ids.is_empty());
    }
}
