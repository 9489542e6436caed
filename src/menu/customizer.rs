use super::reorder::move_item_in_place;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// The committed result of a customization session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuSelection {
    /// Visible module ids in display order
    pub modules: Vec<String>,
    #[serde(default)]
    pub group_by_category: bool,
}

impl MenuSelection {
    /// Every id in registry order, flat.
    pub fn all(ids: &[String]) -> Self {
        Self {
            modules: ids.to_vec(),
            group_by_category: false,
        }
    }
}

/// Working state of the menu editor.
///
/// Order and selection are tracked separately: reordering never changes
/// which ids are selected, and toggling never moves an id.
#[derive(Debug, Clone)]
pub struct MenuCustomizer {
    order: Vec<String>,
    selected: HashSet<String>,
    default_order: Vec<String>,
    group_by_category: bool,
    cursor: usize,
    grabbed: bool,
}

impl MenuCustomizer {
    /// Open the editor.
    ///
    /// The working order is the previous selection (duplicates and ids no
    /// longer in `all_ids` dropped) followed by every other id in
    /// `all_ids` order. Only the surviving previous ids start selected.
    pub fn open(all_ids: &[String], previous: &[String], group_by_category: bool) -> Self {
        let known: HashSet<&str> = all_ids.iter().map(String::as_str).collect();

        let mut order: Vec<String> = Vec::with_capacity(all_ids.len());
        let mut seen: HashSet<&str> = HashSet::new();
        for id in previous {
            if known.contains(id.as_str()) && seen.insert(id.as_str()) {
                order.push(id.clone());
            }
        }
        let selected: HashSet<String> = order.iter().cloned().collect();

        for id in all_ids {
            if seen.insert(id.as_str()) {
                order.push(id.clone());
            }
        }

        debug!(
            modules = order.len(),
            selected = selected.len(),
            dropped = previous.len().saturating_sub(selected.len()),
            "menu customizer opened"
        );

        Self {
            order,
            selected,
            default_order: all_ids.to_vec(),
            group_by_category,
            cursor: 0,
            grabbed: false,
        }
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn group_by_category(&self) -> bool {
        self.group_by_category
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    pub fn current_id(&self) -> Option<&str> {
        self.order.get(self.cursor).map(String::as_str)
    }

    /// Flip membership of `id`. Unknown ids are ignored.
    pub fn toggle(&mut self, id: &str) {
        if !self.order.iter().any(|o| o == id) {
            return;
        }
        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
        }
    }

    pub fn toggle_current(&mut self) {
        if let Some(id) = self.current_id().map(str::to_string) {
            self.toggle(&id);
        }
    }

    /// Move the item at `from` to `to`. Returns `false` if out of range.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        move_item_in_place(&mut self.order, from, to)
    }

    pub fn select_all(&mut self) {
        self.selected = self.order.iter().cloned().collect();
    }

    pub fn select_none(&mut self) {
        self.selected.clear();
    }

    /// Restore the registry order with everything selected.
    pub fn reset_to_default(&mut self) {
        self.order = self.default_order.clone();
        self.select_all();
        self.cursor = 0;
        self.grabbed = false;
    }

    pub fn toggle_grouping(&mut self) {
        self.group_by_category = !self.group_by_category;
    }

    pub fn next(&mut self) {
        if self.grabbed {
            self.move_down();
        } else if !self.order.is_empty() {
            self.cursor = (self.cursor + 1) % self.order.len();
        }
    }

    pub fn previous(&mut self) {
        if self.grabbed {
            self.move_up();
        } else if !self.order.is_empty() {
            self.cursor = if self.cursor == 0 {
                self.order.len() - 1
            } else {
                self.cursor - 1
            };
        }
    }

    /// Pick up or put down the item under the cursor (keyboard drag).
    pub fn toggle_grab(&mut self) {
        if self.order.is_empty() {
            return;
        }
        self.grabbed = !self.grabbed;
    }

    /// Move the grabbed item one slot up, carrying the cursor with it.
    pub fn move_up(&mut self) {
        if self.cursor > 0 && self.move_item(self.cursor, self.cursor - 1) {
            self.cursor -= 1;
        }
    }

    /// Move the grabbed item one slot down, carrying the cursor with it.
    pub fn move_down(&mut self) {
        if self.move_item(self.cursor, self.cursor + 1) {
            self.cursor += 1;
        }
    }

    /// Commit: the ids that are both ordered and selected, in order.
    pub fn save(self) -> MenuSelection {
        let modules: Vec<String> = self
            .order
            .into_iter()
            .filter(|id| self.selected.contains(id))
            .collect();
        info!(
            modules = modules.len(),
            group_by_category = self.group_by_category,
            "menu saved"
        );
        MenuSelection {
            modules,
            group_by_category: self.group_by_category,
        }
    }

    /// Discard the session. The previously saved menu stays in effect.
    pub fn cancel(self) {
        debug!(modules = self.order.len(), "menu customization cancelled");
    }
}
