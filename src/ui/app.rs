use crate::catalog::{ModuleDescriptor, Registry, ScriptEvent};
use crate::menu::{MenuCustomizer, MenuSelection};
use crate::playback::cadence::{self, MAX_SPEED, MIN_SPEED};
use crate::playback::{
    Advance, CadenceDriver, CadenceHandle, CadenceRequest, CadenceTick, Playback, TickKind,
};
use crate::ui::theme::Theme;
use std::collections::HashSet;
use tracing::{debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusPane {
    Sidebar,
    Panel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SidebarItem {
    Category(String),
    Module(String),
}

/// The module currently shown in the content pane.
///
/// Owns the playback state and the cadence task driving it; dropping the
/// panel cancels the task.
#[derive(Debug)]
pub struct ActivePanel {
    pub module_id: String,
    pub playback: Playback<ScriptEvent>,
    cadence: Option<CadenceHandle>,
}

impl ActivePanel {
    fn new(module: &ModuleDescriptor) -> Self {
        Self {
            module_id: module.id.clone(),
            playback: Playback::new(module.content.script.clone(), module.content.mode),
            cadence: None,
        }
    }

    pub fn has_cadence(&self) -> bool {
        self.cadence.is_some()
    }
}

#[derive(Debug)]
pub struct App {
    pub registry: Registry,
    pub menu: MenuSelection,
    pub selected_index: usize,
    pub focus: FocusPane,
    pub search_mode: bool,
    pub search_query: String,
    pub show_info: bool,
    pub should_quit: bool,
    pub theme: Theme,
    pub customizer: Option<MenuCustomizer>,
    pub active: Option<ActivePanel>,
    /// Lines scrolled back from the newest event; 0 follows the tail.
    pub log_scroll: usize,
    pub status: Option<String>,
    driver: CadenceDriver,
}

impl App {
    pub fn new(registry: Registry, menu: Option<MenuSelection>, theme: Theme, speed: f64) -> Self {
        let menu = sanitize_menu(&registry, menu);
        Self {
            registry,
            menu,
            selected_index: 0,
            focus: FocusPane::Sidebar,
            search_mode: false,
            search_query: String::new(),
            show_info: false,
            should_quit: false,
            theme,
            customizer: None,
            active: None,
            log_scroll: 0,
            status: None,
            driver: CadenceDriver::new(speed),
        }
    }

    pub fn speed(&self) -> f64 {
        self.driver.speed()
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Sidebar if self.active.is_some() => FocusPane::Panel,
            _ => FocusPane::Sidebar,
        };
    }

    pub fn toggle_info(&mut self) {
        self.show_info = !self.show_info;
    }

    pub fn cycle_theme(&mut self) {
        self.theme = self.theme.next().clone();
        self.status = Some(format!("Theme: {}", self.theme.name));
    }

    // --- Sidebar ---------------------------------------------------------

    /// Visible modules in menu order, narrowed by the search query.
    pub fn visible_modules(&self) -> Vec<&ModuleDescriptor> {
        self.menu
            .modules
            .iter()
            .filter_map(|id| self.registry.get(id))
            .filter(|m| self.matches_search(m))
            .collect()
    }

    pub fn sidebar_items(&self) -> Vec<SidebarItem> {
        let modules = self.visible_modules();

        if !self.menu.group_by_category {
            return modules
                .iter()
                .map(|m| SidebarItem::Module(m.id.clone()))
                .collect();
        }

        let mut categories: Vec<&str> = Vec::new();
        for module in &modules {
            if !categories.contains(&module.category.as_str()) {
                categories.push(&module.category);
            }
        }

        let mut items = Vec::new();
        for category in categories {
            items.push(SidebarItem::Category(category.to_string()));
            items.extend(
                modules
                    .iter()
                    .filter(|m| m.category == category)
                    .map(|m| SidebarItem::Module(m.id.clone())),
            );
        }
        items
    }

    fn matches_search(&self, module: &ModuleDescriptor) -> bool {
        if !self.search_mode || self.search_query.is_empty() {
            return true;
        }

        let query = self.search_query.to_lowercase();
        module.title.to_lowercase().contains(&query)
            || module.id.to_lowercase().contains(&query)
            || module.description.to_lowercase().contains(&query)
            || module.category.to_lowercase().contains(&query)
    }

    pub fn selected_item(&self) -> Option<SidebarItem> {
        self.sidebar_items().get(self.selected_index).cloned()
    }

    pub fn selected_module(&self) -> Option<&ModuleDescriptor> {
        match self.selected_item() {
            Some(SidebarItem::Module(id)) => self.registry.get(&id),
            _ => None,
        }
    }

    pub fn next(&mut self) {
        let item_count = self.sidebar_items().len();

        if item_count > 0 {
            self.selected_index = (self.selected_index + 1) % item_count;
        }
    }

    pub fn previous(&mut self) {
        let item_count = self.sidebar_items().len();

        if item_count > 0 {
            if self.selected_index > 0 {
                self.selected_index -= 1;
            } else {
                self.selected_index = item_count - 1;
            }
        }
    }

    pub fn enter_search_mode(&mut self) {
        self.search_mode = true;
        self.search_query.clear();
        self.selected_index = 0;
    }

    pub fn exit_search_mode(&mut self) {
        self.search_mode = false;
        self.search_query.clear();
        self.selected_index = 0;
    }

    pub fn search_push_char(&mut self, c: char) {
        self.search_query.push(c);
        self.selected_index = 0;
    }

    pub fn search_pop_char(&mut self) {
        self.search_query.pop();
        self.selected_index = 0;
    }

    // --- Active panel ----------------------------------------------------

    pub fn active_module(&self) -> Option<&ModuleDescriptor> {
        self.active
            .as_ref()
            .and_then(|panel| self.registry.get(&panel.module_id))
    }

    /// Open whatever module is under the sidebar cursor.
    pub fn open_selected(&mut self) -> bool {
        match self.selected_item() {
            Some(SidebarItem::Module(id)) => self.open_module(&id),
            _ => false,
        }
    }

    /// Replace the active panel with a fresh one for `id`.
    ///
    /// The previous panel's cadence is cancelled when it is dropped here.
    pub fn open_module(&mut self, id: &str) -> bool {
        let Some(module) = self.registry.get(id) else {
            return false;
        };
        let panel = ActivePanel::new(module);
        info!(module = %id, steps = panel.playback.len(), "module opened");

        self.active = Some(panel);
        self.driver.drain();
        self.log_scroll = 0;
        self.focus = FocusPane::Panel;
        self.status = None;

        if let Some(index) = self
            .sidebar_items()
            .iter()
            .position(|item| matches!(item, SidebarItem::Module(m) if m == id))
        {
            self.selected_index = index;
        }
        true
    }

    /// Close the active panel and go back to the sidebar.
    pub fn close_panel(&mut self) {
        if let Some(panel) = self.active.take() {
            debug!(module = %panel.module_id, "module closed");
        }
        self.driver.drain();
        self.focus = FocusPane::Sidebar;
    }

    /// Start, pause or resume the active playback.
    pub fn toggle_playback(&mut self) {
        if let Some(panel) = self.active.as_mut() {
            let generation = panel.playback.generation();
            panel.playback.toggle();
            if panel.playback.generation() != generation {
                self.log_scroll = 0;
            }
        }
        self.sync_cadence();
    }

    pub fn reset_playback(&mut self) {
        if let Some(panel) = self.active.as_mut() {
            panel.playback.reset();
            self.log_scroll = 0;
        }
        self.sync_cadence();
    }

    /// Reveal one step by hand, pausing the cadence.
    pub fn step_playback(&mut self) {
        if let Some(panel) = self.active.as_mut() {
            panel.playback.pause();
            panel.playback.step();
        }
        self.sync_cadence();
    }

    pub fn speed_up(&mut self) {
        self.set_speed((self.speed() * 2.0).min(MAX_SPEED));
    }

    pub fn slow_down(&mut self) {
        self.set_speed((self.speed() / 2.0).max(MIN_SPEED));
    }

    pub fn set_speed(&mut self, speed: f64) {
        let speed = cadence::clamp_speed(speed);
        if (speed - self.driver.speed()).abs() < f64::EPSILON {
            return;
        }
        self.driver.set_speed(speed);
        self.status = Some(format!("Speed: {speed}x"));
        // Respawn so the running task picks up the new speed
        if let Some(panel) = self.active.as_mut() {
            panel.cadence = None;
        }
        self.sync_cadence();
    }

    /// Make the cadence task match the playback state: one task while
    /// running, none otherwise.
    fn sync_cadence(&mut self) {
        let Some(panel) = self.active.as_mut() else {
            return;
        };

        if !panel.playback.is_running() {
            if panel.cadence.take().is_some() {
                trace!(module = %panel.module_id, "cadence released");
            }
            return;
        }

        if panel.cadence.is_none() {
            let Some(module) = self.registry.get(&panel.module_id) else {
                return;
            };
            let request = CadenceRequest {
                panel: panel.module_id.clone(),
                generation: panel.playback.generation(),
                cadence: module.content.cadence,
                mode: panel.playback.mode(),
                commit_first: panel.playback.pending().is_some(),
            };
            panel.cadence = Some(self.driver.spawn(request));
        }
    }

    /// Apply every queued cadence tick. Returns how many changed state.
    pub fn process_ticks(&mut self) -> usize {
        let mut applied = 0;
        while let Some(tick) = self.driver.try_recv() {
            if self.apply_tick(&tick) {
                applied += 1;
            }
        }
        applied
    }

    /// Apply one tick to the active playback.
    ///
    /// Ticks from a stopped task, another panel or an earlier generation
    /// are dropped.
    pub fn apply_tick(&mut self, tick: &CadenceTick) -> bool {
        let Some(panel) = self.active.as_mut() else {
            return false;
        };
        let current = panel
            .cadence
            .as_ref()
            .is_some_and(|handle| handle.run() == tick.run);
        if !current
            || panel.module_id != tick.panel
            || panel.playback.generation() != tick.generation
        {
            trace!(run = tick.run, panel = %tick.panel, "stale tick dropped");
            return false;
        }

        let outcome = match tick.kind {
            TickKind::Advance => panel.playback.advance(),
            TickKind::Commit => panel.playback.commit(),
        };

        if outcome == Advance::Finished {
            panel.cadence = None;
        }
        !matches!(outcome, Advance::Idle | Advance::Blocked)
    }

    // --- Log scrolling ---------------------------------------------------

    /// Scroll towards older events. Stops once the first event is on top.
    pub fn scroll_log_up(&mut self) {
        let emitted = self
            .active
            .as_ref()
            .map_or(0, |panel| panel.playback.emitted().len());
        if self.log_scroll + 1 < emitted {
            self.log_scroll += 1;
        }
    }

    /// Scroll towards the newest event; reaching it resumes following.
    pub fn scroll_log_down(&mut self) {
        self.log_scroll = self.log_scroll.saturating_sub(1);
    }

    // --- Menu customizer -------------------------------------------------

    pub fn open_customizer(&mut self) {
        let customizer = MenuCustomizer::open(
            &self.registry.ids(),
            &self.menu.modules,
            self.menu.group_by_category,
        );
        self.customizer = Some(customizer);
    }

    pub fn cancel_customizer(&mut self) {
        if let Some(customizer) = self.customizer.take() {
            customizer.cancel();
        }
    }

    /// Commit the open customizer and apply it. Returns the new selection
    /// so the caller can persist it.
    pub fn save_customizer(&mut self) -> Option<MenuSelection> {
        let selection = self.customizer.take()?.save();
        self.apply_menu(selection.clone());
        self.status = Some(format!("Menu saved: {} modules", self.menu.modules.len()));
        Some(selection)
    }

    pub fn apply_menu(&mut self, selection: MenuSelection) {
        self.menu = sanitize_menu(&self.registry, Some(selection));
        self.selected_index = 0;
    }
}

/// Drop unknown and repeated ids from a saved menu; no menu means "everything".
fn sanitize_menu(registry: &Registry, menu: Option<MenuSelection>) -> MenuSelection {
    match menu {
        Some(mut menu) => {
            let mut seen = HashSet::new();
            menu.modules
                .retain(|id| registry.contains(id) && seen.insert(id.clone()));
            menu
        }
        None => MenuSelection::all(&registry.ids()),
    }
}
