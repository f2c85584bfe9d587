//! Headless result browser: per-category item lists over a shared result
//! store, kept in sync with store changes and reported to the host through
//! [`ViewEvent`]s.
//!
//! The view is owned by one thread. Store notifications may arrive on any
//! thread; they are coalesced into a single queued message and only acted
//! upon when the owner calls [`ResultView::process_pending`].

use std::fmt;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use tracing::{debug, warn};

use crate::category::Category;
use crate::consts::MAX_NUMERIC_PRECISION;
use crate::control::{DataControl, Row};
use crate::dispatch::{RefreshRelay, ViewMessage, Wakeup};
use crate::error::{ResViewError, Result};
use crate::formatting::FormattingOptions;
use crate::idlist::IdList;
use crate::item::ItemKinds;
use crate::store::{ListenerId, QueryOptions, ResultStore};
use crate::view_state::{StateSource, ViewState};

/// The user's current selection within the active category.
#[derive(Clone)]
pub struct Selection {
    pub ids: IdList,
    pub store: Arc<ResultStore>,
    pub category: Category,
    /// Kinds of the selected items, resolved from the store.
    pub kinds: ItemKinds,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("ids", &self.ids)
            .field("category", &self.category)
            .field("kinds", &self.kinds)
            .finish_non_exhaustive()
    }
}

/// Tab label of one category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelTitle {
    pub category: Category,
    pub count: usize,
}

impl fmt::Display for PanelTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.category, self.count)
    }
}

/// Visibility and checked state of the category-dependent toolbar items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolbarState {
    pub flat_tree_visible: bool,
    pub tree_levels_visible: bool,
    pub choose_columns_visible: bool,
    pub show_fields_as_scalars_checked: bool,
    pub number_formatting_checked: bool,
    pub can_increase_precision: bool,
    pub can_decrease_precision: bool,
}

/// Notifications from the view to its host.
#[derive(Clone, Debug)]
pub enum ViewEvent {
    PanelTitlesChanged(Vec<PanelTitle>),
    SelectionChanged(Selection),
    StatusMessage(String),
    ToolbarChanged(ToolbarState),
    /// A refresh was deferred because the view is not the active page.
    ContentInvalidated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

type Callback = Box<dyn FnMut(&ViewEvent) + Send>;

/// Owned callback registry.
#[derive(Default)]
pub struct ViewListeners {
    callbacks: Vec<(ListenerHandle, Callback)>,
    next: u64,
}

impl ViewListeners {
    pub fn add(&mut self, callback: impl FnMut(&ViewEvent) + Send + 'static) -> ListenerHandle {
        self.next += 1;
        let handle = ListenerHandle(self.next);
        self.callbacks.push((handle, Box::new(callback)));
        handle
    }

    pub fn remove(&mut self, handle: ListenerHandle) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(h, _)| *h != handle);
        self.callbacks.len() != before
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    fn emit(&mut self, event: &ViewEvent) {
        for (_, callback) in &mut self.callbacks {
            callback(event);
        }
    }
}

pub struct ResultView {
    store: Arc<ResultStore>,
    controls: [DataControl; 5],
    active: Category,
    page_active: bool,
    content_valid: bool,
    formatting: FormattingOptions,
    fields_as_scalars_all: bool,
    fields_as_scalars_scalars: bool,
    listeners: ViewListeners,
    relay: Arc<RefreshRelay>,
    messages: mpsc::Receiver<ViewMessage>,
    subscription: Option<ListenerId>,
    disposed: bool,
    refresh_count: u64,
}

impl ResultView {
    /// Create a view bound to `store`. The view starts inactive with
    /// invalid content; call [`ResultView::set_page_active`] to show it.
    pub fn new(store: Arc<ResultStore>) -> Self {
        let (relay, messages) = RefreshRelay::new();
        let subscription = Some(store.subscribe(relay.clone()));
        let formatting = FormattingOptions::default();
        let controls = Category::ALL.map(|c| {
            let mut control = DataControl::for_category(c);
            control.set_formatting_options(formatting);
            control
        });
        Self {
            store,
            controls,
            active: Category::default(),
            page_active: false,
            content_valid: false,
            formatting,
            fields_as_scalars_all: false,
            fields_as_scalars_scalars: false,
            listeners: ViewListeners::default(),
            relay,
            messages,
            subscription,
            disposed: false,
            refresh_count: 0,
        }
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    pub fn is_content_valid(&self) -> bool {
        self.content_valid
    }

    pub fn is_page_active(&self) -> bool {
        self.page_active
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn active_category(&self) -> Category {
        self.active
    }

    pub fn formatting_options(&self) -> FormattingOptions {
        self.formatting
    }

    pub fn show_fields_as_scalars(&self) -> bool {
        self.fields_as_scalars_all
    }

    /// Number of refreshes that actually queried the store.
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    /// Whether a store notification is queued but not processed yet.
    pub fn has_pending_refresh(&self) -> bool {
        self.relay.is_pending()
    }

    /// Notifications dropped because a refresh was already pending.
    pub fn coalesced_notifications(&self) -> usize {
        self.relay.coalesced()
    }

    pub fn control(&self, category: Category) -> &DataControl {
        &self.controls[category.index()]
    }

    /// Direct access for control-specific settings (columns, tree levels).
    pub fn control_mut(&mut self, category: Category) -> &mut DataControl {
        &mut self.controls[category.index()]
    }

    pub fn ids(&self, category: Category) -> &IdList {
        self.control(category).id_list()
    }

    pub fn add_listener(
        &mut self,
        callback: impl FnMut(&ViewEvent) + Send + 'static,
    ) -> ListenerHandle {
        self.listeners.add(callback)
    }

    pub fn remove_listener(&mut self, handle: ListenerHandle) -> bool {
        self.listeners.remove(handle)
    }

    /// Hook called from the notifying thread whenever a refresh gets queued.
    pub fn set_wakeup(&mut self, wakeup: Option<Wakeup>) {
        self.relay.set_wakeup(wakeup);
    }

    /// Page activation from the host. Activating re-validates stale
    /// content and re-reports the selection.
    pub fn set_page_active(&mut self, active: bool) {
        self.page_active = active;
        if !active || self.disposed {
            return;
        }
        if !self.content_valid {
            if let Err(e) = self.refresh() {
                warn!(error = %e, "refresh on page activation failed");
            }
        }
        self.report_selection();
    }

    /// Re-query every category from the store. Deferred (content marked
    /// invalid) while the page is not active.
    pub fn refresh(&mut self) -> Result<()> {
        if self.disposed {
            return Err(ResViewError::Disposed);
        }
        if !self.page_active {
            self.invalidate();
            return Ok(());
        }

        let options = Category::ALL.map(|c| self.query_options(c));
        let lists = self.store.run_with_read_lock(|snapshot| {
            Category::ALL.map(|c| snapshot.query(c, &options[c.index()]))
        });
        let lists = match lists {
            Ok(lists) => lists,
            Err(e) => {
                self.content_valid = false;
                return Err(e);
            }
        };

        for (control, ids) in self.controls.iter_mut().zip(lists) {
            control.set_id_list(ids);
        }
        self.content_valid = true;
        self.refresh_count += 1;
        debug!(
            generation = self.store.generation(),
            items = self.ids(Category::All).len(),
            "result view refreshed"
        );

        let titles = self.panel_titles();
        self.emit(ViewEvent::PanelTitlesChanged(titles));
        self.emit_status();
        Ok(())
    }

    /// Drain queued store notifications. Must be called on the owning thread.
    /// Returns the number of refreshes that ran.
    pub fn process_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(message) = self.messages.try_recv() {
            ran += self.handle_message(message);
        }
        ran
    }

    /// Wait up to `timeout` for a store notification, then drain the queue.
    pub fn wait_and_process(&mut self, timeout: Duration) -> usize {
        match self.messages.recv_timeout(timeout) {
            Ok(message) => self.handle_message(message) + self.process_pending(),
            Err(_) => 0,
        }
    }

    fn handle_message(&mut self, message: ViewMessage) -> usize {
        match message {
            ViewMessage::RefreshScheduled { generation } => {
                self.relay.take_pending();
                if self.disposed {
                    return 0;
                }
                debug!(generation, "running scheduled refresh");
                match self.refresh() {
                    Ok(()) => 1,
                    Err(e) => {
                        warn!(error = %e, "scheduled refresh aborted");
                        0
                    }
                }
            }
        }
    }

    pub fn set_active_category(&mut self, category: Category) {
        self.active = category;
        if !self.content_valid && self.page_active {
            if let Err(e) = self.refresh() {
                warn!(error = %e, "refresh on category switch failed");
            }
        }
        let toolbar = self.toolbar_state();
        self.emit(ViewEvent::ToolbarChanged(toolbar));
        self.report_selection();
        self.emit_status();
    }

    /// Select rows of the active category by index and report the new
    /// selection. An invalid request is logged and leaves the selection as is.
    /// Rows count displayed items only: tree leaves are numbered in display
    /// order, group rows are skipped.
    pub fn select_rows(&mut self, rows: &[usize]) {
        let active = self.active;
        let control = &mut self.controls[active.index()];
        let selected = self
            .store
            .run_with_read_lock(|snapshot| control.select_rows(snapshot, rows))
            .and_then(|r| r);
        if let Err(e) = selected {
            warn!(category = %active, error = %e, "selection request ignored");
            return;
        }
        self.emit_status();
        self.report_selection();
    }

    pub fn clear_selection(&mut self) {
        let active = self.active;
        self.control_mut(active).clear_selection();
        self.emit_status();
        self.report_selection();
    }

    /// Build the active category's selection and send it to the listeners.
    pub fn report_selection(&mut self) -> Selection {
        let control = self.control(self.active);
        let ids = control.selected_ids();
        let kinds = match self.store.run_with_read_lock(|s| s.item_kinds(&ids)) {
            Ok(kinds) => kinds,
            Err(e) => {
                warn!(error = %e, "could not resolve selection kinds");
                ItemKinds::empty()
            }
        };
        let selection = Selection {
            ids,
            store: Arc::clone(&self.store),
            category: self.active,
            kinds,
        };
        self.emit(ViewEvent::SelectionChanged(selection.clone()));
        selection
    }

    /// Apply `options` to every category.
    pub fn set_formatting_options(&mut self, options: FormattingOptions) {
        if options.numeric_precision > MAX_NUMERIC_PRECISION {
            warn!(
                requested = options.numeric_precision,
                max = MAX_NUMERIC_PRECISION,
                "numeric precision clamped"
            );
        }
        let options = options.with_precision(options.numeric_precision);
        self.formatting = options;
        for control in &mut self.controls {
            control.set_formatting_options(options);
        }
        let toolbar = self.toolbar_state();
        self.emit(ViewEvent::ToolbarChanged(toolbar));
    }

    pub fn set_number_formatting_enabled(&mut self, enabled: bool) {
        self.set_formatting_options(self.formatting.with_number_formatting(enabled));
    }

    pub fn set_numeric_precision(&mut self, precision: u32) {
        self.set_formatting_options(self.formatting.with_precision(precision));
    }

    pub fn increase_decimal_places(&mut self) {
        let precision = (self.formatting.numeric_precision + 1).min(MAX_NUMERIC_PRECISION);
        self.set_numeric_precision(precision);
    }

    pub fn decrease_decimal_places(&mut self) {
        let precision = self.formatting.numeric_precision.saturating_sub(1);
        self.set_numeric_precision(precision);
    }

    pub fn set_show_network_names(&mut self, show: bool) {
        self.set_formatting_options(self.formatting.with_network_names(show));
    }

    pub fn set_color_network_names(&mut self, color: bool) {
        self.set_formatting_options(FormattingOptions {
            color_network_names: color,
            ..self.formatting
        });
    }

    pub fn set_color_result_suffixes(&mut self, color: bool) {
        self.set_formatting_options(FormattingOptions {
            color_result_suffixes: color,
            ..self.formatting
        });
    }

    pub fn set_color_number_separators(&mut self, color: bool) {
        self.set_formatting_options(FormattingOptions {
            color_number_separators: color,
            ..self.formatting
        });
    }

    pub fn set_color_measurement_units(&mut self, color: bool) {
        self.set_formatting_options(FormattingOptions {
            color_measurement_units: color,
            ..self.formatting
        });
    }

    /// Expand vector/statistic/histogram fields into scalar rows in the ALL
    /// and SCALARS categories.
    pub fn set_show_fields_as_scalars(&mut self, show: bool) {
        self.fields_as_scalars_all = show;
        self.fields_as_scalars_scalars = show;
        if let Err(e) = self.refresh() {
            warn!(error = %e, "refresh after toggling field scalars failed");
        }
        let toolbar = self.toolbar_state();
        self.emit(ViewEvent::ToolbarChanged(toolbar));
    }

    pub fn toolbar_state(&self) -> ToolbarState {
        let all_active = self.active == Category::All;
        ToolbarState {
            flat_tree_visible: all_active,
            tree_levels_visible: all_active,
            choose_columns_visible: self.active.is_tabular(),
            show_fields_as_scalars_checked: self.fields_as_scalars_all,
            number_formatting_checked: self.formatting.number_formatting_enabled,
            can_increase_precision: self.formatting.can_increase_precision(),
            can_decrease_precision: self.formatting.can_decrease_precision(),
        }
    }

    pub fn panel_titles(&self) -> Vec<PanelTitle> {
        Category::ALL
            .iter()
            .map(|c| PanelTitle {
                category: *c,
                count: self.control(*c).item_count(),
            })
            .collect()
    }

    /// Status line for the active category.
    pub fn status_message(&self) -> String {
        let control = self.control(self.active);
        format!(
            "Selected {} out of {} rows",
            control.selection_count(),
            control.item_count()
        )
    }

    /// Format rows of a category under the store's read lock.
    pub fn rows(&self, category: Category, range: std::ops::Range<usize>) -> Result<Vec<Row>> {
        let control = self.control(category);
        self.store
            .run_with_read_lock(|snapshot| control.rows(snapshot, range))
    }

    pub fn save_view_state(&self) -> ViewState {
        ViewState {
            active_tab: Some(self.active.index()),
            format_numbers: Some(self.formatting.number_formatting_enabled),
            numeric_precision: Some(self.formatting.numeric_precision),
            show_fields_as_scalars: Some(self.fields_as_scalars_all),
        }
    }

    pub fn restore_view_state(&mut self, source: &dyn StateSource) {
        let state = ViewState::read_from(source);
        self.apply_view_state(&state);
    }

    /// Apply the settings present in `state`; absent ones stay as they are.
    pub fn apply_view_state(&mut self, state: &ViewState) {
        if let Some(tab) = state.active_tab {
            match Category::from_index(tab) {
                Ok(category) => self.set_active_category(category),
                Err(e) => warn!(error = %e, "ignoring saved active tab"),
            }
        }
        let toolbar = self.toolbar_state();
        self.emit(ViewEvent::ToolbarChanged(toolbar));

        if let Some(enabled) = state.format_numbers {
            self.set_number_formatting_enabled(enabled);
        }
        if let Some(precision) = state.numeric_precision {
            self.set_numeric_precision(precision);
        }
        if let Some(show) = state.show_fields_as_scalars {
            self.set_show_fields_as_scalars(show);
        }
    }

    /// Bind to a replacement store. The old store's listener is detached and
    /// the content re-queried (or invalidated when inactive).
    pub fn rebind(&mut self, store: Arc<ResultStore>) {
        if self.disposed {
            return;
        }
        if let Some(id) = self.subscription.take() {
            self.store.unsubscribe(id);
        }
        self.subscription = Some(store.subscribe(self.relay.clone()));
        self.store = store;
        self.content_valid = false;
        if let Err(e) = self.refresh() {
            warn!(error = %e, "refresh after rebinding failed");
        }
    }

    /// Detach from the store. Idempotent; also run on drop.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.relay.dispose();
        if let Some(id) = self.subscription.take() {
            self.store.unsubscribe(id);
        }
        debug!("result view disposed");
    }

    fn query_options(&self, category: Category) -> QueryOptions {
        if !category.expands_fields() {
            return QueryOptions::default();
        }
        if category == Category::All {
            QueryOptions::with_fields(self.fields_as_scalars_all)
        } else {
            QueryOptions::with_fields(self.fields_as_scalars_scalars)
        }
    }

    fn invalidate(&mut self) {
        if self.content_valid {
            self.content_valid = false;
            self.emit(ViewEvent::ContentInvalidated);
        }
    }

    fn emit_status(&mut self) {
        let status = self.status_message();
        self.emit(ViewEvent::StatusMessage(status));
    }

    fn emit(&mut self, event: ViewEvent) {
        self.listeners.emit(&event);
    }
}

impl Drop for ResultView {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultView")
            .field("active", &self.active)
            .field("page_active", &self.page_active)
            .field("content_valid", &self.content_valid)
            .field("formatting", &self.formatting)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
