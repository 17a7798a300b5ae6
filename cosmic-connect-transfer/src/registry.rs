//! Transfer Registry
//!
//! Owns every transfer widget of a chat log and routes core notifications to
//! them by transfer identity. Widgets leave the routing table as soon as they
//! reach a terminal state, but stay in the log so they keep rendering.
//!
//! ## Example
//!
//! ```rust
//! use cosmic_connect_transfer::{
//!     FileTransferInfo, RecordingCore, TransferEvent, TransferRegistry, TransferStatus,
//!     WidgetConfig,
//! };
//! use std::rc::Rc;
//!
//! let core = Rc::new(RecordingCore::new());
//! let mut registry = TransferRegistry::new(core.clone(), WidgetConfig::default());
//!
//! let info = FileTransferInfo::incoming(1, 0, "photo.png", 4096);
//! let identity = info.identity;
//! let id = registry.add_transfer(info).unwrap();
//!
//! assert!(registry.dispatch(&identity, TransferEvent::Cancelled));
//! assert_eq!(registry.widget(id).unwrap().status(), TransferStatus::Canceled);
//! assert!(!registry.dispatch(&identity, TransferEvent::Accepted));
//! ```

use crate::backend::{SavePathPrompt, TransferCore};
use crate::clock::{Clock, SystemClock};
use crate::config::WidgetConfig;
use crate::controls::ClickTarget;
use crate::transfer::{FileTransferInfo, TransferEvent, TransferIdentity};
use crate::widget::{StateChange, TransferWidget};
use crate::{Result, TransferError, WidgetId};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use tracing::{debug, trace};

/// Source of widget ids, unique per registry
#[derive(Debug, Default, Clone)]
pub struct WidgetIdSequence {
    next: WidgetId,
}

impl WidgetIdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence continuing from `first`
    pub fn starting_at(first: WidgetId) -> Self {
        Self { next: first }
    }

    /// Hand out the next id; wraps around after `u64::MAX`
    pub fn next_id(&mut self) -> WidgetId {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}

type SharedListener = Rc<dyn Fn(&StateChange)>;

/// All transfer widgets of a chat log
pub struct TransferRegistry {
    ids: WidgetIdSequence,
    core: Rc<dyn TransferCore>,
    clock: Rc<dyn Clock>,
    config: WidgetConfig,
    widgets: BTreeMap<WidgetId, TransferWidget>,
    routes: HashMap<TransferIdentity, WidgetId>,
    listeners: Vec<SharedListener>,
}

impl TransferRegistry {
    pub fn new(core: Rc<dyn TransferCore>, config: WidgetConfig) -> Self {
        Self::with_clock(core, Rc::new(SystemClock), config)
    }

    pub fn with_clock(
        core: Rc<dyn TransferCore>,
        clock: Rc<dyn Clock>,
        config: WidgetConfig,
    ) -> Self {
        Self {
            ids: WidgetIdSequence::new(),
            core,
            clock,
            config,
            widgets: BTreeMap::new(),
            routes: HashMap::new(),
            listeners: Vec::new(),
        }
    }

    /// Use a specific id sequence, e.g. one shared with other chat logs
    pub fn with_id_sequence(mut self, ids: WidgetIdSequence) -> Self {
        self.ids = ids;
        self
    }

    /// Subscribe to state changes of every current and future widget
    pub fn subscribe(&mut self, listener: impl Fn(&StateChange) + 'static) {
        let listener: SharedListener = Rc::new(listener);
        for widget in self.widgets.values_mut() {
            let listener = listener.clone();
            widget.on_state_changed(move |change| listener(change));
        }
        self.listeners.push(listener);
    }

    /// Create a widget for a newly announced transfer
    ///
    /// Fails if a live widget already routes the same identity.
    pub fn add_transfer(&mut self, info: FileTransferInfo) -> Result<WidgetId> {
        if self.live_route(&info.identity).is_some() {
            return Err(TransferError::DuplicateTransfer(info.identity));
        }

        let id = self.ids.next_id();
        let identity = info.identity;
        let mut widget = TransferWidget::with_clock(
            id,
            info,
            self.core.clone(),
            self.clock.clone(),
            self.config.clone(),
        );
        for listener in &self.listeners {
            let listener = listener.clone();
            widget.on_state_changed(move |change| listener(change));
        }

        self.widgets.insert(id, widget);
        self.routes.insert(identity, id);
        debug!("Registered transfer widget {} for {}", id, identity);
        Ok(id)
    }

    /// Route a core notification to the widget registered for `identity`
    ///
    /// Returns whether a widget applied it.
    pub fn dispatch(&mut self, identity: &TransferIdentity, event: TransferEvent) -> bool {
        let Some(id) = self.live_route(identity) else {
            self.routes.remove(identity);
            trace!("No live widget for {} ({})", identity, event.kind());
            return false;
        };

        let applied = self
            .widgets
            .get_mut(&id)
            .map(|widget| widget.handle_event(identity, event))
            .unwrap_or(false);
        self.detach_if_finished(id);
        applied
    }

    /// Handle a click code coming back from the rendered log
    pub fn dispatch_click(&mut self, code: &str, prompt: &mut dyn SavePathPrompt) -> Result<()> {
        let target: ClickTarget = code.parse()?;
        let widget = self
            .widgets
            .get_mut(&target.widget_id)
            .ok_or(TransferError::UnknownWidget(target.widget_id))?;

        widget.press(target.button, prompt);
        self.detach_if_finished(target.widget_id);
        Ok(())
    }

    /// Markup for a single widget
    pub fn render(&self, id: WidgetId) -> Result<String> {
        self.widgets
            .get(&id)
            .map(TransferWidget::render)
            .ok_or(TransferError::UnknownWidget(id))
    }

    /// Markup for every widget, oldest first
    pub fn render_all(&self) -> String {
        self.widgets.values().map(TransferWidget::render).collect()
    }

    pub fn widget(&self, id: WidgetId) -> Option<&TransferWidget> {
        self.widgets.get(&id)
    }

    /// Direct access to a widget
    ///
    /// A widget driven into a terminal state through this handle stops being
    /// routed on the next registry call.
    pub fn widget_mut(&mut self, id: WidgetId) -> Option<&mut TransferWidget> {
        self.widgets.get_mut(&id)
    }

    /// Widget currently receiving notifications for `identity`
    pub fn route(&self, identity: &TransferIdentity) -> Option<WidgetId> {
        self.live_route(identity)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Number of widgets still attached to the core
    pub fn active_count(&self) -> usize {
        self.routes
            .keys()
            .filter(|identity| self.live_route(identity).is_some())
            .count()
    }

    fn live_route(&self, identity: &TransferIdentity) -> Option<WidgetId> {
        self.routes
            .get(identity)
            .copied()
            .filter(|id| self.widgets.get(id).is_some_and(|w| !w.is_detached()))
    }

    fn detach_if_finished(&mut self, id: WidgetId) {
        let Some(widget) = self.widgets.get(&id) else {
            return;
        };
        if widget.is_detached() {
            let identity = *widget.identity();
            if self.routes.get(&identity) == Some(&id) {
                self.routes.remove(&identity);
                debug!("Detached transfer widget {} from {}", id, identity);
            }
        }
    }
}
