//! Selection context
//!
//! [`SelectionContext`] owns the selection list, the picked list, the hover
//! state, the installed gate, observers and the history stacks. Hosts keep
//! one per application, usually behind [`SharedSelection`].

mod dispatch;
mod navigation;
mod preselect;
mod query;
mod store;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rk_core::{DocumentGraph, ObjectKey};
use tracing::{debug, info};

use crate::command_log::{CommandLog, LogSuppression, ReplayLine, TracingCommandLog, log_item};
use crate::config::SelectionConfig;
use crate::gate::{ActiveGate, ExternalObjectGate, GateCandidate, SelectionGate};
use crate::item::SelectionItem;
use crate::notify::NotificationQueue;
use crate::observer::{ObserverId, ObserverRegistry, SelectionObserver};
use crate::resolve::ResolveMode;
use crate::stack::SelectionStack;
use crate::view::{Cursor, NullView, ViewHost};

pub use preselect::{Hover, PreselectOutcome, Preselection, preselection_info};
pub use query::Membership;

/// Selection context shared between a host's subsystems
pub type SharedSelection = Arc<Mutex<SelectionContext>>;

/// Create a shared selection context
pub fn create_shared_selection(
    graph: Arc<dyn DocumentGraph>,
    config: SelectionConfig,
) -> SharedSelection {
    Arc::new(Mutex::new(SelectionContext::init(graph, config)))
}

/// Message shown when a gate rejects without giving a reason
const DEFAULT_REJECTION: &str = "Selection not allowed by filter";

pub struct SelectionContext {
    graph: Arc<dyn DocumentGraph>,
    view: Box<dyn ViewHost>,
    command_log: Box<dyn CommandLog>,
    config: SelectionConfig,

    items: Vec<SelectionItem>,
    picked: Vec<SelectionItem>,
    need_picked_list: bool,
    preselection: Preselection,

    gate: Option<ActiveGate>,
    last_rejection: Option<String>,

    queue: NotificationQueue,
    observers: ObserverRegistry,
    stack: SelectionStack,
    log_suppression: LogSuppression,
    shut_down: bool,
}

impl fmt::Debug for SelectionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionContext")
            .field("config", &self.config)
            .field("items", &self.items)
            .field("picked", &self.picked)
            .field("preselection", &self.preselection)
            .field("gate", &self.gate)
            .field("observers", &self.observers)
            .field("stack", &self.stack)
            .finish_non_exhaustive()
    }
}

impl SelectionContext {
    /// Create a context over `graph` with a headless view and a tracing command log
    pub fn init(graph: Arc<dyn DocumentGraph>, config: SelectionConfig) -> Self {
        info!("Selection context initialized (history size {})", config.stack_size);
        Self {
            graph,
            view: Box::new(NullView),
            command_log: Box::new(TracingCommandLog),
            stack: SelectionStack::new(config.stack_size),
            need_picked_list: config.need_picked_list,
            config,
            items: Vec::new(),
            picked: Vec::new(),
            preselection: Preselection::Idle,
            gate: None,
            last_rejection: None,
            queue: NotificationQueue::new(),
            observers: ObserverRegistry::new(),
            log_suppression: LogSuppression::default(),
            shut_down: false,
        }
    }

    /// Use `view` for view callbacks
    pub fn with_view(mut self, view: impl ViewHost + 'static) -> Self {
        self.view = Box::new(view);
        self
    }

    /// Send replay lines to `log`
    pub fn with_command_log(mut self, log: impl CommandLog + 'static) -> Self {
        self.command_log = Box::new(log);
        self
    }

    pub fn set_view(&mut self, view: Box<dyn ViewHost>) {
        self.view = view;
    }

    pub fn set_command_log(&mut self, log: Box<dyn CommandLog>) {
        self.command_log = log;
    }

    /// Tear down: detach observers, drop the gate and all state
    ///
    /// No notifications are sent. Later mutations are ignored.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.observers.clear();
        self.rmv_selection_gate();
        self.items.clear();
        self.picked.clear();
        self.preselection = Preselection::Idle;
        self.queue.clear();
        self.stack.clear();
        self.shut_down = true;
        info!("Selection context shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn graph(&self) -> &Arc<dyn DocumentGraph> {
        &self.graph
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Replace the configuration, resizing the history stacks
    pub fn set_config(&mut self, config: SelectionConfig) {
        self.stack.set_capacity(config.stack_size);
        self.config = config;
    }

    // ============== Gate ==============

    /// Install `gate`, replacing any existing one
    pub fn add_selection_gate(&mut self, gate: impl SelectionGate + 'static, resolve: ResolveMode) {
        self.install_gate(Box::new(gate), resolve, None);
    }

    /// Install `gate` with the configured resolve mode
    pub fn add_selection_gate_default(&mut self, gate: impl SelectionGate + 'static) {
        let resolve = self.config.gate_resolve;
        self.add_selection_gate(gate, resolve);
    }

    /// Remove the installed gate, if any
    pub fn rmv_selection_gate(&mut self) {
        if self.gate.take().is_some() {
            debug!("Selection gate removed");
            self.view.restore_override_cursor();
        }
    }

    pub fn has_selection_gate(&self) -> bool {
        self.gate.is_some()
    }

    /// Message shown for the most recent gate rejection
    pub fn last_rejection(&self) -> Option<&str> {
        self.last_rejection.as_deref()
    }

    fn install_gate(
        &mut self,
        gate: Box<dyn SelectionGate>,
        resolve: ResolveMode,
        owner: Option<ObserverId>,
    ) {
        self.rmv_selection_gate();
        debug!("Selection gate installed ({:?})", resolve);
        self.gate = Some(ActiveGate {
            gate,
            resolve,
            owner,
        });
    }

    /// Ask the installed gate about a resolved candidate
    ///
    /// Returns the gate's reason on rejection.
    fn gate_allows(
        &mut self,
        document: &str,
        object: Option<&ObjectKey>,
        subelement: &str,
    ) -> Result<(), Option<String>> {
        let Some(active) = self.gate.as_mut() else {
            return Ok(());
        };
        let candidate = GateCandidate {
            document,
            object,
            subelement,
        };
        if active.gate.allow(self.graph.as_ref(), &candidate) {
            Ok(())
        } else {
            Err(active.gate.take_rejection_reason())
        }
    }

    /// User feedback for a rejected selection
    fn reject_selection(&mut self, reason: Option<String>) {
        let message = reason.unwrap_or_else(|| DEFAULT_REJECTION.to_string());
        debug!("Selection rejected: {}", message);
        self.view.show_message(&message);
        self.view.set_override_cursor(Cursor::Forbidden);
        self.view.beep();
        self.last_rejection = Some(message);
    }

    // ============== Observers ==============

    /// Attach an observer receiving changes resolved under `resolve`
    pub fn attach<O>(&mut self, observer: &Arc<Mutex<O>>, resolve: ResolveMode) -> ObserverId
    where
        O: SelectionObserver + 'static,
    {
        let id = self.observers.attach(observer, resolve);
        debug!("Selection observer {} attached ({:?})", id, resolve);
        id
    }

    /// Attach an observer that keeps the selection inside `owner`'s document
    ///
    /// Installs an [`ExternalObjectGate`] that also rejects `owner` itself.
    /// The gate is removed when the observer is detached.
    pub fn attach_filtered<O>(
        &mut self,
        observer: &Arc<Mutex<O>>,
        resolve: ResolveMode,
        owner: &ObjectKey,
    ) -> ObserverId
    where
        O: SelectionObserver + 'static,
    {
        let id = self.attach(observer, resolve);
        self.install_gate(
            Box::new(ExternalObjectGate::for_owner(owner)),
            ResolveMode::NoResolve,
            Some(id),
        );
        id
    }

    /// Detach an observer and any gate it installed
    pub fn detach(&mut self, id: ObserverId) -> bool {
        let detached = self.observers.detach(id);
        if self.gate.as_ref().is_some_and(|g| g.owner == Some(id)) {
            self.rmv_selection_gate();
        }
        if detached {
            debug!("Selection observer {} detached", id);
        }
        detached
    }

    /// Block or unblock delivery to an observer; returns the previous state
    pub fn block_observer(&mut self, id: ObserverId, blocked: bool) -> bool {
        self.observers.block(id, blocked)
    }

    pub fn is_observer_attached(&self, id: ObserverId) -> bool {
        self.observers.is_attached(id)
    }

    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    // ============== Command log ==============

    /// Suspend replay logging; calls nest. Returns the nesting depth.
    pub fn disable_command_log(&mut self) -> u32 {
        if self.log_suppression.depth == 0 {
            self.log_suppression.had_selection = self.has_selection();
        }
        self.log_suppression.depth += 1;
        self.log_suppression.depth
    }

    /// Undo one [`disable_command_log`](Self::disable_command_log)
    ///
    /// When the outermost suppression ends and `silent` is false, the net
    /// effect is written: a clear if the selection was emptied, otherwise
    /// every item added meanwhile.
    pub fn enable_command_log(&mut self, silent: bool) -> u32 {
        self.log_suppression.depth = self.log_suppression.depth.saturating_sub(1);
        if self.log_suppression.depth > 0 || silent {
            return self.log_suppression.depth;
        }
        if self.items.is_empty() {
            if self.log_suppression.had_selection {
                self.command_log.add_line(&ReplayLine::Clear {
                    document: None,
                    keep_preselect: false,
                });
            }
        } else {
            for item in &mut self.items {
                log_item(self.command_log.as_mut(), item, false, true);
            }
        }
        0
    }

    pub fn is_command_log_disabled(&self) -> bool {
        self.log_suppression.is_active()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use rk_core::{ElementNamePair, GEO_FEATURE_TYPE, GROUP_TYPE, LINK_TYPE, MemoryDocuments};

    use super::SelectionContext;
    use crate::change::{ChangeKind, SelectionChange};
    use crate::config::SelectionConfig;
    use crate::observer::{ObserverResult, SelectionObserver};

    /// `Doc` holds `Part` (containing `Body`), `Box` and `Link` to `Lib#Shape`
    pub fn sample_documents() -> Arc<MemoryDocuments> {
        let docs = MemoryDocuments::new();
        docs.add_document("Doc").unwrap();
        docs.add_document("Lib").unwrap();

        let part = docs.add_object("Doc", "Part", GROUP_TYPE).unwrap();
        let body = docs.add_object("Doc", "Body", GEO_FEATURE_TYPE).unwrap();
        docs.add_child(&part, "Body").unwrap();
        docs.add_element(&body, ElementNamePair::new(";e1;Pad", "Edge1"))
            .unwrap();
        docs.add_elements(&body, &["Edge2", "Face3"]).unwrap();

        let cube = docs.add_object("Doc", "Box", GEO_FEATURE_TYPE).unwrap();
        docs.add_elements(&cube, &["Face1", "Face2"]).unwrap();

        let shape = docs.add_object("Lib", "Shape", GEO_FEATURE_TYPE).unwrap();
        docs.add_elements(&shape, &["Edge5"]).unwrap();
        let link = docs.add_object("Doc", "Link", LINK_TYPE).unwrap();
        docs.set_link(&link, &shape).unwrap();

        Arc::new(docs)
    }

    pub fn context() -> (Arc<MemoryDocuments>, SelectionContext) {
        let docs = sample_documents();
        let selection = SelectionContext::init(docs.clone(), SelectionConfig::default());
        (docs, selection)
    }

    /// Observer keeping every change it receives
    #[derive(Debug, Default)]
    pub struct Recorder {
        pub changes: Vec<SelectionChange>,
    }

    impl Recorder {
        pub fn kinds(&self) -> Vec<ChangeKind> {
            self.changes.iter().map(|c| c.kind).collect()
        }
    }

    impl SelectionObserver for Recorder {
        fn on_selection_changed(
            &mut self,
            _selection: &mut SelectionContext,
            change: &SelectionChange,
        ) -> ObserverResult {
            self.changes.push(change.clone());
            Ok(())
        }
    }
}
