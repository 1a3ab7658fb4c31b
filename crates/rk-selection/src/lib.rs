//! RK selection system
//!
//! This crate provides:
//! - The selection list with hierarchical sub-element paths
//! - Preselection (hover) tracking
//! - Selection gates vetting candidates before they are accepted
//! - Observers notified through a reentrancy-safe queue
//! - Back and forward selection history
//! - A replayable command log of selection changes

pub mod change;
pub mod command_log;
pub mod config;
pub mod context;
pub mod error;
pub mod gate;
pub mod item;
pub mod notify;
pub mod observer;
pub mod resolve;
pub mod stack;
pub mod view;

// Re-exports for convenience
pub use change::{ChangeKind, MessageSource, SelectionChange};
pub use command_log::{CommandLog, ReplayLine, TracingCommandLog};
pub use config::{ConfigError, SelectionConfig};
pub use context::{
    Hover, Membership, PreselectOutcome, Preselection, SelectionContext, SharedSelection,
    create_shared_selection, preselection_info,
};
pub use error::{SelectionError, SelectionResult};
pub use gate::{ExternalObjectGate, FnGate, GateCandidate, SelectionGate};
pub use item::{SelectionEntry, SelectionItem, SelectionObject, SelectionPath};
pub use notify::{DrainGuard, DrainState, NotificationQueue};
pub use observer::{
    ObserverError, ObserverId, ObserverRegistry, ObserverResult, SelectionObserver, shared_observer,
};
pub use resolve::{Resolution, ResolveMode, object_of_type, resolve};
pub use stack::{SelectionStack, StackSnapshot};
pub use view::{Cursor, NullView, ViewHost, VisibleState};
