//! termdock-core: session-state reconciliation engine.
//!
//! Ingests partially-ordered signals from three independent sources — hook
//! lifecycle events from short-lived hook processes, the persisted session
//! document, and periodic process scans — and maintains one consistent view
//! of which coding-assistant sessions exist, what state they are in, and
//! whether they are still alive.
//!
//! ```text
//! hook process  → reducer    ─┐
//! poll tick     → reconciler ─┼→ SessionStore (~/.termdock/sessions.json)
//! any reader    → snapshot  ←─┘        + LivenessCache + tab names
//! ```
//!
//! There is no cross-process lock. Each reconciling operation re-reads the
//! store immediately before mutating, and everything else is documented
//! last-write-wins: hook events for one session are externally sequential,
//! and session data is disposable — the next event rebuilds it.

pub mod error;
pub mod event;
pub mod liveness;
pub mod paths;
pub mod reconcile;
pub mod reducer;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod store;
pub mod transcript;

pub use error::TermdockError;
pub use event::{HookEvent, HookInput};
pub use liveness::{CommandTtyProbe, LivenessCache, TtyProbe};
pub use reconcile::{reconcile, DetectedProcess};
pub use reducer::{apply_hook_event, next_status, HookUpdate};
pub use session::{Session, SessionSource, SessionStatus, StoreData};
pub use settings::Settings;
pub use snapshot::{ChainedTabNames, NoTabNames, SnapshotProducer, TabNameLookup};
pub use store::SessionStore;
