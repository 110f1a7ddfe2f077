//! Run events for live progress
//!
//! Every state transition of a run is emitted on a broadcast [`EventBus`].
//! Emission is fire-and-forget; a run with no subscribers behaves the same
//! as one being watched by the progress renderer.
//!
//! ```rust,ignore
//! let bus = create_event_bus();
//! let mut rx = bus.subscribe();
//! let emitter = bus.emitter_for("run-123");
//! emitter.task_started("t1", "Search for benchmarks");
//! ```

mod bus;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventEmitter, create_event_bus};
pub use types::{PlannedTask, RunEvent, summarize};
