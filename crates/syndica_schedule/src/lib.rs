//! Post scheduling state machine for syndica.
//!
//! Watches live post documents through a [`DocumentStore`]
//! subscription, commits desired schedules, and on a fixed tick decides
//! whether "now" has entered the due window, invoking the container
//! publisher and writing resulting state back to the document. Failed
//! attempts demote back to the desired state with a recorded reason,
//! making them retry candidates; a published variant is terminal.

#![warn(missing_docs)]

mod scheduler;
mod store;

pub use scheduler::{DueState, PostScheduler, SchedulerTiming, commit_eligible, due_state};
pub use store::{DocumentStore, MemoryDocumentStore, PostSnapshot, VariantMutation};
