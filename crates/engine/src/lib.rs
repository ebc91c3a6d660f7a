//! Parkwell reconciliation engine
//!
//! The background half of the server: a recurring-task scheduler and the
//! two reconciliation sweeps (waiting-list purge, active no-show
//! cancellation) that keep every park's live tables consistent with the
//! calendar, one atomic pass at a time.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod reconciler;
pub mod scheduler;

pub use reconciler::{Reconciler, SweepReport, NO_SHOW_REASON};
pub use scheduler::{RecurringScheduler, SchedulerStats};
