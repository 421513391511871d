//! Per-file decisions, the daily replacement budget and the worker pool
//! that runs validations.

mod janitor;
mod mismatch;
mod rate_limit;
mod worker;

pub use janitor::{BatchReport, Janitor, JanitorStatus};
pub use mismatch::{detect_path_mismatch, PathMismatch};
pub use rate_limit::{Clock, DailyReplacementLimiter, LimiterStatus, LocalClock};
pub use worker::{FileProcessor, JobTicket, ValidationPool};
