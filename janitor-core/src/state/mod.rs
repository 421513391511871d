//! Durable record of scan outcomes, replacement history and library totals.

mod document;
mod store;

pub use document::ReplacedCounts;
pub use store::{StateStore, FLUSH_EVERY};
