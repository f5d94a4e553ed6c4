//! Concrete producers of queueable statements.

mod insert;
mod lookup;
mod raw;
mod record;

pub use insert::{Insert, InsertResult};
pub use lookup::Lookup;
pub use raw::RawStatement;
pub use record::Record;
