//! Product records and the filter they pass before emission

mod filter;
mod record;

pub use filter::{FilterDecision, PriceFilter};
pub use record::{FieldValue, ProductRecord};
