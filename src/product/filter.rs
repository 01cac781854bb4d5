use crate::config::{CrawlConfig, OverCeilingPolicy};
use crate::product::ProductRecord;

/// Outcome of running a record through the price filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// Emit as-is
    Emit,
    /// Emit with `over_price_ceiling` set
    EmitFlagged,
    /// Do not emit
    Drop,
}

/// Price ceiling applied before emission
///
/// Records without a price, or whose price text did not parse, always pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceFilter {
    pub ceiling: f64,
    pub policy: OverCeilingPolicy,
}

impl PriceFilter {
    pub fn new(ceiling: f64, policy: OverCeilingPolicy) -> Self {
        Self { ceiling, policy }
    }

    /// Decides what happens to a record
    pub fn decide(&self, record: &ProductRecord) -> FilterDecision {
        match record.numeric_price() {
            Some(price) if price > self.ceiling => match self.policy {
                OverCeilingPolicy::Drop => FilterDecision::Drop,
                OverCeilingPolicy::Flag => FilterDecision::EmitFlagged,
            },
            _ => FilterDecision::Emit,
        }
    }

    /// Applies the decision, returning the record to emit if any
    pub fn apply(&self, mut record: ProductRecord) -> Option<ProductRecord> {
        match self.decide(&record) {
            FilterDecision::Emit => Some(record),
            FilterDecision::EmitFlagged => {
                record.over_price_ceiling = true;
                Some(record)
            }
            FilterDecision::Drop => None,
        }
    }
}

impl From<&CrawlConfig> for PriceFilter {
    fn from(config: &CrawlConfig) -> Self {
        Self::new(config.price_ceiling, config.over_ceiling)
    }
}

impl Default for PriceFilter {
    fn default() -> Self {
        Self::new(100.0, OverCeilingPolicy::Drop)
    }
}
