//! Order identifiers

use jiff::Timestamp;

use crate::ids::OrderId;

pub(super) const SEQUENCE_MODULUS: u32 = 10_000;

/// Generates `ORD-{unix millis}-{sequence}` identifiers.
///
/// The sequence counts up across calls so that orders placed within the same millisecond
/// get distinct identifiers. Callers still check for collisions, e.g. against restored orders.
#[derive(Debug, Default)]
pub struct OrderIdGenerator {
    sequence: u32,
}

impl OrderIdGenerator {
    /// Next candidate identifier for an order placed at `now`.
    pub fn generate(&mut self, now: Timestamp) -> OrderId {
        let sequence = self.sequence;

        self.sequence = (self.sequence + 1) % SEQUENCE_MODULUS;

        OrderId::new(format!("ORD-{}-{sequence:04}", now.as_millisecond()))
    }
}
