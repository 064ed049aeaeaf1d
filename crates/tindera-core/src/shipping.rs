//! # Shipping Fee Lookup
//!
//! Delivery-place to fee mapping, treated as a pure external collaborator:
//! the fulfillment engine takes the fee as an input and never consults this
//! table itself. The HTTP layer resolves the fee here before calling intake.

use std::collections::HashMap;

use crate::money::Money;

/// Maps a delivery place to a flat shipping fee.
///
/// Lookups are case-insensitive on the place name. Unknown places fall
/// back to the table's default fee rather than failing the order.
///
/// ## Example
/// ```rust
/// use tindera_core::shipping::ShippingFeeTable;
///
/// let table = ShippingFeeTable::default();
/// assert_eq!(table.fee_for("Lamingan").cents(), 7000);
/// ```
#[derive(Debug, Clone)]
pub struct ShippingFeeTable {
    fees: HashMap<String, i64>,
    default_fee_cents: i64,
}

impl ShippingFeeTable {
    /// Creates an empty table with the given default fee.
    pub fn new(default_fee_cents: i64) -> Self {
        ShippingFeeTable {
            fees: HashMap::new(),
            default_fee_cents,
        }
    }

    /// Replaces the fallback fee for places without an entry.
    pub fn with_default_fee(mut self, fee_cents: i64) -> Self {
        self.default_fee_cents = fee_cents;
        self
    }

    /// Adds or replaces a place's fee.
    pub fn with_place(mut self, place: &str, fee_cents: i64) -> Self {
        self.fees.insert(place.to_lowercase(), fee_cents);
        self
    }

    /// Returns the fee for a place, or the default fee for unknown places.
    pub fn fee_for(&self, place: &str) -> Money {
        let fee = self
            .fees
            .get(&place.trim().to_lowercase())
            .copied()
            .unwrap_or(self.default_fee_cents);
        Money::from_cents(fee)
    }
}

impl Default for ShippingFeeTable {
    /// The stock fee table for the store's delivery area.
    fn default() -> Self {
        ShippingFeeTable::new(5000)
            .with_place("Poblacion", 5000)
            .with_place("San Roque", 6000)
            .with_place("Bagumbayan", 6500)
            .with_place("Lamingan", 7000)
            .with_place("Malawak", 8000)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_place() {
        let table = ShippingFeeTable::default();
        assert_eq!(table.fee_for("Lamingan").cents(), 7000);
        assert_eq!(table.fee_for("Poblacion").cents(), 5000);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = ShippingFeeTable::default();
        assert_eq!(table.fee_for("lamingan").cents(), 7000);
        assert_eq!(table.fee_for("  LAMINGAN  ").cents(), 7000);
    }

    #[test]
    fn test_unknown_place_gets_default() {
        let table = ShippingFeeTable::default();
        assert_eq!(table.fee_for("Somewhere Else").cents(), 5000);
    }

    #[test]
    fn test_custom_table() {
        let table = ShippingFeeTable::new(1000).with_place("Centro", 2500);
        assert_eq!(table.fee_for("Centro").cents(), 2500);
        assert_eq!(table.fee_for("Edge").cents(), 1000);
    }
}
