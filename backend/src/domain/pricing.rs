//! Deposit pricing.
//!
//! Pure functions: totals are recomputed from catalogue prices on every call
//! and client-supplied amounts are never trusted. Catalogue prices are whole
//! currency units; gateway amounts are in the settlement currency's smallest
//! unit (cents).

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::{Vehicle, VehicleId};

/// Deposit share of the total price, restricted to a fixed allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepositPercentage(u8);

/// Percentage outside the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deposit percentage {0} is not one of 10, 20, 30, 40, 50, 100")]
pub struct UnsupportedPercentage(pub i64);

impl DepositPercentage {
    /// Accepted percentages.
    pub const ALLOWED: [u8; 6] = [10, 20, 30, 40, 50, 100];

    /// Percentage applied when the caller omits one.
    pub const DEFAULT: Self = Self(100);

    /// Validate a raw percentage.
    pub fn new(raw: i64) -> Result<Self, UnsupportedPercentage> {
        Self::ALLOWED
            .iter()
            .copied()
            .find(|allowed| i64::from(*allowed) == raw)
            .map(Self)
            .ok_or(UnsupportedPercentage(raw))
    }

    /// Raw percentage value.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// `round(total × percentage / 100)`, halves away from zero.
    ///
    /// # Errors
    /// [`PricingError::Overflow`] when the share leaves the `i64` range.
    pub fn share_of(self, total: i64) -> Result<i64, PricingError> {
        round_to_i64(Decimal::from(total) * Decimal::from(self.0) / Decimal::ONE_HUNDRED)
    }
}

impl fmt::Display for DepositPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// One vehicle chosen by the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleSelection {
    /// Selected vehicle.
    pub vehicle_id: VehicleId,
    /// Units requested.
    pub quantity: i32,
}

/// Errors raised while pricing a selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// No vehicles were selected.
    #[error("at least one vehicle must be selected")]
    EmptySelection,
    /// Quantity below one.
    #[error("quantity for vehicle {vehicle_id} must be at least 1")]
    InvalidQuantity {
        /// Offending vehicle.
        vehicle_id: VehicleId,
    },
    /// A selected id is not in the catalogue.
    #[error("vehicle {vehicle_id} not found")]
    VehicleNotFound {
        /// Unknown vehicle.
        vehicle_id: VehicleId,
    },
    /// Intermediate arithmetic left the `i64` range.
    #[error("deposit amount is out of range")]
    Overflow,
    /// The gateway charge is above the configured ceiling.
    #[error("deposit of {requested} exceeds the gateway maximum of {maximum}")]
    ExceedsGatewayCeiling {
        /// Amount the deposit would need, in smallest settlement units.
        requested: i64,
        /// Gateway ceiling, in smallest settlement units.
        maximum: i64,
    },
}

/// Merge duplicate vehicle ids by summing their quantities.
///
/// Output is ordered by first appearance so the first selected vehicle stays
/// the deposit's primary vehicle.
pub fn merge_selections(selections: &[VehicleSelection]) -> Result<Vec<VehicleSelection>, PricingError> {
    if selections.is_empty() {
        return Err(PricingError::EmptySelection);
    }
    let mut merged: Vec<VehicleSelection> = Vec::with_capacity(selections.len());
    for selection in selections {
        if selection.quantity < 1 {
            return Err(PricingError::InvalidQuantity {
                vehicle_id: selection.vehicle_id,
            });
        }
        match merged
            .iter_mut()
            .find(|existing| existing.vehicle_id == selection.vehicle_id)
        {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(selection.quantity)
                    .ok_or(PricingError::Overflow)?;
            }
            None => merged.push(*selection),
        }
    }
    Ok(merged)
}

/// Selection line with its catalogue price resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItem {
    /// Catalogue vehicle.
    pub vehicle: Vehicle,
    /// Units reserved.
    pub quantity: i32,
}

impl PricedItem {
    /// Unit price at quote time.
    pub fn unit_price(&self) -> i64 {
        self.vehicle.price
    }
}

/// Priced selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositQuote {
    /// Lines in selection order.
    pub items: Vec<PricedItem>,
    /// `Σ price × quantity`.
    pub total_price: i64,
    /// `round(total × percentage / 100)`.
    pub deposit_amount: i64,
    /// Applied percentage.
    pub percentage: DepositPercentage,
}

/// Price a selection against catalogue rows.
///
/// # Examples
/// ```
/// use showroom::domain::{
///     DepositPercentage, Vehicle, VehicleId, VehicleSelection, VehicleStatus, quote_deposit,
/// };
///
/// let id = VehicleId::new(1).expect("id");
/// let vehicle = Vehicle {
///     id,
///     name: "VF8".into(),
///     price: 1_000_000_000,
///     color: "blue".into(),
///     status: VehicleStatus::Available,
///     images: vec![],
///     specs: String::new(),
/// };
/// let pct = DepositPercentage::new(20).expect("allowed");
/// let quote = quote_deposit(&[VehicleSelection { vehicle_id: id, quantity: 1 }], pct, &[vehicle])
///     .expect("priced");
/// assert_eq!(quote.deposit_amount, 200_000_000);
/// ```
pub fn quote_deposit(
    selections: &[VehicleSelection],
    percentage: DepositPercentage,
    catalogue: &[Vehicle],
) -> Result<DepositQuote, PricingError> {
    let merged = merge_selections(selections)?;
    let by_id: BTreeMap<VehicleId, &Vehicle> = catalogue.iter().map(|v| (v.id, v)).collect();

    let mut items = Vec::with_capacity(merged.len());
    let mut total_price: i64 = 0;
    for selection in merged {
        let vehicle = by_id
            .get(&selection.vehicle_id)
            .ok_or(PricingError::VehicleNotFound {
                vehicle_id: selection.vehicle_id,
            })?;
        let line_total = vehicle
            .price
            .checked_mul(i64::from(selection.quantity))
            .ok_or(PricingError::Overflow)?;
        total_price = total_price
            .checked_add(line_total)
            .ok_or(PricingError::Overflow)?;
        items.push(PricedItem {
            vehicle: (*vehicle).clone(),
            quantity: selection.quantity,
        });
    }

    let deposit_amount = percentage.share_of(total_price)?;

    Ok(DepositQuote {
        items,
        total_price,
        deposit_amount,
        percentage,
    })
}

fn round_to_i64(value: Decimal) -> Result<i64, PricingError> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::Overflow)
}

/// Behaviour when a charge exceeds the gateway ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CeilingPolicy {
    /// Refuse the deposit.
    #[default]
    Reject,
    /// Submit the ceiling and flag the shortfall to the caller.
    Cap,
}

/// Settlement currency, conversion and ceiling for gateway charges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayPricing {
    /// ISO currency code sent to the gateway, lower-case.
    pub currency: String,
    /// Catalogue units per one settlement major unit (for example VND per USD).
    pub conversion_rate: Decimal,
    /// Largest charge the gateway accepts, in smallest settlement units.
    pub max_amount: i64,
    /// Behaviour above `max_amount`.
    pub ceiling_policy: CeilingPolicy,
}

impl Default for GatewayPricing {
    fn default() -> Self {
        Self {
            currency: "usd".to_owned(),
            conversion_rate: Decimal::from(25_000),
            max_amount: 99_999_999,
            ceiling_policy: CeilingPolicy::Reject,
        }
    }
}

/// Amount to submit to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCharge {
    /// Settlement currency.
    pub currency: String,
    /// Converted deposit before the ceiling is applied.
    pub requested_amount: i64,
    /// Amount actually submitted.
    pub submitted_amount: i64,
    /// Whether `submitted_amount` is below `requested_amount`.
    pub capped: bool,
}

impl GatewayPricing {
    /// Convert a deposit into a gateway charge, applying the ceiling policy.
    pub fn charge_for(&self, deposit_amount: i64) -> Result<GatewayCharge, PricingError> {
        if self.conversion_rate <= Decimal::ZERO {
            return Err(PricingError::Overflow);
        }
        let requested_amount = round_to_i64(
            Decimal::from(deposit_amount) / self.conversion_rate * Decimal::ONE_HUNDRED,
        )?;

        if requested_amount <= self.max_amount {
            return Ok(GatewayCharge {
                currency: self.currency.clone(),
                requested_amount,
                submitted_amount: requested_amount,
                capped: false,
            });
        }
        match self.ceiling_policy {
            CeilingPolicy::Reject => Err(PricingError::ExceedsGatewayCeiling {
                requested: requested_amount,
                maximum: self.max_amount,
            }),
            CeilingPolicy::Cap => Ok(GatewayCharge {
                currency: self.currency.clone(),
                requested_amount,
                submitted_amount: self.max_amount,
                capped: true,
            }),
        }
    }

    /// Convert a gateway amount back into catalogue units.
    ///
    /// # Errors
    /// [`PricingError::Overflow`] for a non-positive rate or an out-of-range
    /// result.
    pub fn catalogue_amount(&self, gateway_amount: i64) -> Result<i64, PricingError> {
        if self.conversion_rate <= Decimal::ZERO {
            return Err(PricingError::Overflow);
        }
        round_to_i64(Decimal::from(gateway_amount) * self.conversion_rate / Decimal::ONE_HUNDRED)
    }
}
