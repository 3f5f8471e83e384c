//! Catalogue vehicles and their availability status.

use std::fmt;
use std::str::FromStr;

use super::VehicleId;

/// Availability flag displayed in the catalogue.
///
/// Only [`VehicleStatus::Available`] and [`VehicleStatus::Reserved`] are
/// written by the deposit flow; other values come from back-office edits and
/// are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VehicleStatus {
    /// Open for reservation.
    Available,
    /// Held by an open deposit.
    Reserved,
    /// Handed over to a customer.
    SoldOut,
    /// Any other display string set by staff.
    Other(String),
}

impl VehicleStatus {
    /// Storage representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::SoldOut => "sold_out",
            Self::Other(raw) => raw.as_str(),
        }
    }

    /// Whether a new deposit may reserve the vehicle.
    pub fn is_reservable(&self) -> bool {
        !matches!(self, Self::Reserved | Self::SoldOut)
    }
}

impl FromStr for VehicleStatus {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let status = match raw.trim() {
            "available" | "Còn hàng" => Self::Available,
            "reserved" | "Đã đặt cọc" => Self::Reserved,
            "sold_out" | "Hết hàng" => Self::SoldOut,
            other => Self::Other(other.to_owned()),
        };
        Ok(status)
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalogue vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    /// Primary key.
    pub id: VehicleId,
    /// Display name, for example `VinFast VF8`.
    pub name: String,
    /// Unit price in catalogue currency units.
    pub price: i64,
    /// Exterior colour.
    pub color: String,
    /// Availability flag.
    pub status: VehicleStatus,
    /// Image URLs.
    pub images: Vec<String>,
    /// Free-form specification text.
    pub specs: String,
}
