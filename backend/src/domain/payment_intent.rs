//! Metadata carried on a card payment intent.
//!
//! The quote step writes the selection into the intent; the confirmation step
//! reads it back so the deposit is rebuilt from gateway-held data rather than
//! from the confirming request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{DepositPercentage, UserId, VehicleId, VehicleSelection};

const USER_ID_KEY: &str = "userId";
const VEHICLES_KEY: &str = "vehicles";
const TOTAL_AMOUNT_KEY: &str = "totalAmount";
const PERCENTAGE_KEY: &str = "depositPercentage";

/// Longest value the gateway stores under one metadata key, in characters.
pub const MAX_METADATA_VALUE_CHARS: usize = 500;

#[derive(Debug, Serialize, Deserialize)]
struct SelectionEntry {
    #[serde(rename = "idXe")]
    vehicle_id: i64,
    #[serde(rename = "SoLuong")]
    quantity: i32,
}

/// Problems decoding intent metadata.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntentMetadataError {
    /// A required key is absent.
    #[error("intent metadata is missing `{0}`")]
    Missing(&'static str),
    /// A key holds an unusable value.
    #[error("intent metadata `{key}` is invalid: {reason}")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// Parser message.
        reason: String,
    },
    /// An encoded value does not fit the gateway's per-key limit.
    #[error("intent metadata `{key}` is {length} characters; the gateway keeps at most {MAX_METADATA_VALUE_CHARS}")]
    TooLong {
        /// Offending key.
        key: &'static str,
        /// Encoded length in characters.
        length: usize,
    },
}

/// Deposit parameters recorded on an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositIntentMetadata {
    /// Paying customer.
    pub customer_id: UserId,
    /// Vehicles and quantities.
    pub selections: Vec<VehicleSelection>,
    /// Quoted total in catalogue units.
    pub total_amount: i64,
    /// Quoted percentage.
    pub percentage: DepositPercentage,
}

impl DepositIntentMetadata {
    /// Encode as gateway metadata.
    ///
    /// # Errors
    /// [`IntentMetadataError::TooLong`] when the selection list does not fit
    /// in one metadata value.
    pub fn to_metadata(&self) -> Result<BTreeMap<String, String>, IntentMetadataError> {
        let entries: Vec<SelectionEntry> = self
            .selections
            .iter()
            .map(|selection| SelectionEntry {
                vehicle_id: i64::from(selection.vehicle_id.get()),
                quantity: selection.quantity,
            })
            .collect();
        let vehicles = serde_json::to_string(&entries).map_err(|err| invalid(VEHICLES_KEY, err))?;
        let length = vehicles.chars().count();
        if length > MAX_METADATA_VALUE_CHARS {
            return Err(IntentMetadataError::TooLong {
                key: VEHICLES_KEY,
                length,
            });
        }

        Ok(BTreeMap::from([
            (USER_ID_KEY.to_owned(), self.customer_id.to_string()),
            (VEHICLES_KEY.to_owned(), vehicles),
            (TOTAL_AMOUNT_KEY.to_owned(), self.total_amount.to_string()),
            (
                PERCENTAGE_KEY.to_owned(),
                self.percentage.get().to_string(),
            ),
        ]))
    }

    /// Decode gateway metadata.
    pub fn from_metadata(metadata: &BTreeMap<String, String>) -> Result<Self, IntentMetadataError> {
        let customer_id = parse_i64(metadata, USER_ID_KEY).and_then(|raw| {
            UserId::new(raw).map_err(|err| invalid(USER_ID_KEY, err))
        })?;

        let raw_vehicles = required(metadata, VEHICLES_KEY)?;
        let entries: Vec<SelectionEntry> =
            serde_json::from_str(raw_vehicles).map_err(|err| invalid(VEHICLES_KEY, err))?;
        let selections = entries
            .into_iter()
            .map(|entry| {
                VehicleId::new(entry.vehicle_id)
                    .map(|vehicle_id| VehicleSelection {
                        vehicle_id,
                        quantity: entry.quantity,
                    })
                    .map_err(|err| invalid(VEHICLES_KEY, err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total_amount = parse_i64(metadata, TOTAL_AMOUNT_KEY)?;
        let percentage = parse_i64(metadata, PERCENTAGE_KEY).and_then(|raw| {
            DepositPercentage::new(raw).map_err(|err| invalid(PERCENTAGE_KEY, err))
        })?;

        Ok(Self {
            customer_id,
            selections,
            total_amount,
            percentage,
        })
    }
}

fn required<'a>(
    metadata: &'a BTreeMap<String, String>,
    key: &'static str,
) -> Result<&'a str, IntentMetadataError> {
    metadata
        .get(key)
        .map(String::as_str)
        .ok_or(IntentMetadataError::Missing(key))
}

fn parse_i64(
    metadata: &BTreeMap<String, String>,
    key: &'static str,
) -> Result<i64, IntentMetadataError> {
    required(metadata, key)?
        .trim()
        .parse::<i64>()
        .map_err(|err| invalid(key, err))
}

fn invalid(key: &'static str, err: impl std::fmt::Display) -> IntentMetadataError {
    IntentMetadataError::Invalid {
        key,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn metadata() -> DepositIntentMetadata {
        DepositIntentMetadata {
            customer_id: UserId::new(3).expect("valid id"),
            selections: vec![VehicleSelection {
                vehicle_id: VehicleId::new(11).expect("valid id"),
                quantity: 1,
            }],
            total_amount: 1_000_000_000,
            percentage: DepositPercentage::new(20).expect("allowed"),
        }
    }

    #[rstest]
    fn encodes_wire_keys(metadata: DepositIntentMetadata) {
        let encoded = metadata.to_metadata().expect("encodes");
        assert_eq!(encoded.get("userId").map(String::as_str), Some("3"));
        assert_eq!(
            encoded.get("vehicles").map(String::as_str),
            Some(r#"[{"idXe":11,"SoLuong":1}]"#)
        );
        assert_eq!(encoded.get("depositPercentage").map(String::as_str), Some("20"));
        assert_eq!(
            DepositIntentMetadata::from_metadata(&encoded).expect("decodes"),
            metadata
        );
    }

    #[rstest]
    fn missing_keys_are_named(metadata: DepositIntentMetadata) {
        let mut encoded = metadata.to_metadata().expect("encodes");
        encoded.remove("userId");
        assert_eq!(
            DepositIntentMetadata::from_metadata(&encoded),
            Err(IntentMetadataError::Missing("userId"))
        );
    }

    #[rstest]
    #[case("vehicles", "not json")]
    #[case("depositPercentage", "15")]
    #[case("totalAmount", "lots")]
    #[case("userId", "0")]
    fn invalid_values_are_rejected(
        metadata: DepositIntentMetadata,
        #[case] key: &'static str,
        #[case] value: &str,
    ) {
        let mut encoded = metadata.to_metadata().expect("encodes");
        encoded.insert(key.to_owned(), value.to_owned());
        let err = DepositIntentMetadata::from_metadata(&encoded).expect_err("invalid");
        assert!(matches!(err, IntentMetadataError::Invalid { key: k, .. } if k == key));
    }

    #[rstest]
    fn oversized_selection_lists_are_refused(mut metadata: DepositIntentMetadata) {
        metadata.selections = (1..=40)
            .map(|id| VehicleSelection {
                vehicle_id: VehicleId::new(id).expect("valid id"),
                quantity: 1,
            })
            .collect();
        let err = metadata.to_metadata().expect_err("too long");
        assert!(matches!(
            err,
            IntentMetadataError::TooLong { key: "vehicles", length } if length > MAX_METADATA_VALUE_CHARS
        ));
    }
}
