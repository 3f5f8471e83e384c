//! Vehicle pickup appointments.
//!
//! A pickup row is written for every reserved vehicle. When the caller does
//! not propose a slot the row stays unscheduled (`pickup_at = None`) until
//! staff book one; the legacy randomised window is available behind
//! [`PickupPolicy::Randomized`].

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use rand::Rng;

use super::{DepositId, UserId, VehicleId};

/// Pickup appointment row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupSchedule {
    /// Owning deposit.
    pub deposit_id: DepositId,
    /// Vehicle to hand over.
    pub vehicle_id: VehicleId,
    /// Collecting customer.
    pub customer_id: UserId,
    /// Appointment time; `None` means not yet scheduled.
    pub pickup_at: Option<DateTime<Utc>>,
    /// Showroom location.
    pub location: Option<String>,
}

impl PickupSchedule {
    /// Whether staff still need to book a slot.
    pub fn is_unscheduled(&self) -> bool {
        self.pickup_at.is_none()
    }
}

/// Slot proposed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupRequest {
    /// Requested time.
    pub pickup_at: DateTime<Utc>,
    /// Requested location, or the default showroom when absent.
    pub location: Option<String>,
}

/// What to write when no slot is proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickupPolicy {
    /// Leave the slot empty for staff to schedule.
    #[default]
    Unscheduled,
    /// Invent a slot 2–5 days out between 08:00 and 18:00.
    Randomized,
}

/// Earliest day offset for randomised slots.
pub const RANDOM_PICKUP_MIN_DAYS: i64 = 2;
/// Latest day offset for randomised slots.
pub const RANDOM_PICKUP_MAX_DAYS: i64 = 5;
/// Earliest hour for randomised slots.
pub const RANDOM_PICKUP_FIRST_HOUR: u32 = 8;
/// Latest hour for randomised slots.
pub const RANDOM_PICKUP_LAST_HOUR: u32 = 18;

/// Slot resolved for a new pickup row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPickup {
    /// Appointment time, if any.
    pub pickup_at: Option<DateTime<Utc>>,
    /// Location, if any.
    pub location: Option<String>,
}

impl PickupPolicy {
    /// Decide the slot for a pickup row.
    pub fn resolve<R: Rng>(
        self,
        requested: Option<&PickupRequest>,
        default_location: &str,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> ResolvedPickup {
        if let Some(request) = requested {
            return ResolvedPickup {
                pickup_at: Some(request.pickup_at),
                location: Some(
                    request
                        .location
                        .clone()
                        .unwrap_or_else(|| default_location.to_owned()),
                ),
            };
        }
        match self {
            Self::Unscheduled => ResolvedPickup {
                pickup_at: None,
                location: Some(default_location.to_owned()),
            },
            Self::Randomized => ResolvedPickup {
                pickup_at: random_slot(now, rng),
                location: Some(default_location.to_owned()),
            },
        }
    }
}

fn random_slot<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> Option<DateTime<Utc>> {
    let days = rng.gen_range(RANDOM_PICKUP_MIN_DAYS..=RANDOM_PICKUP_MAX_DAYS);
    let hour = rng.gen_range(RANDOM_PICKUP_FIRST_HOUR..=RANDOM_PICKUP_LAST_HOUR);
    let day = now + Duration::days(days);
    Utc.with_ymd_and_hms(day.year(), day.month(), day.day(), hour, 0, 0)
        .single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 21, 45, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    fn requested_slot_wins_over_policy(now: DateTime<Utc>) {
        let request = PickupRequest {
            pickup_at: now + Duration::days(7),
            location: None,
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let resolved =
            PickupPolicy::Randomized.resolve(Some(&request), "Showroom", now, &mut rng);
        assert_eq!(resolved.pickup_at, Some(request.pickup_at));
        assert_eq!(resolved.location.as_deref(), Some("Showroom"));
    }

    #[rstest]
    fn unscheduled_policy_leaves_slot_empty(now: DateTime<Utc>) {
        let mut rng = SmallRng::seed_from_u64(1);
        let resolved = PickupPolicy::Unscheduled.resolve(None, "Showroom", now, &mut rng);
        assert_eq!(resolved.pickup_at, None);
    }

    #[rstest]
    fn randomized_slots_stay_inside_the_window(now: DateTime<Utc>) {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..200 {
            let resolved = PickupPolicy::Randomized.resolve(None, "Showroom", now, &mut rng);
            let at = resolved.pickup_at.expect("randomised slot");
            let days = (at.date_naive() - now.date_naive()).num_days();
            assert!((RANDOM_PICKUP_MIN_DAYS..=RANDOM_PICKUP_MAX_DAYS).contains(&days));
            assert!((RANDOM_PICKUP_FIRST_HOUR..=RANDOM_PICKUP_LAST_HOUR).contains(&at.hour()));
            assert_eq!(at.minute(), 0);
        }
    }
}
