//! Diesel table definitions for the dealership schema.
//!
//! These must match `migrations/` exactly; regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Customer and back-office accounts.
    users (id) {
        id -> Int4,
        full_name -> Text,
        email -> Nullable<Text>,
        phone -> Nullable<Text>,
        /// `customer`, `staff` or `admin`.
        role -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Vehicle catalogue.
    vehicles (id) {
        id -> Int4,
        name -> Text,
        /// Unit price in VND.
        price -> Int8,
        color -> Text,
        /// `available`, `reserved`, `sold_out` or a staff display string.
        status -> Text,
        images -> Array<Text>,
        specs -> Text,
    }
}

diesel::table! {
    deposits (id) {
        id -> Int4,
        customer_id -> Int4,
        /// First reserved vehicle.
        vehicle_id -> Nullable<Int4>,
        amount -> Int8,
        status -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Unique on `(deposit_id, vehicle_id)`; `deposit_id` is nulled when the
    /// deposit is cancelled.
    deposit_line_items (id) {
        id -> Int4,
        deposit_id -> Nullable<Int4>,
        vehicle_id -> Int4,
        quantity -> Int4,
        unit_price -> Int8,
    }
}

diesel::table! {
    pickup_schedules (id) {
        id -> Int4,
        deposit_id -> Int4,
        vehicle_id -> Int4,
        customer_id -> Int4,
        /// Null until staff book a slot.
        pickup_at -> Nullable<Timestamptz>,
        location -> Nullable<Text>,
    }
}

diesel::table! {
    /// Payments outlive their deposit so a gateway reference is never
    /// processed twice.
    payments (id) {
        id -> Int4,
        deposit_id -> Nullable<Int4>,
        amount -> Int8,
        method -> Text,
        status -> Text,
        /// Unique gateway intent id.
        gateway_reference -> Nullable<Text>,
        paid_at -> Timestamptz,
    }
}

diesel::table! {
    notifications (id) {
        id -> Int4,
        user_id -> Int4,
        kind -> Text,
        message -> Text,
        is_read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(deposits -> users (customer_id));
diesel::joinable!(deposits -> vehicles (vehicle_id));
diesel::joinable!(deposit_line_items -> deposits (deposit_id));
diesel::joinable!(deposit_line_items -> vehicles (vehicle_id));
diesel::joinable!(pickup_schedules -> deposits (deposit_id));
diesel::joinable!(payments -> deposits (deposit_id));
diesel::joinable!(notifications -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    vehicles,
    deposits,
    deposit_line_items,
    pickup_schedules,
    payments,
    notifications,
);
