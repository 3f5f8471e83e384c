//! `define_port_error!` builds port error enums with snake_case constructors.

/// Declares a `thiserror` enum plus one constructor per variant.
///
/// Struct variants get a constructor taking `impl Into<_>` per field, so
/// `Connection { message: String }` yields `connection("pool timed out")`.
macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( {
                    $(
                        #[doc = concat!("Failure context: `", stringify!($field), "`.")]
                        $field : $ty
                    ),*
                } )?,
            )*
        }

        impl $name {
            $( define_port_error!(@constructor $variant $( { $($field : $ty),* } )?); )*
        }
    };

    (@constructor $variant:ident) => {
        ::paste::paste! {
            /// Build the unit variant.
            #[must_use]
            pub const fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@constructor $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            /// Build the variant from its fields.
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    define_port_error! {
        pub enum LedgerPortError {
            Offline { message: String } => "ledger offline: {message}",
            Missing { id: i32 } => "ledger row {id} missing",
            Rejected { reason: String, code: u16 } => "ledger rejected ({code}): {reason}",
            Exhausted => "ledger exhausted",
        }
    }

    #[rstest]
    fn string_fields_take_borrowed_input() {
        assert_eq!(
            LedgerPortError::offline("timeout").to_string(),
            "ledger offline: timeout"
        );
    }

    #[rstest]
    fn numeric_fields_keep_their_type() {
        assert_eq!(LedgerPortError::missing(7).to_string(), "ledger row 7 missing");
    }

    #[rstest]
    fn mixed_and_unit_variants_build() {
        assert_eq!(
            LedgerPortError::rejected("limit", 402_u16).to_string(),
            "ledger rejected (402): limit"
        );
        assert_eq!(LedgerPortError::exhausted(), LedgerPortError::Exhausted);
    }
}
