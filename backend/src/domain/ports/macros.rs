//! Helper macro for port error enums.
//!
//! Each variant gets a snake_case constructor accepting `impl Into<T>` for
//! every field, so adapters can write `SwapRepositoryError::query(err.to_string())`.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
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
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use crate::domain::ShiftId;

    define_port_error! {
        pub enum ExamplePortError {
            Locked { message: String } => "locked: {message}",
            Stale { shift_id: ShiftId } => "stale shift {shift_id}",
            Retry { message: String, attempts: u32 } => "{message} after {attempts} attempts",
        }
    }

    #[test]
    fn string_fields_accept_str() {
        assert_eq!(ExamplePortError::locked("row").to_string(), "locked: row");
    }

    #[test]
    fn typed_fields_keep_their_type() {
        let shift_id = ShiftId::random();
        let err = ExamplePortError::stale(shift_id);
        assert_eq!(err, ExamplePortError::Stale { shift_id });
    }

    #[test]
    fn mixed_fields_render_in_order() {
        let err = ExamplePortError::retry("timeout", 3_u32);
        assert_eq!(err.to_string(), "timeout after 3 attempts");
    }
}
