//! Helper macro generating port error enums with snake_case constructors.

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
    //! Constructor coverage using the shapes portal adapters report.
    define_port_error! {
        pub enum EnrolmentError {
            Connection { message: String } => "enrolment store connection failed: {message}",
            CourseFull { code: String } => "course {code} is full",
            OverCredit { code: String, credits: u8 } => "{code} exceeds the limit by {credits} credits",
            AlreadyRegistered => "already registered for this term",
        }
    }

    #[test]
    fn string_fields_accept_str() {
        assert_eq!(
            EnrolmentError::connection("pool timed out").to_string(),
            "enrolment store connection failed: pool timed out"
        );
        assert_eq!(
            EnrolmentError::course_full("CS201"),
            EnrolmentError::CourseFull {
                code: "CS201".to_owned()
            }
        );
    }

    #[test]
    fn mixed_fields_keep_their_types() {
        assert_eq!(
            EnrolmentError::over_credit("MATH201", 3_u8).to_string(),
            "MATH201 exceeds the limit by 3 credits"
        );
    }

    #[test]
    fn unit_variants_get_snake_case_constructors() {
        assert_eq!(
            EnrolmentError::already_registered(),
            EnrolmentError::AlreadyRegistered
        );
    }
}
