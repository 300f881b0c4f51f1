//! Macro for implementing Display and FromStr for string-like enums
//!
//! Configuration enums such as [`crate::LogFormat`] are read from files,
//! environment variables and CLI flags. This macro gives them one textual
//! form for all three.
//!
//! # Example
//!
//! ```rust
//! use levelset_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Phase {
//!     Pending,
//!     Running,
//! }
//!
//! impl_domain_enum_conversions!(Phase {
//!     Pending => "pending",
//!     Running => "running",
//! });
//!
//! assert_eq!("RUNNING".parse::<Phase>().unwrap(), Phase::Running);
//! assert_eq!(Phase::Pending.to_string(), "pending");
//! ```

/// Implements Display and case-insensitive FromStr for an enum
///
/// `FromStr::Err` is a `String` naming the enum and the rejected input.
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
