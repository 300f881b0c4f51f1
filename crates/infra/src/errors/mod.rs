//! Infrastructure error plumbing
//!
//! External library errors are converted into [`levelset_domain::LevelsetError`]
//! through the [`InfraError`] newtype so the mapping stays on this side of the
//! domain boundary.

mod conversions;

pub use conversions::InfraError;
