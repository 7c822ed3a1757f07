/// Transfer-fee arithmetic for Token-2022 mints
///
/// This crate provides the fee formula shared by every client-side component:
/// basis-point fees capped by a maximum, the inverse "gross-up" calculation,
/// and overflow-checked wide arithmetic used for withheld-fee totals.

pub mod error;
pub mod fee;
pub mod safe;

// Re-export commonly used items
pub use error::*;
pub use fee::*;
pub use safe::*;
