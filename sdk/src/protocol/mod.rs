pub mod fees;
pub mod layout;
pub mod ledger;

pub use fees::*;
pub use layout::*;
pub use ledger::*;
