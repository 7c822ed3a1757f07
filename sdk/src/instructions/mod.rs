/// Instruction builders for the Token-2022 transfer-fee lifecycle
pub mod mint;
pub mod token;
pub mod withheld;

pub use mint::*;
pub use token::*;
pub use withheld::*;
