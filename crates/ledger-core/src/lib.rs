pub mod account;
pub mod constants;
pub mod error;
pub mod escrow;
pub mod provider;
pub mod qr;
pub mod transaction;
pub mod types;

pub use account::*;
pub use constants::*;
pub use error::LedgerError;
pub use escrow::*;
pub use provider::*;
pub use qr::*;
pub use transaction::*;
pub use types::*;
