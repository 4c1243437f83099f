pub mod keypair;
pub mod signing;

pub use keypair::{verify_webhook_signature, PlatformKeyPair};
pub use signing::{sign, verify, SignatureError};
