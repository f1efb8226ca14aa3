mod encryption;
mod token_vault;

pub use encryption::{EncryptionError, EncryptionService};
pub use token_vault::TokenVault;
