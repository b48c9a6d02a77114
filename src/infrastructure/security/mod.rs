pub mod credentials;
pub mod keyring;

pub use credentials::{
    resolve_api_key, CredentialStore, KeyringCredentialStore, MemoryCredentialStore,
};
