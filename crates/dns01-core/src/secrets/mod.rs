// # Secret Store Implementations
//
// This module provides implementations of the SecretStore trait that need no
// cluster connectivity. The Kubernetes API store lives in `dns01-secret-kube`.

pub mod file;
pub mod memory;

pub use file::FileSecretStore;
pub use memory::MemorySecretStore;
