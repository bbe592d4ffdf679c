// # DNS Provider Implementations
//
// Provider implementations that live in the core crate. Real providers live in
// their own crates (e.g. `dns01-provider-luadns`).

pub mod memory;

pub use memory::MemoryDnsProvider;
