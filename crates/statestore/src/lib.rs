//! State driver abstraction
//!
//! Persistence seam for the netpool allocation engine. State records are
//! serialized by their owners and handed to a [`StateDriver`] as raw bytes
//! under hierarchical string keys (`/netpool/config/global/<tenant>`), so
//! any ordered key/value backend (etcd, consul, a file tree) can implement
//! the trait without knowing the record types.
//!
//! The crate ships one implementation: [`MemStateDriver`], an in-memory
//! driver behind the `test-util` feature, used by unit tests the same way
//! a mock client stands in for a real API.

pub mod driver;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use driver::StateDriver;
pub use error::StoreError;
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemStateDriver;
