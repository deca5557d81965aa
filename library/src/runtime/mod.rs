pub mod deferred;
pub mod executor;

pub use deferred::{DeferredFire, DeferredQueue};
pub use executor::{Executor, NodeSlot};
