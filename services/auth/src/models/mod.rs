//! Authentication models

pub mod principal;
pub mod role;

// Re-export for convenience
pub use principal::Principal;
pub use role::Role;
