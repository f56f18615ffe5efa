pub mod cancel;
pub mod core;
pub mod error;
