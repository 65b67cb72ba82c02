//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod currency;
pub mod log;
pub mod pricing;

// Re-export main types for cleaner imports
pub use currency::{Currency, RateProvider, RateStatus, RateTable};
pub use pricing::{CalculationMode, InputError, PricingInput, PricingResult, PricingTarget};
