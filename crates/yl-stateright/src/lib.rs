//! # yl-stateright
//!
//! Stateright model of the generation retry machine.
//!
//! The model drives the real `yl_core::transition` function, so exhaustive
//! checking covers the same code the generator runs.

pub mod retry_machine;

pub use retry_machine::RetryModel;
