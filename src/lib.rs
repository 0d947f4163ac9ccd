//! Trellis
//!
//! Trellis is a shopping-cart pricing engine: it evaluates a catalogue of
//! scheduled, targeted promotions against a cart and applies the allocation
//! that maximises the customer's total savings.

pub mod cart;
pub mod catalog;
pub mod engine;
pub mod prelude;
pub mod pricing;
pub mod promotions;
pub mod receipt;
