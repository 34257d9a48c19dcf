//! Domain layer: value objects, the payout state machine, and the pure
//! split-payment calculator. Nothing in this module performs IO.

pub mod money;
pub mod order;
pub mod payout;
pub mod ports;
pub mod rates;
pub mod split;
