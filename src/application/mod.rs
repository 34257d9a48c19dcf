//! Application layer: the payout ledger state machine and the payment
//! orchestrator that drives it from order-paid notifications.

pub mod ledger;
pub mod orchestrator;
