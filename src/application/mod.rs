//! Application layer: the checkout sequencer and the inquiry desk.
//!
//! `CheckoutSequencer` is the single owner of an order in progress. It talks
//! to the outside world only through the `Notifier` port.

pub mod checkout;
pub mod inquiry;
