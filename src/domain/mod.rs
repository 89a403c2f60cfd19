//! Domain model: catalog, money, cart, customer details, orders and the
//! notifier port.

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod inquiry;
pub mod money;
pub mod order;
pub mod payment;
pub mod ports;
