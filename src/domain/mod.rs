//! Domain layer: the `Payment` entity, its status state machine and the
//! storage port the application layer depends on.

pub mod payment;
pub mod ports;
