pub mod action;
pub mod order;
pub mod policy;
pub mod ports;
pub mod transition;
