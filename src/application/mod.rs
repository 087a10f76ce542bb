pub mod dunning;
pub mod emails;
pub mod webhook;
