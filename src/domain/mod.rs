// Domain layer: the counting record and the ports the worker talks through.

pub mod model;
pub mod ports;
