// Domain layer: config values and the ports the wrapper talks through.

pub mod model;
pub mod ports;
