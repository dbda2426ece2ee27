// Domain layer: core models and ports (interfaces) for the enrollment feeds.

pub mod model;
pub mod ports;
