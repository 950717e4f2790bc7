// Domain layer: the tolerance table model and the ports the pipeline is built on.

pub mod model;
pub mod ports;
