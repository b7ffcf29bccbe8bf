// Domain layer: election records, output schema and the ports the pipeline talks through.

pub mod model;
pub mod ports;
