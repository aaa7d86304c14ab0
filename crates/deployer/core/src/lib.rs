pub mod result;
pub mod tracer;
