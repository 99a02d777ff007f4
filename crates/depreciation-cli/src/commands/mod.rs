pub mod batch;
pub mod improvement;
pub mod method;
pub mod schedule;
