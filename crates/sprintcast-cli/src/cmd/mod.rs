pub mod analyze;
pub mod forecast;
pub mod scenario;
