// Request/response contracts and caller-side policies
pub mod forecast;

// Feature engineering and model artifacts
pub mod ml;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
