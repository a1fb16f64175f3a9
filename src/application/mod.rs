// Startup wiring (load-or-default)
pub mod bootstrap;

// Prediction engine
pub mod ml;

// Request-facing service shared by handlers
pub mod forecast_service;
