// Domain layer - Core models with no external dependencies
pub mod entity;
pub mod telemetry;
pub mod view_model;
