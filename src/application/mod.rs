// Application layer - Use cases and orchestration
pub mod aggregator;
pub mod history_repository;
pub mod resolver;
pub mod session;
