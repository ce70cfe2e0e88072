// Presentation layer - view-model consumers
pub mod console;
pub mod status_filter;
