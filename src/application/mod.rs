/// Application layer - source resolution, use cases and DTOs
///
/// Opens sources, drives the analyzers through the outbound ports and
/// picks the format adapters for each request.
pub mod dto;
pub mod factories;
pub mod source;
pub mod use_cases;
