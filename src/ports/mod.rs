/// Ports for the cataloging core
///
/// Inbound ports are what the CLI drives (cataloging, conversion).
/// Outbound ports are what the core needs from infrastructure: file
/// access, analyzers, image providers, document formats and console output.
pub mod inbound;
pub mod outbound;
