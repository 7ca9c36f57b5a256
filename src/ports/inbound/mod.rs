/// Inbound ports (Driving ports) - Use case interfaces
///
/// These ports define the interfaces that external adapters (e.g., CLI)
/// use to interact with the application core.
pub mod cataloging_port;
pub mod conversion_port;

pub use cataloging_port::CatalogingPort;
pub use conversion_port::ConversionPort;
