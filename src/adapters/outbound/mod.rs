/// Outbound adapters - Infrastructure implementations of outbound ports
pub mod analyzers;
pub mod console;
pub mod distro;
pub mod filesystem;
pub mod formats;
pub mod image;
