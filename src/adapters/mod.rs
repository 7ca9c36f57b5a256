/// Adapters layer - Infrastructure implementations
///
/// This layer contains concrete implementations of the outbound ports,
/// providing the actual integration with filesystems, image archives and
/// document formats.
pub mod outbound;
