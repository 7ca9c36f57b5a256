/// Crate-wide result type; domain failures travel as `CatalogerError`
/// inside the `anyhow::Error` and can be recovered with `downcast_ref`.
pub type Result<T> = std::result::Result<T, anyhow::Error>;
