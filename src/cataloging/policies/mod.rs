pub mod license_policy;

pub use license_policy::{LicensePolicy, NONE, NO_ASSERTION};
