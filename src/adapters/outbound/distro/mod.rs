/// Linux distribution detection
mod os_release;

pub use os_release::OsReleaseDetector;
