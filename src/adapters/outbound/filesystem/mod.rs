/// Filesystem adapters: directory sources and document output
mod directory_resolver;
mod file_writer;

pub use directory_resolver::DirectoryResolver;
pub use file_writer::{FileSystemWriter, StdoutPresenter};
