/// Package analyzers for the ecosystems cataloged out of the box
mod control_file;
mod dpkg;
mod python;

pub use dpkg::DpkgAnalyzer;
pub use python::PythonPackageAnalyzer;
