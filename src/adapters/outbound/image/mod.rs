/// Container image adapters: archive loading and layer-aware resolvers
mod all_layers_resolver;
pub(crate) mod docker_archive;
mod file_tree;
mod squashed_resolver;

pub use all_layers_resolver::AllLayersResolver;
pub use docker_archive::DockerArchiveProvider;
pub use squashed_resolver::SquashedResolver;
