/// Use cases module containing application business logic orchestration
mod catalog_source;
mod convert_document;

pub use catalog_source::CatalogSourceUseCase;
pub use convert_document::ConvertDocumentUseCase;
