pub mod error;
pub mod index;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod records;
pub mod resolve;
pub mod service;

pub use error::{LoadError, NormalizeError, QueryError, ResolveError};
pub use loader::{DocumentLoader, DocumentSource};
pub use model::Document;
pub use service::QueryService;
