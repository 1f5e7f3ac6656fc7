pub mod operation;
pub mod schema;
pub mod spec;

pub use operation::{
    HTTP_METHODS, MediaType, Operation, Parameter, ParameterLocation, ParameterOrRef, RequestBody,
    RequestBodyOrRef, Response, ResponseOrRef,
};
pub use schema::{AdditionalProperties, CompositeKind, Schema, SchemaKind, SchemaOrRef, TypeSet};
pub use spec::{CanonicalSpec, Components, Document, Info, Server, SpecVersion};
