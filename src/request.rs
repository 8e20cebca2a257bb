//! Reading handler events
//!
//! Every event is parsed as untyped JSON, validated against the handler's bundled schema, then
//! deserialised into the handler's typed input.

/// Event sources and the parse, validate, deserialise flow
pub mod event;
/// Bundled JSON schemas, one per handler
pub mod schema;

pub use event::{decode, Event, EventError, EventSource};
pub use schema::EventSchema;
