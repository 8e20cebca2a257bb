use std::fs;
use std::io;
use std::path::PathBuf;

use jsonschema::JSONSchema;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::request::schema::EventSchema;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("can't read event from {source_name}: {error}")]
    Read { source_name: String, error: io::Error },
    #[error("event is not valid JSON: {0}")]
    Decode(serde_json::Error),
    #[error("event fails validation: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("can't deserialise event: {0}")]
    Deserialise(serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSource {
    Path(PathBuf),
    Stdin,
}

impl EventSource {
    fn name(&self) -> String {
        match self {
            EventSource::Path(path) => path.display().to_string(),
            EventSource::Stdin => "stdin".to_string(),
        }
    }
}

pub struct Event {
    pub source: EventSource,
    pub schema: EventSchema,
}

impl Event {
    pub fn read<T: DeserializeOwned>(&self) -> Result<T, EventError> {
        let text = self.read_source()?;
        decode(self.schema, &text)
    }

    fn read_source(&self) -> Result<String, EventError> {
        info!("Reading event from {}", self.source.name());
        let text = match &self.source {
            EventSource::Path(path) => fs::read_to_string(path),
            EventSource::Stdin => io::read_to_string(io::stdin()),
        };
        text.map_err(|error| {
            warn!("Can't read event from {}: {}", self.source.name(), error);
            EventError::Read { source_name: self.source.name(), error }
        })
    }
}

/// Parse, validate, then deserialise one event
pub fn decode<T: DeserializeOwned>(schema: EventSchema, text: &str) -> Result<T, EventError> {
    let json = parse_untyped_json(text)?;

    match validate(&schema.compile(), &json) {
        Ok(_) => {
            info!("Event is valid");
            parse_json(json)
        }
        Err(err) => {
            warn!("Event fails validation");
            Err(err)
        }
    }
}

fn validate(compiled_schema: &JSONSchema, json: &Value) -> Result<(), EventError> {
    info!("Validating event against JSON schema");
    compiled_schema.validate(json).map_err(|errors| {
        let violations = errors
            .map(|error| {
                let path = error.instance_path.to_string();
                if path.is_empty() { error.to_string() } else { format!("{path}: {error}") }
            })
            .collect();
        EventError::Validation(violations)
    })
}

fn parse_json<T: DeserializeOwned>(value: Value) -> Result<T, EventError> {
    info!("Deserialising valid JSON into typed event");
    serde_json::from_value::<T>(value).map_err(EventError::Deserialise)
}

fn parse_untyped_json(text: &str) -> Result<Value, EventError> {
    info!("Parsing JSON into untyped structure");
    serde_json::from_str::<Value>(text).map_err(EventError::Decode)
}
