//! Form/transform collaborator seam
//!
//! The visual form layer owns the event-specific form definitions; the engine
//! only needs two translations from it: raw server payload → local `data`
//! shape when hydrating a download, and `data` → the display-field fragment
//! pushed back into workqueue entries.

use crate::types::{DeclarationData, Event};
use thiserror::Error;

/// Transformation failure
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Local view of a downloaded server payload
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedCase {
    pub data: DeclarationData,
    pub registration_status: Option<String>,
    pub duplicates: Vec<String>,
}

/// Display subset of a declaration, used to refresh workqueue entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayFields {
    pub name: Option<String>,
    pub date_of_event: Option<String>,
    pub contact_number: Option<String>,
}

/// Event-aware translation between server payloads and the local data shape
pub trait FormTransformer: Send + Sync {
    /// Build the local `data` shape from a raw fetch payload, extracting the
    /// server-reported registration status and duplicate-id list
    fn to_local(
        &self,
        event: Event,
        payload: &serde_json::Value,
    ) -> Result<TransformedCase, TransformError>;

    /// Project the display fields out of locally authoritative data
    fn display_fields(&self, event: Event, data: &DeclarationData) -> DisplayFields;
}

/// Transformer for payloads already in the local section/field shape
///
/// Expects `{ "data": {..sections..}, "registration_status": .., "duplicates": [..] }`.
/// Real deployments plug in a country-config-aware implementation; this one
/// covers tests and passthrough gateways.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTransformer;

impl PassthroughTransformer {
    fn subject_section(event: Event) -> &'static str {
        match event {
            Event::Birth => "child",
            Event::Death => "deceased",
            Event::Marriage => "couple",
        }
    }

    fn date_field(event: Event) -> &'static str {
        match event {
            Event::Birth => "birth_date",
            Event::Death => "death_date",
            Event::Marriage => "marriage_date",
        }
    }
}

impl FormTransformer for PassthroughTransformer {
    fn to_local(
        &self,
        _event: Event,
        payload: &serde_json::Value,
    ) -> Result<TransformedCase, TransformError> {
        let data = match payload.get("data") {
            Some(raw) => serde_json::from_value(raw.clone())
                .map_err(|e| TransformError::MalformedPayload(e.to_string()))?,
            None => {
                return Err(TransformError::MalformedPayload(
                    "payload has no data field".into(),
                ))
            }
        };

        let registration_status = payload
            .get("registration_status")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let duplicates = payload
            .get("duplicates")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Ok(TransformedCase {
            data,
            registration_status,
            duplicates,
        })
    }

    fn display_fields(&self, event: Event, data: &DeclarationData) -> DisplayFields {
        let subject = data.get(Self::subject_section(event));

        let name = subject.and_then(|section| {
            let first = section.get("first_name").and_then(|v| v.as_str());
            let family = section.get("family_name").and_then(|v| v.as_str());
            match (first, family) {
                (Some(f), Some(l)) => Some(format!("{f} {l}")),
                (Some(f), None) => Some(f.to_string()),
                (None, Some(l)) => Some(l.to_string()),
                (None, None) => None,
            }
        });

        let date_of_event = subject
            .and_then(|section| section.get(Self::date_field(event)))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let contact_number = data
            .get("informant")
            .and_then(|section| section.get("contact_number"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        DisplayFields {
            name,
            date_of_event,
            contact_number,
        }
    }
}
