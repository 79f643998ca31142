//! Type-specific request payloads and their schemas.
//!
//! Each [`RequestType`] owns one payload struct. Untyped input from a form or
//! API is turned into a payload with [`SpecificAttributes::from_json`], and
//! every payload is checked by [`SpecificAttributes::validate`] before a
//! request is created or edited.

use super::{AttributeError, DocumentId, RequestType, ValidationRequestDomainError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Proposed replacement for the development description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionChangeAttributes {
    /// Description the officer proposes.
    pub proposed_description: String,
    /// Description at the time the request was raised.
    pub previous_description: String,
}

/// Request for a document the applicant has not supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalDocumentAttributes {
    /// Kind of document requested, e.g. `floor_plan`.
    pub document_request_type: String,
}

/// Request to replace an unsuitable document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementDocumentAttributes {
    /// Kind of document requested.
    pub document_request_type: String,
    /// Document being replaced.
    pub old_document_id: DocumentId,
}

/// Proposed red line boundary, as GeoJSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryChangeAttributes {
    /// Boundary the officer proposes.
    pub new_geojson: Value,
    /// Boundary submitted by the applicant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_geojson: Option<Value>,
}

/// Correction to the application fee.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeChangeAttributes {
    /// Fee the officer believes is due, in pence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_fee_pence: Option<u64>,
}

/// Typed attribute payload keyed by request type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request_type", rename_all = "snake_case")]
pub enum SpecificAttributes {
    /// Payload for [`RequestType::DescriptionChange`].
    DescriptionChange(DescriptionChangeAttributes),
    /// Payload for [`RequestType::AdditionalDocument`].
    AdditionalDocument(AdditionalDocumentAttributes),
    /// Payload for [`RequestType::ReplacementDocument`].
    ReplacementDocument(ReplacementDocumentAttributes),
    /// Payload for [`RequestType::RedLineBoundaryChange`].
    RedLineBoundaryChange(BoundaryChangeAttributes),
    /// Payload for [`RequestType::FeeChange`].
    FeeChange(FeeChangeAttributes),
    /// [`RequestType::OtherChange`] carries no attributes.
    OtherChange,
}

impl SpecificAttributes {
    /// Returns the request type this payload belongs to.
    #[must_use]
    pub const fn request_type(&self) -> RequestType {
        match self {
            Self::DescriptionChange(_) => RequestType::DescriptionChange,
            Self::AdditionalDocument(_) => RequestType::AdditionalDocument,
            Self::ReplacementDocument(_) => RequestType::ReplacementDocument,
            Self::RedLineBoundaryChange(_) => RequestType::RedLineBoundaryChange,
            Self::FeeChange(_) => RequestType::FeeChange,
            Self::OtherChange => RequestType::OtherChange,
        }
    }

    /// Parses an untyped attribute bag for `request_type`.
    ///
    /// A `null` bag is treated as an empty object. Unknown keys are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRequestDomainError::SchemaValidation`] when the bag
    /// is not an object, carries a conflicting `request_type`, or does not
    /// deserialize into the type's payload.
    pub fn from_json(
        request_type: RequestType,
        bag: Value,
    ) -> Result<Self, ValidationRequestDomainError> {
        let mut object = match bag {
            Value::Object(object) => object,
            Value::Null => serde_json::Map::new(),
            _ => {
                return Err(schema_error(
                    request_type,
                    AttributeError::new("specific_attributes", "must be a JSON object"),
                ));
            }
        };

        let conflicting_tag = object
            .get("request_type")
            .is_some_and(|declared| declared.as_str() != Some(request_type.as_str()));
        if conflicting_tag {
            return Err(schema_error(
                request_type,
                AttributeError::new("request_type", "does not match the request type"),
            ));
        }

        let parsed = match request_type {
            RequestType::DescriptionChange => {
                strict_payload::<DescriptionChangeAttributes>(request_type, &object, &[
                    "proposed_description",
                    "previous_description",
                ])
                .map(Self::DescriptionChange)
            }
            RequestType::AdditionalDocument => {
                strict_payload::<AdditionalDocumentAttributes>(request_type, &object, &[
                    "document_request_type",
                ])
                .map(Self::AdditionalDocument)
            }
            RequestType::ReplacementDocument => {
                strict_payload::<ReplacementDocumentAttributes>(request_type, &object, &[
                    "document_request_type",
                    "old_document_id",
                ])
                .map(Self::ReplacementDocument)
            }
            RequestType::RedLineBoundaryChange => {
                strict_payload::<BoundaryChangeAttributes>(request_type, &object, &[
                    "new_geojson",
                    "original_geojson",
                ])
                .map(Self::RedLineBoundaryChange)
            }
            RequestType::FeeChange => {
                strict_payload::<FeeChangeAttributes>(request_type, &object, &[
                    "proposed_fee_pence",
                ])
                .map(Self::FeeChange)
            }
            RequestType::OtherChange => {
                object.remove("request_type");
                if object.is_empty() {
                    Ok(Self::OtherChange)
                } else {
                    Err(unknown_keys_error(request_type, &object, &[]))
                }
            }
        }?;

        parsed.validate(usize::MAX)?;
        Ok(parsed)
    }

    /// Checks the payload against its type's field rules.
    ///
    /// All failing fields are reported together.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRequestDomainError::SchemaValidation`] listing each
    /// failing field.
    pub fn validate(&self, max_text_length: usize) -> Result<(), ValidationRequestDomainError> {
        let mut errors = Vec::new();
        match self {
            Self::DescriptionChange(attrs) => {
                check_text(
                    &mut errors,
                    "proposed_description",
                    &attrs.proposed_description,
                    max_text_length,
                );
                if attrs.previous_description.chars().count() > max_text_length {
                    errors.push(too_long("previous_description", max_text_length));
                }
                if attrs.proposed_description.trim() == attrs.previous_description.trim() {
                    errors.push(AttributeError::new(
                        "proposed_description",
                        "must differ from the previous description",
                    ));
                }
            }
            Self::AdditionalDocument(attrs) => {
                check_text(
                    &mut errors,
                    "document_request_type",
                    &attrs.document_request_type,
                    max_text_length,
                );
            }
            Self::ReplacementDocument(attrs) => {
                check_text(
                    &mut errors,
                    "document_request_type",
                    &attrs.document_request_type,
                    max_text_length,
                );
            }
            Self::RedLineBoundaryChange(attrs) => {
                check_geojson(&mut errors, "new_geojson", &attrs.new_geojson);
                if let Some(original) = &attrs.original_geojson {
                    check_geojson(&mut errors, "original_geojson", original);
                }
            }
            Self::FeeChange(attrs) => {
                if attrs.proposed_fee_pence == Some(0) {
                    errors.push(AttributeError::new(
                        "proposed_fee_pence",
                        "must be greater than zero",
                    ));
                }
            }
            Self::OtherChange => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationRequestDomainError::SchemaValidation {
                request_type: self.request_type(),
                errors,
            })
        }
    }
}

fn strict_payload<T>(
    request_type: RequestType,
    object: &serde_json::Map<String, Value>,
    allowed: &[&str],
) -> Result<T, ValidationRequestDomainError>
where
    T: serde::de::DeserializeOwned,
{
    let mut fields = object.clone();
    fields.remove("request_type");
    if fields.keys().any(|key| !allowed.contains(&key.as_str())) {
        return Err(unknown_keys_error(request_type, &fields, allowed));
    }
    serde_json::from_value(Value::Object(fields)).map_err(|err| {
        schema_error(
            request_type,
            AttributeError::new("specific_attributes", err.to_string()),
        )
    })
}

fn unknown_keys_error(
    request_type: RequestType,
    object: &serde_json::Map<String, Value>,
    allowed: &[&str],
) -> ValidationRequestDomainError {
    let errors = object
        .keys()
        .filter(|key| key.as_str() != "request_type" && !allowed.contains(&key.as_str()))
        .map(|key| {
            AttributeError::new(
                "specific_attributes",
                format!("unknown key '{key}' for {request_type}"),
            )
        })
        .collect();
    ValidationRequestDomainError::SchemaValidation {
        request_type,
        errors,
    }
}

fn schema_error(request_type: RequestType, error: AttributeError) -> ValidationRequestDomainError {
    ValidationRequestDomainError::SchemaValidation {
        request_type,
        errors: vec![error],
    }
}

fn check_text(
    errors: &mut Vec<AttributeError>,
    field: &'static str,
    value: &str,
    max_text_length: usize,
) {
    if value.trim().is_empty() {
        errors.push(AttributeError::new(field, "must not be empty"));
    } else if value.chars().count() > max_text_length {
        errors.push(too_long(field, max_text_length));
    }
}

fn too_long(field: &'static str, max_text_length: usize) -> AttributeError {
    AttributeError::new(field, format!("exceeds {max_text_length} characters"))
}

fn check_geojson(errors: &mut Vec<AttributeError>, field: &'static str, value: &Value) {
    let has_type = value
        .as_object()
        .and_then(|object| object.get("type"))
        .and_then(Value::as_str)
        .is_some_and(|kind| !kind.is_empty());
    if !has_type {
        errors.push(AttributeError::new(
            field,
            "must be a GeoJSON object with a 'type' member",
        ));
    }
}
