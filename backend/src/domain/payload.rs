//! Per-service payload schemas.
//!
//! Payloads are free-form JSON objects; each service type pins down the
//! fields it requires. Unknown keys are allowed and survive resubmission
//! merges untouched.

use serde_json::{json, Map, Value};

use super::application::ServiceType;
use super::error::DomainError;

/// Service-specific application fields.
pub type Payload = Map<String, Value>;

struct FieldRule {
    name: &'static str,
    min_chars: usize,
}

/// Required fields for an id-renewal request.
const ID_RENEWAL_FIELDS: [FieldRule; 5] = [
    FieldRule {
        name: "firstName",
        min_chars: 1,
    },
    FieldRule {
        name: "lastName",
        min_chars: 1,
    },
    FieldRule {
        name: "dateOfBirth",
        min_chars: 1,
    },
    FieldRule {
        name: "idNumber",
        min_chars: 5,
    },
    FieldRule {
        name: "address",
        min_chars: 5,
    },
];

/// Validate a payload against the schema for `service_type`.
///
/// All offending fields are reported at once in the error details.
pub fn validate(service_type: ServiceType, payload: &Payload) -> Result<(), DomainError> {
    let rules = match service_type {
        ServiceType::IdRenewal => &ID_RENEWAL_FIELDS,
    };

    let invalid: Vec<&str> = rules
        .iter()
        .filter(|rule| !satisfies(payload.get(rule.name), rule.min_chars))
        .map(|rule| rule.name)
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(DomainError::invalid_request(format!(
            "payload failed validation for service type {service_type}"
        ))
        .with_details(json!({ "fields": invalid })))
    }
}

fn satisfies(value: Option<&Value>, min_chars: usize) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|text| text.chars().count() >= min_chars)
}

/// Shallow-merge `patch` into `payload`: patch keys overwrite, all other
/// keys are preserved.
pub fn merge(payload: &mut Payload, patch: Payload) {
    for (key, value) in patch {
        payload.insert(key, value);
    }
}
