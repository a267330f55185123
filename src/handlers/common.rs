use crate::errors::{FieldErrors, ServiceError};
use validator::{Validate, ValidationErrors};

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|e| ServiceError::ValidationError(format!("Validation failed: {}", e)))
}

/// Flattens validator output into `prefix.field` keys, merging into `errors`.
///
/// Messages are phrased as full sentences naming the dotted field, e.g.
/// `The origin.lat field must be between -90 and 90.`
pub fn collect_field_errors(prefix: &str, source: &ValidationErrors, errors: &mut FieldErrors) {
    for (field, failures) in source.field_errors() {
        let key = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        let messages = errors.entry(key.clone()).or_default();
        for failure in failures {
            let detail = failure
                .message
                .as_deref()
                .map(str::to_string)
                .unwrap_or_else(|| failure.code.to_string());
            messages.push(format!("The {} field {}.", key, detail));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    #[test]
    fn field_errors_are_prefixed() {
        let source = Coordinate::new(91.0, 0.0).validate().unwrap_err();
        let mut errors = FieldErrors::new();
        collect_field_errors("origin", &source, &mut errors);

        assert_eq!(
            errors.get("origin.lat"),
            Some(&vec![
                "The origin.lat field must be between -90 and 90.".to_string()
            ])
        );
        assert!(!errors.contains_key("origin.lng"));
    }

    #[test]
    fn validate_input_wraps_errors() {
        let err = validate_input(&Coordinate::new(0.0, 500.0)).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(ref msg) if msg.contains("lng")));
    }
}
