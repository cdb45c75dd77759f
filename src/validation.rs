use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::ApiError;
use crate::schemas::FieldError;

/// Validates `value`, turning failures into a 422 with one entry per
/// rejected field.
pub fn validate_request<T: Validate>(value: &T) -> Result<(), ApiError> {
    validate_request_with(value, |_, _| {})
}

/// Like [`validate_request`], with `extra` adding rules that span several
/// fields.
pub fn validate_request_with<T, F>(value: &T, extra: F) -> Result<(), ApiError>
where
    T: Validate,
    F: FnOnce(&T, &mut ValidationErrors),
{
    let mut errors = value.validate().err().unwrap_or_else(ValidationErrors::new);
    extra(value, &mut errors);
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(field_errors(&errors)))
    }
}

pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut details: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .clone()
                    .unwrap_or_else(|| Cow::Owned(error.code.to_string()));
                FieldError::new(&field, message)
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

pub fn rule_violation(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Accepts ISBN-10 and ISBN-13 numbers, hyphens and spaces allowed, and
/// verifies their check digit.
pub fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    let compact: Vec<char> = isbn.chars().filter(|c| *c != '-' && *c != ' ').collect();
    let valid = match compact.len() {
        10 => isbn10_checksum(&compact),
        13 => isbn13_checksum(&compact),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(rule_violation("isbn", "this value is not a valid ISBN-10 or ISBN-13"))
    }
}

fn isbn10_checksum(digits: &[char]) -> bool {
    let mut sum = 0;
    for (position, c) in digits.iter().enumerate() {
        let value = match (c.to_digit(10), position) {
            (Some(d), _) => d,
            (None, 9) if *c == 'X' || *c == 'x' => 10,
            _ => return false,
        };
        sum += value * (10 - position as u32);
    }
    sum % 11 == 0
}

fn isbn13_checksum(digits: &[char]) -> bool {
    let mut sum = 0;
    for (position, c) in digits.iter().enumerate() {
        let Some(d) = c.to_digit(10) else {
            return false;
        };
        sum += if position % 2 == 0 { d } else { d * 3 };
    }
    sum % 10 == 0
}

/// Checks a value against a closed list of words.
pub fn one_of(value: &str, allowed: &[&str]) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        let mut error = ValidationError::new("choice");
        error.message = Some(Cow::Owned(format!(
            "must be one of: {}",
            allowed.join(", ")
        )));
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn valid_isbns() {
        assert!(validate_isbn("978-2-07-036002-4").is_ok());
        assert!(validate_isbn("9782070360024").is_ok());
        assert!(validate_isbn("2-07-036002-4").is_ok());
        assert!(validate_isbn("080442957X").is_ok());
    }

    #[test]
    fn invalid_isbns() {
        assert!(validate_isbn("9782070360025").is_err());
        assert!(validate_isbn("2070360025").is_err());
        assert!(validate_isbn("97820703600").is_err());
        assert!(validate_isbn("X804429575").is_err());
        assert!(validate_isbn("").is_err());
    }

    #[test]
    fn one_of_lists_choices() {
        assert!(one_of("b", &["a", "b"]).is_ok());
        let error = one_of("c", &["a", "b"]).unwrap_err();
        assert_eq!(error.message.unwrap(), "must be one of: a, b");
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "too short"))]
        name: String,
        #[validate(range(min = 1))]
        count: i32,
    }

    #[test]
    fn field_errors_are_sorted_and_described() {
        let sample = Sample {
            name: "ab".to_string(),
            count: 0,
        };
        let details = match validate_request(&sample) {
            Err(ApiError::Validation(details)) => details,
            other => panic!("expected validation error, got {other:?}"),
        };

        assert_eq!(details.len(), 2);
        assert_eq!(details[0].field, "count");
        assert_eq!(details[0].message, "range");
        assert_eq!(details[1], FieldError::new("name", "too short"));
    }
}
