//! Request validation.
//!
//! Every payload arrives as a loosely typed request struct (all `Option<String>`) and is
//! turned into a sanitized value by a [`Validate`] implementation. Problems are collected
//! per field rather than stopping at the first one, so a client sees every mistake in a
//! single 400 response.

use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::models::{
    AddressFields, AddressUpdate, ContactFields, ContactFilter, ContactUpdate,
    CreateAddressRequest, CreateContactRequest, Credentials, LoginUserRequest, NewUser,
    RegisterUserRequest, SearchContactRequest, UpdateAddressRequest, UpdateContactRequest,
    UpdateUserRequest, UserChanges,
};

/// A single offending field and what is wrong with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// ValidationError
///
/// Raised when client input does not satisfy a schema. Recoverable by the caller
/// correcting the input; mapped to HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_messages(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError {
                field: field.to_string(),
                message: message.into(),
            }],
        }
    }

    /// True when `field` is among the offending fields.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

impl From<JsonRejection> for ValidationError {
    fn from(rejection: JsonRejection) -> Self {
        Self::single("body", rejection.body_text())
    }
}

fn join_messages(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.message.as_str())
        .collect::<Vec<_>>()
        .join(". ")
}

/// Schema contract: consume a raw request and produce its sanitized form.
pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, ValidationError>;
}

/// A body that failed to deserialize validates to its rejection. Lets a service run its
/// ownership checks before reporting anything about the payload's shape.
impl<T: Validate> Validate for Result<T, ValidationError> {
    type Output = T::Output;

    fn validate(self) -> Result<T::Output, ValidationError> {
        self?.validate()
    }
}

/// Validates `input` against its schema.
pub fn validate<T: Validate>(input: T) -> Result<T::Output, ValidationError> {
    input.validate()
}

/// Validates a resource id taken from a path segment or payload.
///
/// Ids must be present, integral and strictly positive.
pub fn validate_id(field: &str, raw: &str) -> Result<i64, ValidationError> {
    let mut v = Validator::default();
    let id = v.id(field, raw);
    v.finish(id)
}

/// Accumulates field errors while a schema is being checked.
///
/// Each check returns a placeholder when it fails so the caller can keep building the
/// output value; [`Validator::finish`] discards it if anything was recorded.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    fn push(&mut self, field: &str, message: String) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message,
        });
    }

    /// A non-empty string of at most `max` characters that must be present.
    pub fn required_text(&mut self, field: &str, value: Option<String>, max: usize) -> String {
        match value {
            Some(value) => self.text(field, value, max).unwrap_or_default(),
            None => {
                self.push(field, format!("\"{field}\" is required"));
                String::new()
            }
        }
    }

    /// Like `required_text`, but absence is allowed.
    pub fn optional_text(
        &mut self,
        field: &str,
        value: Option<String>,
        max: usize,
    ) -> Option<String> {
        value.and_then(|value| self.text(field, value, max))
    }

    /// An optional string that must look like an email address.
    pub fn optional_email(
        &mut self,
        field: &str,
        value: Option<String>,
        max: usize,
    ) -> Option<String> {
        let value = self.optional_text(field, value, max)?;
        if is_email(&value) {
            Some(value)
        } else {
            self.push(field, format!("\"{field}\" must be a valid email"));
            None
        }
    }

    fn text(&mut self, field: &str, value: String, max: usize) -> Option<String> {
        if value.is_empty() {
            self.push(field, format!("\"{field}\" is not allowed to be empty"));
            return None;
        }
        if value.chars().count() > max {
            self.push(
                field,
                format!("\"{field}\" length must be less than or equal to {max} characters long"),
            );
            return None;
        }
        Some(value)
    }

    /// A required, strictly positive integer id.
    pub fn id(&mut self, field: &str, raw: &str) -> i64 {
        let raw = raw.trim();
        if raw.is_empty() {
            self.push(field, format!("\"{field}\" is required"));
            return 0;
        }
        match self.integer(field, raw) {
            Some(id) if id > 0 => id,
            Some(_) => {
                self.push(field, format!("\"{field}\" must be a positive number"));
                0
            }
            None => 0,
        }
    }

    /// An optional integer within `min..=max`, falling back to `default` when absent.
    pub fn bounded_int(
        &mut self,
        field: &str,
        raw: Option<String>,
        min: i64,
        max: i64,
        default: i64,
    ) -> i64 {
        let Some(raw) = raw else {
            return default;
        };
        let Some(value) = self.integer(field, raw.trim()) else {
            return default;
        };
        if value < min {
            self.push(
                field,
                format!("\"{field}\" must be greater than or equal to {min}"),
            );
            return default;
        }
        if value > max {
            self.push(field, format!("\"{field}\" must be less than or equal to {max}"));
            return default;
        }
        value
    }

    fn integer(&mut self, field: &str, raw: &str) -> Option<i64> {
        if let Ok(value) = raw.parse::<i64>() {
            return Some(value);
        }
        let message = match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => format!("\"{field}\" must be an integer"),
            _ => format!("\"{field}\" must be a number"),
        };
        self.push(field, message);
        None
    }

    /// Returns `value` if every check passed.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError {
                fields: self.errors,
            })
        }
    }
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

// --- User schemas ---

impl Validate for RegisterUserRequest {
    type Output = NewUser;

    fn validate(self) -> Result<NewUser, ValidationError> {
        let mut v = Validator::default();
        let user = NewUser {
            username: v.required_text("username", self.username, 100),
            password: v.required_text("password", self.password, 100),
            name: v.required_text("name", self.name, 100),
        };
        v.finish(user)
    }
}

impl Validate for LoginUserRequest {
    type Output = Credentials;

    fn validate(self) -> Result<Credentials, ValidationError> {
        let mut v = Validator::default();
        let credentials = Credentials {
            username: v.required_text("username", self.username, 100),
            password: v.required_text("password", self.password, 100),
        };
        v.finish(credentials)
    }
}

impl Validate for UpdateUserRequest {
    type Output = UserChanges;

    fn validate(self) -> Result<UserChanges, ValidationError> {
        let mut v = Validator::default();
        let changes = UserChanges {
            name: v.optional_text("name", self.name, 100),
            password: v.optional_text("password", self.password, 100),
        };
        v.finish(changes)
    }
}

// --- Contact schemas ---

fn contact_fields(
    v: &mut Validator,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
) -> ContactFields {
    ContactFields {
        first_name: v.required_text("first_name", first_name, 100),
        last_name: v.optional_text("last_name", last_name, 100),
        email: v.optional_email("email", email, 200),
        phone: v.optional_text("phone", phone, 20),
    }
}

impl Validate for CreateContactRequest {
    type Output = ContactFields;

    fn validate(self) -> Result<ContactFields, ValidationError> {
        let mut v = Validator::default();
        let fields = contact_fields(
            &mut v,
            self.first_name,
            self.last_name,
            self.email,
            self.phone,
        );
        v.finish(fields)
    }
}

impl Validate for UpdateContactRequest {
    type Output = ContactUpdate;

    fn validate(self) -> Result<ContactUpdate, ValidationError> {
        let mut v = Validator::default();
        let id = v.id("id", &self.id);
        let fields = contact_fields(
            &mut v,
            self.first_name,
            self.last_name,
            self.email,
            self.phone,
        );
        v.finish(ContactUpdate { id, fields })
    }
}

impl Validate for SearchContactRequest {
    type Output = ContactFilter;

    fn validate(self) -> Result<ContactFilter, ValidationError> {
        let mut v = Validator::default();
        let filter = ContactFilter {
            page: v.bounded_int("page", self.page, 1, i64::from(i32::MAX), 1),
            size: v.bounded_int("size", self.size, 1, 100, 10),
            name: v.optional_text("name", self.name, 100),
            email: v.optional_text("email", self.email, 200),
            phone: v.optional_text("phone", self.phone, 20),
        };
        v.finish(filter)
    }
}

// --- Address schemas ---

fn address_fields(
    v: &mut Validator,
    street: Option<String>,
    city: Option<String>,
    province: Option<String>,
    country: Option<String>,
    postal_code: Option<String>,
) -> AddressFields {
    AddressFields {
        street: v.optional_text("street", street, 255),
        city: v.optional_text("city", city, 100),
        province: v.optional_text("province", province, 100),
        country: v.required_text("country", country, 100),
        postal_code: v.required_text("postal_code", postal_code, 10),
    }
}

impl Validate for CreateAddressRequest {
    type Output = AddressFields;

    fn validate(self) -> Result<AddressFields, ValidationError> {
        let mut v = Validator::default();
        let fields = address_fields(
            &mut v,
            self.street,
            self.city,
            self.province,
            self.country,
            self.postal_code,
        );
        v.finish(fields)
    }
}

impl Validate for UpdateAddressRequest {
    type Output = AddressUpdate;

    fn validate(self) -> Result<AddressUpdate, ValidationError> {
        let mut v = Validator::default();
        let id = v.id("id", &self.id);
        let fields = address_fields(
            &mut v,
            self.street,
            self.city,
            self.province,
            self.country,
            self.postal_code,
        );
        v.finish(AddressUpdate { id, fields })
    }
}
