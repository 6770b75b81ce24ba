use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::validation::FieldError;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A row of the `users` table. `password` holds the Argon2 PHC string and `token` the
/// current session id (`None` once logged out). Never serialized to clients directly;
/// see `UserResponse`.
#[derive(Debug, Clone, FromRow, Default, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub password: String,
    pub name: String,
    pub token: Option<String>,
}

/// Contact
///
/// A row of the `contacts` table, owned by exactly one user through `username`.
#[derive(Debug, Clone, FromRow, Default, PartialEq, Eq)]
pub struct Contact {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Address
///
/// A row of the `addresses` table. `contact_id` is fixed at creation and never
/// reassigned.
#[derive(Debug, Clone, FromRow, Default, PartialEq, Eq)]
pub struct Address {
    pub id: i64,
    pub contact_id: i64,
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: String,
    pub postal_code: String,
}

// --- Request Payloads (Input Schemas) ---
//
// Every field is optional at the type level so that presence, emptiness and length are
// all reported by the validator as field errors rather than as serde failures.

/// RegisterUserRequest
///
/// Input payload for `POST /api/users`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// LoginUserRequest
///
/// Input payload for `POST /api/users/login`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct LoginUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// UpdateUserRequest
///
/// Partial update payload for `PATCH /api/users/current`. Only provided fields change.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// CreateContactRequest
///
/// Input payload for `POST /api/contacts`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct CreateContactRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// UpdateContactRequest
///
/// Full replacement payload for `PUT /api/contacts/{contact_id}`.
/// The target `id` is taken from the path, never from the body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct UpdateContactRequest {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// SearchContactRequest
///
/// Query parameters for `GET /api/contacts`. `page` and `size` stay strings here so a
/// malformed number becomes a field error instead of a query rejection.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchContactRequest {
    /// Substring of the first or last name.
    pub name: Option<String>,
    /// Substring of the email.
    pub email: Option<String>,
    /// Substring of the phone number.
    pub phone: Option<String>,
    /// 1-based page number (default 1).
    pub page: Option<String>,
    /// Page size, 1 to 100 (default 10).
    pub size: Option<String>,
}

/// CreateAddressRequest
///
/// Input payload for `POST /api/contacts/{contact_id}/addresses`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct CreateAddressRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// UpdateAddressRequest
///
/// Full replacement payload for `PUT /api/contacts/{contact_id}/addresses/{address_id}`.
/// Not patch-style: an omitted optional field is stored as `NULL`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct UpdateAddressRequest {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

// --- Sanitized Inputs (Validator Output) ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContactFields {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactUpdate {
    pub id: i64,
    pub fields: ContactFields,
}

/// Search criteria; every present filter must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub page: i64,
    pub size: i64,
}

impl ContactFilter {
    /// Number of rows skipped before this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.size
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressFields {
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressUpdate {
    pub id: i64,
    pub fields: AddressFields,
}

// --- Response Schemas (Output) ---

/// UserResponse
///
/// Public projection of a user. The password hash and session token never leave the server.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct UserResponse {
    pub username: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            name: user.name,
        }
    }
}

/// TokenResponse
///
/// Returned by login. The token goes into `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
}

/// ContactResponse
///
/// Projection of a contact; the owning username is internal.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct ContactResponse {
    #[ts(type = "number")]
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<Contact> for ContactResponse {
    fn from(contact: Contact) -> Self {
        Self {
            id: contact.id,
            first_name: contact.first_name,
            last_name: contact.last_name,
            email: contact.email,
            phone: contact.phone,
        }
    }
}

/// AddressResponse
///
/// Projection of an address: `{id, street, city, province, postal_code, country}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct AddressResponse {
    #[ts(type = "number")]
    pub id: i64,
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: String,
    pub country: String,
}

impl From<Address> for AddressResponse {
    fn from(address: Address) -> Self {
        Self {
            id: address.id,
            street: address.street,
            city: address.city,
            province: address.province,
            postal_code: address.postal_code,
            country: address.country,
        }
    }
}

/// Paging
///
/// Pagination metadata accompanying a contact search.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct Paging {
    #[ts(type = "number")]
    pub page: i64,
    #[ts(type = "number")]
    pub total_item: i64,
    #[ts(type = "number")]
    pub total_page: i64,
}

impl Paging {
    pub fn new(page: i64, size: i64, total_item: i64) -> Self {
        Self {
            page,
            total_item,
            total_page: (total_item + size - 1) / size,
        }
    }
}

/// SearchContactResponse
///
/// One page of contacts plus its paging metadata.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SearchContactResponse {
    pub data: Vec<ContactResponse>,
    pub paging: Paging,
}

// --- Envelope Schemas ---

/// DataResponse
///
/// Success envelope: every non-paged response body is `{"data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// ErrorResponse
///
/// Failure envelope. `fields` is only present for validation errors.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct ErrorResponse {
    pub errors: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}
