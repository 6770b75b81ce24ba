use crate::{
    AppState,
    auth::AuthUser,
    error::AppError,
    models::{
        AddressResponse, ContactResponse, CreateAddressRequest, CreateContactRequest,
        DataResponse, ErrorResponse, LoginUserRequest, RegisterUserRequest, SearchContactRequest,
        SearchContactResponse, TokenResponse, UpdateAddressRequest, UpdateContactRequest,
        UpdateUserRequest, UserResponse,
    },
    services::{AddressService, ContactService, UserService},
    validation::ValidationError,
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};

/// Body returned by operations that have nothing else to report.
const OK: &str = "OK";

type ApiResult<T> = Result<Json<DataResponse<T>>, AppError>;

fn data<T>(value: T) -> ApiResult<T> {
    Ok(Json(DataResponse::new(value)))
}

/// Keeps a body rejection as a validation error for the service to report, so routes
/// under a contact answer 404 to non-owners whatever the body looks like.
fn deferred<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ValidationError> {
    payload
        .map(|Json(request)| request)
        .map_err(ValidationError::from)
}

// --- User Handlers ---

/// register_user
///
/// [Public Route] Creates a new account. The password is hashed before it is stored
/// and is never returned.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "Registered (wrapped in `data`)", body = UserResponse),
        (status = 400, description = "Invalid input or username taken", body = ErrorResponse)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> ApiResult<UserResponse> {
    let Json(request) = payload?;
    let user = UserService::new(state.repo.as_ref(), &state.config)
        .register(request)
        .await?;
    data(user)
}

/// login_user
///
/// [Public Route] Exchanges credentials for a session token.
#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginUserRequest,
    responses(
        (status = 200, description = "Logged in (wrapped in `data`)", body = TokenResponse),
        (status = 401, description = "Username or password wrong", body = ErrorResponse)
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    payload: Result<Json<LoginUserRequest>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let Json(request) = payload?;
    let token = UserService::new(state.repo.as_ref(), &state.config)
        .login(request)
        .await?;
    data(token)
}

/// get_current_user
///
/// [Authenticated Route] The caller's own profile.
#[utoipa::path(
    get,
    path = "/api/users/current",
    responses((status = 200, description = "Profile (wrapped in `data`)", body = UserResponse))
)]
pub async fn get_current_user(user: AuthUser, State(state): State<AppState>) -> ApiResult<UserResponse> {
    let profile = UserService::new(state.repo.as_ref(), &state.config)
        .get(&user)
        .await?;
    data(profile)
}

/// update_current_user
///
/// [Authenticated Route] Partial update of the caller's name and/or password.
#[utoipa::path(
    patch,
    path = "/api/users/current",
    request_body = UpdateUserRequest,
    responses((status = 200, description = "Updated (wrapped in `data`)", body = UserResponse))
)]
pub async fn update_current_user(
    user: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<UserResponse> {
    let Json(request) = payload?;
    let profile = UserService::new(state.repo.as_ref(), &state.config)
        .update(&user, request)
        .await?;
    data(profile)
}

/// logout_user
///
/// [Authenticated Route] Ends the caller's session. Every token issued for it stops
/// being accepted.
#[utoipa::path(
    delete,
    path = "/api/users/logout",
    responses((status = 200, description = "`{\"data\": \"OK\"}`"))
)]
pub async fn logout_user(user: AuthUser, State(state): State<AppState>) -> ApiResult<&'static str> {
    UserService::new(state.repo.as_ref(), &state.config)
        .logout(&user)
        .await?;
    data(OK)
}

// --- Contact Handlers ---

/// create_contact
///
/// [Authenticated Route] Adds a contact owned by the caller.
#[utoipa::path(
    post,
    path = "/api/contacts",
    request_body = CreateContactRequest,
    responses(
        (status = 200, description = "Created (wrapped in `data`)", body = ContactResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
pub async fn create_contact(
    user: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateContactRequest>, JsonRejection>,
) -> ApiResult<ContactResponse> {
    let Json(request) = payload?;
    let contact = ContactService::new(state.repo.as_ref())
        .create(&user, request)
        .await?;
    data(contact)
}

/// search_contacts
///
/// [Authenticated Route] Paged search over the caller's contacts.
#[utoipa::path(
    get,
    path = "/api/contacts",
    params(SearchContactRequest),
    responses((status = 200, description = "One page of contacts", body = SearchContactResponse))
)]
pub async fn search_contacts(
    user: AuthUser,
    State(state): State<AppState>,
    Query(request): Query<SearchContactRequest>,
) -> Result<Json<SearchContactResponse>, AppError> {
    let page = ContactService::new(state.repo.as_ref())
        .search(&user, request)
        .await?;
    Ok(Json(page))
}

/// get_contact
///
/// [Authenticated Route] A single contact. Contacts of other users are reported as
/// not found.
#[utoipa::path(
    get,
    path = "/api/contacts/{contact_id}",
    params(("contact_id" = i64, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "Found (wrapped in `data`)", body = ContactResponse),
        (status = 404, description = "Not found or not yours", body = ErrorResponse)
    )
)]
pub async fn get_contact(
    user: AuthUser,
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
) -> ApiResult<ContactResponse> {
    let contact = ContactService::new(state.repo.as_ref())
        .get(&user, &contact_id)
        .await?;
    data(contact)
}

/// update_contact
///
/// [Authenticated Route] Replaces every field of a contact. The path id names the target.
#[utoipa::path(
    put,
    path = "/api/contacts/{contact_id}",
    params(("contact_id" = i64, Path, description = "Contact ID")),
    request_body = UpdateContactRequest,
    responses((status = 200, description = "Updated (wrapped in `data`)", body = ContactResponse))
)]
pub async fn update_contact(
    user: AuthUser,
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
    payload: Result<Json<UpdateContactRequest>, JsonRejection>,
) -> ApiResult<ContactResponse> {
    let Json(mut request) = payload?;
    request.id = contact_id;
    let contact = ContactService::new(state.repo.as_ref())
        .update(&user, request)
        .await?;
    data(contact)
}

/// remove_contact
///
/// [Authenticated Route] Deletes a contact together with its addresses.
#[utoipa::path(
    delete,
    path = "/api/contacts/{contact_id}",
    params(("contact_id" = i64, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "`{\"data\": \"OK\"}`"),
        (status = 404, description = "Not found or not yours", body = ErrorResponse)
    )
)]
pub async fn remove_contact(
    user: AuthUser,
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
) -> ApiResult<&'static str> {
    ContactService::new(state.repo.as_ref())
        .remove(&user, &contact_id)
        .await?;
    data(OK)
}

// --- Address Handlers ---

/// create_address
///
/// [Authenticated Route] Adds an address to one of the caller's contacts. The body is
/// only inspected once the contact is known to belong to the caller.
#[utoipa::path(
    post,
    path = "/api/contacts/{contact_id}/addresses",
    params(("contact_id" = i64, Path, description = "Contact ID")),
    request_body = CreateAddressRequest,
    responses(
        (status = 200, description = "Created (wrapped in `data`)", body = AddressResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Contact not found or not yours", body = ErrorResponse)
    )
)]
pub async fn create_address(
    user: AuthUser,
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
    payload: Result<Json<CreateAddressRequest>, JsonRejection>,
) -> ApiResult<AddressResponse> {
    let address = AddressService::new(state.repo.as_ref())
        .create(&user, &contact_id, deferred(payload))
        .await?;
    data(address)
}

/// list_addresses
///
/// [Authenticated Route] Every address of a contact, ordered by id.
#[utoipa::path(
    get,
    path = "/api/contacts/{contact_id}/addresses",
    params(("contact_id" = i64, Path, description = "Contact ID")),
    responses((status = 200, description = "Addresses (wrapped in `data`)", body = [AddressResponse]))
)]
pub async fn list_addresses(
    user: AuthUser,
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
) -> ApiResult<Vec<AddressResponse>> {
    let addresses = AddressService::new(state.repo.as_ref())
        .list(&user, &contact_id)
        .await?;
    data(addresses)
}

/// get_address
///
/// [Authenticated Route] A single address of one of the caller's contacts.
#[utoipa::path(
    get,
    path = "/api/contacts/{contact_id}/addresses/{address_id}",
    params(
        ("contact_id" = i64, Path, description = "Contact ID"),
        ("address_id" = i64, Path, description = "Address ID")
    ),
    responses(
        (status = 200, description = "Found (wrapped in `data`)", body = AddressResponse),
        (status = 404, description = "Not found or not yours", body = ErrorResponse)
    )
)]
pub async fn get_address(
    user: AuthUser,
    State(state): State<AppState>,
    Path((contact_id, address_id)): Path<(String, String)>,
) -> ApiResult<AddressResponse> {
    let address = AddressService::new(state.repo.as_ref())
        .get(&user, &contact_id, &address_id)
        .await?;
    data(address)
}

/// update_address
///
/// [Authenticated Route] Replaces every field of an address. The path id names the target.
#[utoipa::path(
    put,
    path = "/api/contacts/{contact_id}/addresses/{address_id}",
    params(
        ("contact_id" = i64, Path, description = "Contact ID"),
        ("address_id" = i64, Path, description = "Address ID")
    ),
    request_body = UpdateAddressRequest,
    responses((status = 200, description = "Updated (wrapped in `data`)", body = AddressResponse))
)]
pub async fn update_address(
    user: AuthUser,
    State(state): State<AppState>,
    Path((contact_id, address_id)): Path<(String, String)>,
    payload: Result<Json<UpdateAddressRequest>, JsonRejection>,
) -> ApiResult<AddressResponse> {
    let request = deferred(payload).map(|request| UpdateAddressRequest {
        id: address_id,
        ..request
    });
    let address = AddressService::new(state.repo.as_ref())
        .update(&user, &contact_id, request)
        .await?;
    data(address)
}

/// remove_address
///
/// [Authenticated Route] Deletes an address.
#[utoipa::path(
    delete,
    path = "/api/contacts/{contact_id}/addresses/{address_id}",
    params(
        ("contact_id" = i64, Path, description = "Contact ID"),
        ("address_id" = i64, Path, description = "Address ID")
    ),
    responses(
        (status = 200, description = "`{\"data\": \"OK\"}`"),
        (status = 404, description = "Not found or not yours", body = ErrorResponse)
    )
)]
pub async fn remove_address(
    user: AuthUser,
    State(state): State<AppState>,
    Path((contact_id, address_id)): Path<(String, String)>,
) -> ApiResult<&'static str> {
    AddressService::new(state.repo.as_ref())
        .remove(&user, &contact_id, &address_id)
        .await?;
    data(OK)
}
