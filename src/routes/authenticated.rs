use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Authenticated Router Module
///
/// Every route here is wrapped by `auth_middleware` in `create_router`, and every
/// handler receives the resolved `AuthUser`. Contacts and addresses are always looked
/// up through the caller's username: a resource owned by someone else answers 404,
/// never 403, so ids cannot be enumerated across accounts.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Current User ---
        // GET/PATCH /api/users/current
        // Reads or partially updates the caller's profile (name, password).
        .route(
            "/api/users/current",
            get(handlers::get_current_user).patch(handlers::update_current_user),
        )
        // DELETE /api/users/logout
        // Clears the session id; tokens issued for it are rejected afterwards.
        .route("/api/users/logout", delete(handlers::logout_user))
        // --- Contacts ---
        // POST/GET /api/contacts?name=&email=&phone=&page=&size=
        // Creates a contact, or searches the caller's contacts with paging.
        .route(
            "/api/contacts",
            post(handlers::create_contact).get(handlers::search_contacts),
        )
        // GET/PUT/DELETE /api/contacts/{contact_id}
        .route(
            "/api/contacts/{contact_id}",
            get(handlers::get_contact)
                .put(handlers::update_contact)
                .delete(handlers::remove_contact),
        )
        // --- Addresses ---
        // Every address route first checks that the parent contact belongs to the caller.
        .route(
            "/api/contacts/{contact_id}/addresses",
            post(handlers::create_address).get(handlers::list_addresses),
        )
        .route(
            "/api/contacts/{contact_id}/addresses/{address_id}",
            get(handlers::get_address)
                .put(handlers::update_address)
                .delete(handlers::remove_address),
        )
}
