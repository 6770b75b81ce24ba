/// Router Module Index
///
/// Splits the routing table by access level. Authentication is applied as a layer on
/// the whole `authenticated` router, so a handler cannot be exposed anonymously by
/// forgetting an extractor.

/// Routes reachable without a session: health check, registration and login.
pub mod public;

/// Routes behind the `AuthUser` middleware: profile, contacts and addresses.
pub mod authenticated;
