//! Use-case services.
//!
//! Each service borrows the injected store client (`&dyn Repository`) for the duration
//! of one request and composes validation, ownership checks and a store call into a
//! response DTO. Handlers stay thin and storage-agnostic.

pub mod address;
pub mod contact;
pub mod user;

pub use address::AddressService;
pub use contact::{ContactService, check_contact_must_exist};
pub use user::UserService;
