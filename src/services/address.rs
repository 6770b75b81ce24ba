use crate::{
    auth::AuthUser,
    error::{AppError, Result},
    models::{Address, AddressFields, AddressResponse, AddressUpdate},
    repository::Repository,
    services::contact::check_contact_must_exist,
    validation::{Validate, validate, validate_id},
};

fn address_not_found() -> AppError {
    AppError::NotFound("address is not found".to_string())
}

/// AddressService
///
/// The address sub-resource of a contact. Every operation follows the same shape:
/// ownership guard on the parent contact, payload/id validation, one store call,
/// projection to `AddressResponse`.
///
/// Mutations are filtered by `contact_id` as well as `id`, so ownership is enforced by
/// the write itself and not only by the existence check that precedes it.
///
/// Payloads are any `Validate` source: a `CreateAddressRequest` directly, or a request
/// body whose deserialization failure is reported only once the guard has passed.
pub struct AddressService<'a> {
    repo: &'a dyn Repository,
}

impl<'a> AddressService<'a> {
    pub fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }

    pub async fn create<R>(
        &self,
        user: &AuthUser,
        contact_id: &str,
        request: R,
    ) -> Result<AddressResponse>
    where
        R: Validate<Output = AddressFields> + Send,
    {
        let contact_id = check_contact_must_exist(self.repo, user, contact_id).await?;
        let fields = validate(request)?;

        let address = self.repo.create_address(contact_id, fields).await?;
        tracing::info!(contact_id, address_id = address.id, "address created");
        Ok(address.into())
    }

    pub async fn get(
        &self,
        user: &AuthUser,
        contact_id: &str,
        address_id: &str,
    ) -> Result<AddressResponse> {
        let contact_id = check_contact_must_exist(self.repo, user, contact_id).await?;
        let address_id = validate_id("addressId", address_id)?;

        self.repo
            .find_address(contact_id, address_id)
            .await?
            .map(AddressResponse::from)
            .ok_or_else(address_not_found)
    }

    /// update
    ///
    /// Replaces every field of the address named by the request's `id`. Not a patch: an
    /// omitted optional field is cleared.
    pub async fn update<R>(
        &self,
        user: &AuthUser,
        contact_id: &str,
        request: R,
    ) -> Result<AddressResponse>
    where
        R: Validate<Output = AddressUpdate> + Send,
    {
        let contact_id = check_contact_must_exist(self.repo, user, contact_id).await?;
        let update = validate(request)?;

        let total = self.repo.count_addresses(contact_id, update.id).await?;
        if total != 1 {
            return Err(address_not_found());
        }

        // A concurrent remove between the count and the write surfaces as NotFound.
        let address = self
            .repo
            .update_address(contact_id, update.id, update.fields)
            .await?
            .ok_or_else(address_not_found)?;
        tracing::info!(contact_id, address_id = address.id, "address updated");
        Ok(address.into())
    }

    /// remove
    ///
    /// Physically deletes the address and returns the deleted row.
    pub async fn remove(
        &self,
        user: &AuthUser,
        contact_id: &str,
        address_id: &str,
    ) -> Result<Address> {
        let contact_id = check_contact_must_exist(self.repo, user, contact_id).await?;
        let address_id = validate_id("addressId", address_id)?;

        let total = self.repo.count_addresses(contact_id, address_id).await?;
        if total != 1 {
            return Err(address_not_found());
        }

        let deleted = self
            .repo
            .delete_address(contact_id, address_id)
            .await?
            .ok_or_else(address_not_found)?;
        tracing::info!(contact_id, address_id, "address removed");
        Ok(deleted)
    }

    /// list
    ///
    /// Every address of the contact, ordered by id. An empty contact yields `[]`.
    pub async fn list(&self, user: &AuthUser, contact_id: &str) -> Result<Vec<AddressResponse>> {
        let contact_id = check_contact_must_exist(self.repo, user, contact_id).await?;

        let addresses = self.repo.list_addresses(contact_id).await?;
        Ok(addresses.into_iter().map(AddressResponse::from).collect())
    }
}
