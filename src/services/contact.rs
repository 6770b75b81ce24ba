use crate::{
    auth::AuthUser,
    error::{AppError, Result},
    models::{
        ContactResponse, CreateContactRequest, Paging, SearchContactRequest,
        SearchContactResponse, UpdateContactRequest,
    },
    repository::Repository,
    validation::{validate, validate_id},
};

fn contact_not_found() -> AppError {
    AppError::NotFound("contact is not found".to_string())
}

/// check_contact_must_exist
///
/// The ownership guard. Sanitizes `contact_id` and confirms exactly one contact with
/// that id is owned by `user`. This is the single place tenancy isolation is enforced
/// for contact sub-resources; every address operation starts here.
///
/// # Errors
/// - `Validation` if the id is absent, non-numeric or not positive. The store is not
///   touched in that case.
/// - `NotFound("contact is not found")` if the contact is missing or owned by someone else.
pub async fn check_contact_must_exist(
    repo: &dyn Repository,
    user: &AuthUser,
    contact_id: &str,
) -> Result<i64> {
    let contact_id = validate_id("contactId", contact_id)?;
    ensure_contact_owned(repo, user, contact_id).await?;
    Ok(contact_id)
}

async fn ensure_contact_owned(
    repo: &dyn Repository,
    user: &AuthUser,
    contact_id: i64,
) -> Result<()> {
    let total = repo.count_contacts(&user.username, contact_id).await?;
    if total != 1 {
        return Err(contact_not_found());
    }
    Ok(())
}

/// ContactService
///
/// CRUD and search over the caller's own contacts.
pub struct ContactService<'a> {
    repo: &'a dyn Repository,
}

impl<'a> ContactService<'a> {
    pub fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }

    pub async fn create(
        &self,
        user: &AuthUser,
        request: CreateContactRequest,
    ) -> Result<ContactResponse> {
        let fields = validate(request)?;
        let contact = self.repo.create_contact(&user.username, fields).await?;
        tracing::info!(username = %user.username, contact_id = contact.id, "contact created");
        Ok(contact.into())
    }

    pub async fn get(&self, user: &AuthUser, contact_id: &str) -> Result<ContactResponse> {
        let contact_id = validate_id("contactId", contact_id)?;

        self.repo
            .find_contact(&user.username, contact_id)
            .await?
            .map(ContactResponse::from)
            .ok_or_else(contact_not_found)
    }

    /// update
    ///
    /// Total overwrite of the contact's fields; `request.id` names the target.
    pub async fn update(
        &self,
        user: &AuthUser,
        request: UpdateContactRequest,
    ) -> Result<ContactResponse> {
        let update = validate(request)?;
        ensure_contact_owned(self.repo, user, update.id).await?;

        let contact = self
            .repo
            .update_contact(&user.username, update.id, update.fields)
            .await?
            .ok_or_else(contact_not_found)?;
        tracing::info!(username = %user.username, contact_id = contact.id, "contact updated");
        Ok(contact.into())
    }

    /// remove
    ///
    /// Deletes the contact and, through the cascade, its addresses.
    pub async fn remove(&self, user: &AuthUser, contact_id: &str) -> Result<()> {
        let contact_id = check_contact_must_exist(self.repo, user, contact_id).await?;

        self.repo
            .delete_contact(&user.username, contact_id)
            .await?
            .ok_or_else(contact_not_found)?;
        tracing::info!(username = %user.username, contact_id, "contact removed");
        Ok(())
    }

    /// search
    ///
    /// One page of the caller's contacts matching every supplied filter, ordered by id.
    pub async fn search(
        &self,
        user: &AuthUser,
        request: SearchContactRequest,
    ) -> Result<SearchContactResponse> {
        let filter = validate(request)?;

        let contacts = self.repo.search_contacts(&user.username, &filter).await?;
        let total_item = self
            .repo
            .count_search_contacts(&user.username, &filter)
            .await?;

        Ok(SearchContactResponse {
            data: contacts.into_iter().map(ContactResponse::from).collect(),
            paging: Paging::new(filter.page, filter.size, total_item),
        })
    }
}
