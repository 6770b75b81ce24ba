use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::{RepoResult, Repository, RepositoryError};
use crate::models::{Address, AddressFields, Contact, ContactFields, ContactFilter, User};

#[derive(Default)]
struct Tables {
    users: BTreeMap<String, User>,
    contacts: BTreeMap<i64, Contact>,
    addresses: BTreeMap<i64, Address>,
    next_contact_id: i64,
    next_address_id: i64,
}

impl Tables {
    fn matching_contacts<'a>(
        &'a self,
        username: &'a str,
        filter: &'a ContactFilter,
    ) -> impl Iterator<Item = &'a Contact> + 'a {
        self.contacts.values().filter(move |c| {
            c.username == username
                && filter.name.as_deref().is_none_or(|name| {
                    c.first_name.contains(name) || contains(c.last_name.as_deref(), name)
                })
                && filter
                    .email
                    .as_deref()
                    .is_none_or(|email| contains(c.email.as_deref(), email))
                && filter
                    .phone
                    .as_deref()
                    .is_none_or(|phone| contains(c.phone.as_deref(), phone))
        })
    }
}

/// True when `haystack` contains `needle`; absent values never match.
fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|value| value.contains(needle))
}

/// InMemoryRepository
///
/// A process-local implementation of `Repository` used for unit and integration
/// testing, so services and handlers can be exercised without a PostgreSQL instance.
/// Ids are assigned sequentially from 1, and `BTreeMap` iteration gives the same
/// `ORDER BY id` the Postgres queries use.
///
/// Every trait call is counted (`calls`) so tests can assert that validation failures
/// never reach the store; `set_failing(true)` makes every call return `Unavailable`.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        let repo = Self::default();
        repo.set_failing(true);
        repo
    }

    /// Number of repository calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn enter(&self, op: &str) -> RepoResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(format!(
                "simulated failure in {op}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn count_users(&self, username: &str) -> RepoResult<i64> {
        self.enter("count_users")?;
        let tables = self.tables.read().await;
        Ok(i64::from(tables.users.contains_key(username)))
    }

    async fn find_user(&self, username: &str) -> RepoResult<Option<User>> {
        self.enter("find_user")?;
        let tables = self.tables.read().await;
        Ok(tables.users.get(username).cloned())
    }

    async fn create_user(&self, user: User) -> RepoResult<User> {
        self.enter("create_user")?;
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.username) {
            return Err(RepositoryError::Conflict(format!(
                "username {} already exists",
                user.username
            )));
        }
        tables.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn update_user(
        &self,
        username: &str,
        name: Option<String>,
        password_hash: Option<String>,
    ) -> RepoResult<Option<User>> {
        self.enter("update_user")?;
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.get_mut(username) else {
            return Ok(None);
        };
        if let Some(name) = name {
            user.name = name;
        }
        if let Some(password) = password_hash {
            user.password = password;
        }
        Ok(Some(user.clone()))
    }

    async fn set_user_token(&self, username: &str, token: Option<String>) -> RepoResult<bool> {
        self.enter("set_user_token")?;
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(username) {
            Some(user) => {
                user.token = token;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_contacts(&self, username: &str, id: i64) -> RepoResult<i64> {
        self.enter("count_contacts")?;
        let tables = self.tables.read().await;
        let owned = tables
            .contacts
            .get(&id)
            .is_some_and(|c| c.username == username);
        Ok(i64::from(owned))
    }

    async fn create_contact(&self, username: &str, fields: ContactFields) -> RepoResult<Contact> {
        self.enter("create_contact")?;
        let mut tables = self.tables.write().await;
        tables.next_contact_id += 1;
        let contact = Contact {
            id: tables.next_contact_id,
            username: username.to_string(),
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
            phone: fields.phone,
        };
        tables.contacts.insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn find_contact(&self, username: &str, id: i64) -> RepoResult<Option<Contact>> {
        self.enter("find_contact")?;
        let tables = self.tables.read().await;
        Ok(tables
            .contacts
            .get(&id)
            .filter(|c| c.username == username)
            .cloned())
    }

    async fn update_contact(
        &self,
        username: &str,
        id: i64,
        fields: ContactFields,
    ) -> RepoResult<Option<Contact>> {
        self.enter("update_contact")?;
        let mut tables = self.tables.write().await;
        let Some(contact) = tables
            .contacts
            .get_mut(&id)
            .filter(|c| c.username == username)
        else {
            return Ok(None);
        };
        contact.first_name = fields.first_name;
        contact.last_name = fields.last_name;
        contact.email = fields.email;
        contact.phone = fields.phone;
        Ok(Some(contact.clone()))
    }

    async fn delete_contact(&self, username: &str, id: i64) -> RepoResult<Option<Contact>> {
        self.enter("delete_contact")?;
        let mut tables = self.tables.write().await;
        let owned = tables
            .contacts
            .get(&id)
            .is_some_and(|c| c.username == username);
        if !owned {
            return Ok(None);
        }
        tables.addresses.retain(|_, a| a.contact_id != id);
        Ok(tables.contacts.remove(&id))
    }

    async fn search_contacts(
        &self,
        username: &str,
        filter: &ContactFilter,
    ) -> RepoResult<Vec<Contact>> {
        self.enter("search_contacts")?;
        let tables = self.tables.read().await;
        let skip = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(filter.size).unwrap_or(0);
        Ok(tables
            .matching_contacts(username, filter)
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn count_search_contacts(
        &self,
        username: &str,
        filter: &ContactFilter,
    ) -> RepoResult<i64> {
        self.enter("count_search_contacts")?;
        let tables = self.tables.read().await;
        let total = tables.matching_contacts(username, filter).count();
        Ok(i64::try_from(total).unwrap_or(i64::MAX))
    }

    async fn count_addresses(&self, contact_id: i64, id: i64) -> RepoResult<i64> {
        self.enter("count_addresses")?;
        let tables = self.tables.read().await;
        let found = tables
            .addresses
            .get(&id)
            .is_some_and(|a| a.contact_id == contact_id);
        Ok(i64::from(found))
    }

    async fn create_address(&self, contact_id: i64, fields: AddressFields) -> RepoResult<Address> {
        self.enter("create_address")?;
        let mut tables = self.tables.write().await;
        // Mirrors the foreign key on addresses.contact_id.
        if !tables.contacts.contains_key(&contact_id) {
            return Err(RepositoryError::Conflict(format!(
                "contact {contact_id} does not exist"
            )));
        }
        tables.next_address_id += 1;
        let address = Address {
            id: tables.next_address_id,
            contact_id,
            street: fields.street,
            city: fields.city,
            province: fields.province,
            country: fields.country,
            postal_code: fields.postal_code,
        };
        tables.addresses.insert(address.id, address.clone());
        Ok(address)
    }

    async fn find_address(&self, contact_id: i64, id: i64) -> RepoResult<Option<Address>> {
        self.enter("find_address")?;
        let tables = self.tables.read().await;
        Ok(tables
            .addresses
            .get(&id)
            .filter(|a| a.contact_id == contact_id)
            .cloned())
    }

    async fn update_address(
        &self,
        contact_id: i64,
        id: i64,
        fields: AddressFields,
    ) -> RepoResult<Option<Address>> {
        self.enter("update_address")?;
        let mut tables = self.tables.write().await;
        let Some(address) = tables
            .addresses
            .get_mut(&id)
            .filter(|a| a.contact_id == contact_id)
        else {
            return Ok(None);
        };
        address.street = fields.street;
        address.city = fields.city;
        address.province = fields.province;
        address.country = fields.country;
        address.postal_code = fields.postal_code;
        Ok(Some(address.clone()))
    }

    async fn delete_address(&self, contact_id: i64, id: i64) -> RepoResult<Option<Address>> {
        self.enter("delete_address")?;
        let mut tables = self.tables.write().await;
        let found = tables
            .addresses
            .get(&id)
            .is_some_and(|a| a.contact_id == contact_id);
        if !found {
            return Ok(None);
        }
        Ok(tables.addresses.remove(&id))
    }

    async fn list_addresses(&self, contact_id: i64) -> RepoResult<Vec<Address>> {
        self.enter("list_addresses")?;
        let tables = self.tables.read().await;
        Ok(tables
            .addresses
            .values()
            .filter(|a| a.contact_id == contact_id)
            .cloned()
            .collect())
    }
}
