use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};

use super::{RepoResult, Repository, RepositoryError};
use crate::models::{Address, AddressFields, Contact, ContactFields, ContactFilter, User};

const UNIQUE_VIOLATION: &str = "23505";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Queries are bound at runtime (`query_as` + `bind`), so building the crate needs no
/// live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// push_contact_filters
///
/// Appends the owner scope and the optional search filters to a contact query.
/// Shared by the page query and the count query so both see the same rows.
/// `strpos` is used instead of `LIKE` so user input needs no wildcard escaping.
fn push_contact_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    username: &str,
    filter: &ContactFilter,
) {
    builder.push(" WHERE username = ");
    builder.push_bind(username.to_string());

    if let Some(name) = &filter.name {
        builder.push(" AND (strpos(first_name, ");
        builder.push_bind(name.clone());
        builder.push(") > 0 OR strpos(last_name, ");
        builder.push_bind(name.clone());
        builder.push(") > 0)");
    }

    if let Some(email) = &filter.email {
        builder.push(" AND strpos(email, ");
        builder.push_bind(email.clone());
        builder.push(") > 0");
    }

    if let Some(phone) = &filter.phone {
        builder.push(" AND strpos(phone, ");
        builder.push_bind(phone.clone());
        builder.push(") > 0");
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn count_users(&self, username: &str) -> RepoResult<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn find_user(&self, username: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT username, password, name, token FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// create_user
    ///
    /// Inserts a user. A unique violation on `username` (a registration racing the
    /// service's count check) is reported as `Conflict`.
    async fn create_user(&self, user: User) -> RepoResult<User> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, password, name, token)
               VALUES ($1, $2, $3, $4)
               RETURNING username, password, name, token"#,
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.name)
        .bind(&user.token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                RepositoryError::Conflict(format!("username {} already exists", user.username))
            }
            other => RepositoryError::Database(other),
        })
    }

    /// update_user
    ///
    /// Uses `COALESCE` so that only the `Some` fields overwrite their column.
    async fn update_user(
        &self,
        username: &str,
        name: Option<String>,
        password_hash: Option<String>,
    ) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                password = COALESCE($3, password)
            WHERE username = $1
            RETURNING username, password, name, token
            "#,
        )
        .bind(username)
        .bind(name)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_user_token(&self, username: &str, token: Option<String>) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE users SET token = $2 WHERE username = $1")
            .bind(username)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- CONTACTS ---

    async fn count_contacts(&self, username: &str, id: i64) -> RepoResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM contacts WHERE username = $1 AND id = $2",
        )
        .bind(username)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn create_contact(&self, username: &str, fields: ContactFields) -> RepoResult<Contact> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"INSERT INTO contacts (username, first_name, last_name, email, phone)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, username, first_name, last_name, email, phone"#,
        )
        .bind(username)
        .bind(fields.first_name)
        .bind(fields.last_name)
        .bind(fields.email)
        .bind(fields.phone)
        .fetch_one(&self.pool)
        .await?;
        Ok(contact)
    }

    async fn find_contact(&self, username: &str, id: i64) -> RepoResult<Option<Contact>> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"SELECT id, username, first_name, last_name, email, phone
               FROM contacts
               WHERE username = $1 AND id = $2"#,
        )
        .bind(username)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(contact)
    }

    /// update_contact
    ///
    /// Total overwrite, scoped by owner in the same statement.
    async fn update_contact(
        &self,
        username: &str,
        id: i64,
        fields: ContactFields,
    ) -> RepoResult<Option<Contact>> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts
            SET first_name = $3, last_name = $4, email = $5, phone = $6
            WHERE username = $1 AND id = $2
            RETURNING id, username, first_name, last_name, email, phone
            "#,
        )
        .bind(username)
        .bind(id)
        .bind(fields.first_name)
        .bind(fields.last_name)
        .bind(fields.email)
        .bind(fields.phone)
        .fetch_optional(&self.pool)
        .await?;
        Ok(contact)
    }

    async fn delete_contact(&self, username: &str, id: i64) -> RepoResult<Option<Contact>> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"DELETE FROM contacts
               WHERE username = $1 AND id = $2
               RETURNING id, username, first_name, last_name, email, phone"#,
        )
        .bind(username)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(contact)
    }

    /// search_contacts
    ///
    /// Implements flexible filtering using QueryBuilder for safe parameterization.
    async fn search_contacts(
        &self,
        username: &str,
        filter: &ContactFilter,
    ) -> RepoResult<Vec<Contact>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, username, first_name, last_name, email, phone FROM contacts",
        );
        push_contact_filters(&mut builder, username, filter);
        builder.push(" ORDER BY id ASC LIMIT ");
        builder.push_bind(filter.size);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset());

        let contacts = builder
            .build_query_as::<Contact>()
            .fetch_all(&self.pool)
            .await?;
        Ok(contacts)
    }

    async fn count_search_contacts(
        &self,
        username: &str,
        filter: &ContactFilter,
    ) -> RepoResult<i64> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM contacts");
        push_contact_filters(&mut builder, username, filter);

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    // --- ADDRESSES ---

    async fn count_addresses(&self, contact_id: i64, id: i64) -> RepoResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM addresses WHERE contact_id = $1 AND id = $2",
        )
        .bind(contact_id)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn create_address(&self, contact_id: i64, fields: AddressFields) -> RepoResult<Address> {
        let address = sqlx::query_as::<_, Address>(
            r#"INSERT INTO addresses (contact_id, street, city, province, country, postal_code)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, contact_id, street, city, province, country, postal_code"#,
        )
        .bind(contact_id)
        .bind(fields.street)
        .bind(fields.city)
        .bind(fields.province)
        .bind(fields.country)
        .bind(fields.postal_code)
        .fetch_one(&self.pool)
        .await?;
        Ok(address)
    }

    async fn find_address(&self, contact_id: i64, id: i64) -> RepoResult<Option<Address>> {
        let address = sqlx::query_as::<_, Address>(
            r#"SELECT id, contact_id, street, city, province, country, postal_code
               FROM addresses
               WHERE contact_id = $1 AND id = $2"#,
        )
        .bind(contact_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(address)
    }

    /// update_address
    ///
    /// Overwrites every column. The `contact_id` predicate re-checks ownership inside the
    /// mutation itself, so a concurrent delete yields `None` rather than a stray write.
    async fn update_address(
        &self,
        contact_id: i64,
        id: i64,
        fields: AddressFields,
    ) -> RepoResult<Option<Address>> {
        let address = sqlx::query_as::<_, Address>(
            r#"
            UPDATE addresses
            SET street = $3, city = $4, province = $5, country = $6, postal_code = $7
            WHERE contact_id = $1 AND id = $2
            RETURNING id, contact_id, street, city, province, country, postal_code
            "#,
        )
        .bind(contact_id)
        .bind(id)
        .bind(fields.street)
        .bind(fields.city)
        .bind(fields.province)
        .bind(fields.country)
        .bind(fields.postal_code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(address)
    }

    async fn delete_address(&self, contact_id: i64, id: i64) -> RepoResult<Option<Address>> {
        let address = sqlx::query_as::<_, Address>(
            r#"DELETE FROM addresses
               WHERE contact_id = $1 AND id = $2
               RETURNING id, contact_id, street, city, province, country, postal_code"#,
        )
        .bind(contact_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(address)
    }

    async fn list_addresses(&self, contact_id: i64) -> RepoResult<Vec<Address>> {
        let addresses = sqlx::query_as::<_, Address>(
            r#"SELECT id, contact_id, street, city, province, country, postal_code
               FROM addresses
               WHERE contact_id = $1
               ORDER BY id ASC"#,
        )
        .bind(contact_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(addresses)
    }
}
