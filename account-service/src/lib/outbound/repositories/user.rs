use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::domain::auth::models::EmailAddress;
use crate::domain::auth::models::User;
use crate::domain::auth::models::UserId;
use crate::domain::auth::models::UserUpdate;
use crate::domain::auth::ports::UserDirectory;
use crate::auth::errors::AuthError;

pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw database row, converted into the domain entity after fetching.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    surname: String,
    email: String,
    age: Option<i32>,
    phone: Option<String>,
    role: String,
    hashed_password: String,
    disabled: bool,
    reset_token: Option<String>,
    reset_token_expires: Option<DateTime<Utc>>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, AuthError> {
        Ok(User {
            id: UserId(self.id),
            name: self.name,
            surname: self.surname,
            email: EmailAddress::new(self.email)?,
            hashed_password: self.hashed_password,
            age: self.age,
            phone: self.phone,
            role: self.role.parse()?,
            disabled: self.disabled,
            reset_token: self.reset_token,
            reset_token_expires: self.reset_token_expires,
        })
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, surname, email, age, phone, role, hashed_password, disabled,
                   reset_token, reset_token_expires
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        row.map(UserRow::try_into_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, surname, email, age, phone, role, hashed_password, disabled,
                   reset_token, reset_token_expires
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        row.map(UserRow::try_into_user).transpose()
    }

    async fn create(&self, user: User) -> Result<User, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, surname, email, age, phone, role, hashed_password,
                               disabled, reset_token, reset_token_expires)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.id.0)
        .bind(&user.name)
        .bind(&user.surname)
        .bind(user.email.as_str())
        .bind(user.age)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(&user.hashed_password)
        .bind(user.disabled)
        .bind(&user.reset_token)
        .bind(user.reset_token_expires)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
                    return AuthError::DuplicateEmail(user.email.as_str().to_string());
                }
            }
            AuthError::DatabaseError(e.to_string())
        })?;

        Ok(user)
    }

    async fn update(&self, id: &UserId, update: UserUpdate) -> Result<Option<User>, AuthError> {
        // No changed fields, nothing to write
        if update.hashed_password.is_none()
            && update.reset_token.is_none()
            && update.reset_token_expires.is_none()
        {
            return self.find_by_id(id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        let mut fields = builder.separated(", ");

        if let Some(hash) = update.hashed_password {
            fields.push("hashed_password = ").push_bind_unseparated(hash);
        }
        if let Some(token) = update.reset_token {
            fields.push("reset_token = ").push_bind_unseparated(token);
        }
        if let Some(expires) = update.reset_token_expires {
            fields
                .push("reset_token_expires = ")
                .push_bind_unseparated(expires);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id.0);
        builder.push(
            " RETURNING id, name, surname, email, age, phone, role, hashed_password, disabled, \
             reset_token, reset_token_expires",
        );

        let row = builder
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        row.map(UserRow::try_into_user).transpose()
    }
}
