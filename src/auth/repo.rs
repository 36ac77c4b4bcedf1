use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// User record as stored. The hash never serializes.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date_of_birth: Date,
    pub city: String,
    pub gender: String,
    pub role: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub date_of_birth: Date,
    pub city: String,
    pub gender: String,
    pub role: String,
}

/// Client-updatable profile fields. Password and role have no slot here;
/// they are only written at account creation.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<Date>,
    pub city: Option<String>,
    pub gender: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.date_of_birth.is_none()
            && self.city.is_none()
            && self.gender.is_none()
    }
}

/// Credential store: persistent user records keyed by unique email.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    async fn create(&self, new_user: NewUser) -> anyhow::Result<User>;

    /// Applies the present patch fields, returning the updated record, or
    /// `None` when the id no longer resolves.
    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> anyhow::Result<Option<User>>;
}

const USER_COLUMNS: &str =
    "id, full_name, phone, email, password_hash, date_of_birth, city, gender, role, created_at";

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users
                (full_name, phone, email, password_hash, date_of_birth, city, gender, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.full_name)
        .bind(&new_user.phone)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.date_of_birth)
        .bind(&new_user.city)
        .bind(&new_user.gender)
        .bind(&new_user.role)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                email = COALESCE($4, email),
                date_of_birth = COALESCE($5, date_of_birth),
                city = COALESCE($6, city),
                gender = COALESCE($7, gender)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.full_name)
        .bind(patch.phone)
        .bind(patch.email)
        .bind(patch.date_of_birth)
        .bind(patch.city)
        .bind(patch.gender)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}

/// In-memory binding for tests, scoped to the instance.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().expect("user store mutex poisoned");
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().expect("user store mutex poisoned");
        Ok(users.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> anyhow::Result<User> {
        let mut users = self.users.lock().expect("user store mutex poisoned");
        if users.values().any(|u| u.email == new_user.email) {
            anyhow::bail!("duplicate email: {}", new_user.email);
        }
        let user = User {
            id: Uuid::new_v4(),
            full_name: new_user.full_name,
            phone: new_user.phone,
            email: new_user.email,
            password_hash: new_user.password_hash,
            date_of_birth: new_user.date_of_birth,
            city: new_user.city,
            gender: new_user.gender,
            role: new_user.role,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().expect("user store mutex poisoned");
        if let Some(email) = &patch.email {
            if users.values().any(|u| u.email == *email && u.id != id) {
                anyhow::bail!("duplicate email: {email}");
            }
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(full_name) = patch.full_name {
            user.full_name = full_name;
        }
        if let Some(phone) = patch.phone {
            user.phone = phone;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(date_of_birth) = patch.date_of_birth {
            user.date_of_birth = date_of_birth;
        }
        if let Some(city) = patch.city {
            user.city = city;
        }
        if let Some(gender) = patch.gender {
            user.gender = gender;
        }
        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
impl User {
    pub(crate) fn test_fixture() -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: "Ada Lovelace".into(),
            phone: "+628123456789".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$fake".into(),
            date_of_birth: time::macros::date!(1990 - 12 - 10),
            city: "Jakarta".into(),
            gender: "female".into(),
            role: "client".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}
