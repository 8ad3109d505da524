//! User models and credential store queries.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// Top-level partition of identities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AccessRole {
    /// Store staff with full administrative access
    Owner,
    /// Shopper with access to their own orders and profile
    Customer,
}

impl std::fmt::Display for AccessRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessRole::Owner => write!(f, "owner"),
            AccessRole::Customer => write!(f, "customer"),
        }
    }
}

impl std::str::FromStr for AccessRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(AccessRole::Owner),
            "customer" => Ok(AccessRole::Customer),
            _ => Err(format!("Unknown access role: {}", s)),
        }
    }
}

/// Classification within owner accounts. Stored and returned, not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum SystemRole {
    Admin,
    Staff,
}

impl std::str::FromStr for SystemRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(SystemRole::Admin),
            "Staff" => Ok(SystemRole::Staff),
            _ => Err(format!("Unknown system role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub access_role: AccessRole,
    pub system_role: Option<SystemRole>,
    pub avatar_url: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Public identity, never carries the password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub access_role: AccessRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_role: Option<SystemRole>,
    pub avatar_url: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            access_role: user.access_role,
            system_role: user.system_role,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub access_role: Option<String>,
    pub system_role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Identity plus a freshly signed bearer token
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

pub async fn find_user_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(db)
        .await
}

pub async fn find_user_by_id(db: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert_user(db: &SqlitePool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, access_role, system_role, avatar_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.access_role)
    .bind(user.system_role)
    .bind(&user.avatar_url)
    .bind(&user.created_at)
    .bind(&user.updated_at)
    .execute(db)
    .await?;

    Ok(())
}

/// Persist profile fields (name, email, password hash, avatar)
pub async fn update_user_profile(db: &SqlitePool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users SET
            name = ?,
            email = ?,
            password_hash = ?,
            avatar_url = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.avatar_url)
    .bind(&user.updated_at)
    .bind(&user.id)
    .execute(db)
    .await?;

    Ok(())
}

/// All users with `access_role = owner`
pub async fn list_owner_users(db: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE access_role = 'owner' ORDER BY created_at ASC",
    )
    .fetch_all(db)
    .await
}

/// Returns the number of rows removed
pub async fn delete_user(db: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_in_memory, now_timestamp};

    fn sample_user(email: &str, role: AccessRole) -> User {
        let now = now_timestamp();
        User {
            id: uuid::Uuid::new_v4().to_string(),
            name: "Alice".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            access_role: role,
            system_role: (role == AccessRole::Owner).then_some(SystemRole::Admin),
            avatar_url: "https://example.invalid/a.svg".to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[test]
    fn test_access_role_parse() {
        assert_eq!("owner".parse::<AccessRole>().unwrap(), AccessRole::Owner);
        assert_eq!("customer".parse::<AccessRole>().unwrap(), AccessRole::Customer);
        assert!("Owner".parse::<AccessRole>().is_err());
        assert_eq!(AccessRole::Owner.to_string(), "owner");
    }

    #[test]
    fn test_user_response_omits_missing_system_role() {
        let response = UserResponse::from(sample_user("c@x.com", AccessRole::Customer));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["accessRole"], "customer");
        assert!(json.get("systemRole").is_none());
        assert!(json.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_insert_and_find_roundtrip() {
        let pool = init_in_memory().await.unwrap();
        let user = sample_user("alice@x.com", AccessRole::Owner);
        insert_user(&pool, &user).await.unwrap();

        let found = find_user_by_email(&pool, "alice@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.access_role, AccessRole::Owner);
        assert_eq!(found.system_role, Some(SystemRole::Admin));

        assert!(find_user_by_id(&pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_email_is_unique() {
        let pool = init_in_memory().await.unwrap();
        insert_user(&pool, &sample_user("dup@x.com", AccessRole::Owner))
            .await
            .unwrap();

        let err = insert_user(&pool, &sample_user("dup@x.com", AccessRole::Customer))
            .await
            .unwrap_err();
        assert!(err
            .as_database_error()
            .map(|e| e.is_unique_violation())
            .unwrap_or(false));
    }

    #[tokio::test]
    async fn test_list_owner_users_excludes_customers() {
        let pool = init_in_memory().await.unwrap();
        insert_user(&pool, &sample_user("o@x.com", AccessRole::Owner))
            .await
            .unwrap();
        insert_user(&pool, &sample_user("c@x.com", AccessRole::Customer))
            .await
            .unwrap();

        let owners = list_owner_users(&pool).await.unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].email, "o@x.com");
    }
}
