//! # User Repository
//!
//! Accounts, profiles and the actor lookup used by authentication.
//!
//! ## One Profile Per User
//! ```text
//! register ──► BEGIN
//!              INSERT users     (UNIQUE username, UNIQUE email)
//!              INSERT profiles  (PRIMARY KEY user_id)
//!              COMMIT           (either both rows exist or neither)
//! ```
//! Administrative accounts created by the seed tool have no profile row.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use coderr_core::accounts::ProfilePatch;
use coderr_core::{Actor, Profile, ProfileKind};

/// Data needed to create an account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// Stored credentials of one account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CredentialsRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ActorRecord {
    id: i64,
    is_staff: bool,
    kind: Option<ProfileKind>,
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRecord {
    user_id: i64,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    kind: ProfileKind,
    file: String,
    location: String,
    tel: String,
    description: String,
    working_hours: String,
    created_at: DateTime<Utc>,
}

impl From<ProfileRecord> for Profile {
    fn from(r: ProfileRecord) -> Self {
        Profile {
            user_id: r.user_id,
            username: r.username,
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            kind: r.kind,
            file: r.file,
            location: r.location,
            tel: r.tel,
            description: r.description,
            working_hours: r.working_hours,
            created_at: r.created_at,
        }
    }
}

const PROFILE_SELECT: &str = r#"
    SELECT
        u.id AS user_id,
        u.username,
        u.first_name,
        u.last_name,
        u.email,
        p.type AS kind,
        p.file,
        p.location,
        p.tel,
        p.description,
        p.working_hours,
        p.created_at
    FROM profiles p
    JOIN users u ON u.id = p.user_id
"#;

/// Repository for users and their profiles.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates a user and its profile in one transaction.
    ///
    /// ## Returns
    /// The new user id. A taken username or email fails with
    /// [`DbError::UniqueViolation`] and nothing is written.
    pub async fn create_account(&self, user: &NewUserRecord, kind: ProfileKind) -> DbResult<i64> {
        debug!(username = %user.username, kind = %kind, "Creating account");
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let user_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name, is_staff, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO profiles (user_id, type, created_at) VALUES (?1, ?2, ?3)")
            .bind(user_id)
            .bind(kind)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user_id)
    }

    /// Creates an administrative account without a profile.
    pub async fn create_staff(&self, user: &NewUserRecord) -> DbResult<i64> {
        debug!(username = %user.username, "Creating staff account");

        let user_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name, is_staff, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user_id)
    }

    /// Looks up login credentials by username.
    pub async fn find_credentials(&self, username: &str) -> DbResult<Option<CredentialsRecord>> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, username, email, password_hash FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Loads the identity and role of a user.
    pub async fn get_actor(&self, user_id: i64) -> DbResult<Option<Actor>> {
        let record = sqlx::query_as::<_, ActorRecord>(
            r#"
            SELECT u.id, u.is_staff, p.type AS kind
            FROM users u
            LEFT JOIN profiles p ON p.user_id = u.id
            WHERE u.id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(|r| Actor {
            user_id: r.id,
            kind: r.kind,
            is_staff: r.is_staff,
        }))
    }

    /// The profile type of a user, if the user has a profile.
    pub async fn profile_kind(&self, user_id: i64) -> DbResult<Option<ProfileKind>> {
        let kind = sqlx::query_scalar::<_, ProfileKind>("SELECT type FROM profiles WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(kind)
    }

    /// Gets a user's profile joined with its account fields.
    pub async fn get_profile(&self, user_id: i64) -> DbResult<Option<Profile>> {
        let sql = format!("{PROFILE_SELECT} WHERE p.user_id = ?1");
        let record = sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Profile::from))
    }

    /// Applies a profile patch to the user and profile rows in one transaction.
    ///
    /// Only supplied fields change; `type` and `username` are never written.
    pub async fn update_profile(&self, user_id: i64, patch: &ProfilePatch) -> DbResult<Profile> {
        debug!(user_id, "Updating profile");

        let mut tx = self.pool.begin().await?;

        let users = sqlx::query(
            r#"
            UPDATE users SET
                first_name = COALESCE(?2, first_name),
                last_name  = COALESCE(?3, last_name),
                email      = COALESCE(?4, email)
            WHERE id = ?1
            "#,
        )
        .bind(user_id)
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(&patch.email)
        .execute(&mut *tx)
        .await?;

        let profiles = sqlx::query(
            r#"
            UPDATE profiles SET
                file          = COALESCE(?2, file),
                location      = COALESCE(?3, location),
                tel           = COALESCE(?4, tel),
                description   = COALESCE(?5, description),
                working_hours = COALESCE(?6, working_hours)
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .bind(&patch.file)
        .bind(&patch.location)
        .bind(&patch.tel)
        .bind(&patch.description)
        .bind(&patch.working_hours)
        .execute(&mut *tx)
        .await?;

        if users.rows_affected() == 0 || profiles.rows_affected() == 0 {
            return Err(DbError::not_found("Profile", user_id));
        }

        let sql = format!("{PROFILE_SELECT} WHERE p.user_id = ?1");
        let record = sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(record.into())
    }

    /// Lists all profiles of one type, ordered by username.
    pub async fn list_profiles(&self, kind: ProfileKind) -> DbResult<Vec<Profile>> {
        let sql = format!("{PROFILE_SELECT} WHERE p.type = ?1 ORDER BY u.username");
        let records = sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(kind)
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(Profile::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn user(name: &str) -> NewUserRecord {
        NewUserRecord {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "hash".to_string(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_account_creates_profile() {
        let db = setup().await;
        let id = db
            .users()
            .create_account(&user("anna"), ProfileKind::Business)
            .await
            .unwrap();

        let actor = db.users().get_actor(id).await.unwrap().unwrap();
        assert_eq!(actor, Actor::business(id));

        let profile = db.users().get_profile(id).await.unwrap().unwrap();
        assert_eq!(profile.username, "anna");
        assert_eq!(profile.kind, ProfileKind::Business);
    }

    #[tokio::test]
    async fn test_duplicate_username_writes_nothing() {
        let db = setup().await;
        db.users()
            .create_account(&user("anna"), ProfileKind::Customer)
            .await
            .unwrap();

        let mut dup = user("anna");
        dup.email = "other@example.com".to_string();
        let err = db
            .users()
            .create_account(&dup, ProfileKind::Business)
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("users"));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_staff_has_no_profile() {
        let db = setup().await;
        let id = db.users().create_staff(&user("admin")).await.unwrap();

        let actor = db.users().get_actor(id).await.unwrap().unwrap();
        assert!(actor.is_staff);
        assert_eq!(actor.kind, None);
        assert!(db.users().get_profile(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_profile_merges_supplied_fields() {
        let db = setup().await;
        let id = db
            .users()
            .create_account(&user("anna"), ProfileKind::Business)
            .await
            .unwrap();

        let patch = ProfilePatch {
            first_name: Some("Anna".to_string()),
            location: Some("Berlin".to_string()),
            ..Default::default()
        };
        let profile = db.users().update_profile(id, &patch).await.unwrap();
        assert_eq!(profile.first_name, "Anna");
        assert_eq!(profile.location, "Berlin");
        assert_eq!(profile.email, "anna@example.com");
        assert_eq!(profile.kind, ProfileKind::Business);
    }

    #[tokio::test]
    async fn test_profile_type_is_immutable_in_storage() {
        let db = setup().await;
        let id = db
            .users()
            .create_account(&user("anna"), ProfileKind::Customer)
            .await
            .unwrap();

        let err = sqlx::query("UPDATE profiles SET type = 'business' WHERE user_id = ?1")
            .bind(id)
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_profiles_by_type() {
        let db = setup().await;
        db.users().create_account(&user("zoe"), ProfileKind::Business).await.unwrap();
        db.users().create_account(&user("bert"), ProfileKind::Business).await.unwrap();
        db.users().create_account(&user("carl"), ProfileKind::Customer).await.unwrap();

        let business = db.users().list_profiles(ProfileKind::Business).await.unwrap();
        let names: Vec<&str> = business.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["bert", "zoe"]);

        let customers = db.users().list_profiles(ProfileKind::Customer).await.unwrap();
        assert_eq!(customers.len(), 1);
    }

    #[tokio::test]
    async fn test_find_credentials() {
        let db = setup().await;
        db.users().create_account(&user("anna"), ProfileKind::Customer).await.unwrap();

        let creds = db.users().find_credentials("anna").await.unwrap().unwrap();
        assert_eq!(creds.email, "anna@example.com");
        assert!(db.users().find_credentials("nobody").await.unwrap().is_none());
    }
}
