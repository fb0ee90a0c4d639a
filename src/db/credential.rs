use sqlx::sqlite::SqlitePool;

/// Member role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::Member,
        }
    }
}

/// Account status. Only active accounts may log in or use admin routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Suspended => "suspended",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "inactive" => AccountStatus::Inactive,
            "suspended" => AccountStatus::Suspended,
            _ => AccountStatus::Active,
        }
    }
}

/// A member's authentication identity.
#[derive(Clone)]
pub struct Credential {
    pub id: i64,
    pub uuid: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub password_hash: String,
}

// The password hash must never reach logs, even through a Debug format.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("uuid", &self.uuid)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("status", &self.status)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: i64,
    uuid: String,
    name: String,
    email: String,
    role: String,
    status: String,
    password_hash: String,
}

impl From<CredentialRow> for Credential {
    fn from(row: CredentialRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            name: row.name,
            email: row.email,
            role: Role::from_str(&row.role),
            status: AccountStatus::from_str(&row.status),
            password_hash: row.password_hash,
        }
    }
}

/// Public member summary for the admin panel. Does not expose internal
/// database IDs or password hashes.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CredentialSummary {
    pub uuid: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct CredentialSummaryRow {
    uuid: String,
    name: String,
    email: String,
    role: String,
    status: String,
    created_at: String,
}

impl From<CredentialSummaryRow> for CredentialSummary {
    fn from(row: CredentialSummaryRow) -> Self {
        Self {
            uuid: row.uuid,
            name: row.name,
            email: row.email,
            role: Role::from_str(&row.role),
            status: AccountStatus::from_str(&row.status),
            created_at: row.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, uuid, name, email, role, status, password_hash";

/// Credential store over the members table. The auth middleware only reads
/// from it; mutations come from the admin and self-service handlers.
#[derive(Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
}

impl CredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new active member credential. Returns the internal ID.
    pub async fn create(
        &self,
        uuid: &str,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO members (uuid, name, email, password_hash) VALUES (?, ?, ?, ?)",
        )
        .bind(uuid)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Create a new active admin credential. Returns the internal ID.
    pub async fn create_admin(
        &self,
        uuid: &str,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO members (uuid, name, email, password_hash, role) VALUES (?, ?, ?, ?, 'admin')",
        )
        .bind(uuid)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Look up a credential by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, sqlx::Error> {
        let row: Option<CredentialRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
            "SELECT {} FROM members WHERE email = ?",
            SELECT_COLUMNS
        )))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Credential::from))
    }

    /// Look up a credential by subject UUID.
    pub async fn find_by_uuid(&self, uuid: &str) -> Result<Option<Credential>, sqlx::Error> {
        let row: Option<CredentialRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
            "SELECT {} FROM members WHERE uuid = ?",
            SELECT_COLUMNS
        )))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Credential::from))
    }

    /// Set the role for a member. Returns false if the UUID is unknown.
    pub async fn set_role(&self, uuid: &str, role: Role) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE members SET role = ? WHERE uuid = ?")
            .bind(role.as_str())
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the account status for a member. Returns false if the UUID is unknown.
    pub async fn set_status(&self, uuid: &str, status: AccountStatus) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE members SET status = ? WHERE uuid = ?")
            .bind(status.as_str())
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace a member's password hash. Returns false if the UUID is unknown.
    pub async fn set_password_hash(
        &self,
        uuid: &str,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE members SET password_hash = ? WHERE uuid = ?")
            .bind(password_hash)
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Check whether an email is free to register.
    pub async fn email_available(&self, email: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) = sqlx::query_as("SELECT COUNT(*) FROM members WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 == 0)
    }

    /// List all members for the admin panel. Does not expose internal IDs.
    pub async fn list(&self) -> Result<Vec<CredentialSummary>, sqlx::Error> {
        let rows: Vec<CredentialSummaryRow> = sqlx::query_as(
            "SELECT uuid, name, email, role, status, created_at FROM members ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CredentialSummary::from).collect())
    }
}
