use {
    async_trait::async_trait,
    genolink_oauth::OAuthTokens,
    secrecy::{ExposeSecret, Secret},
};

use crate::{
    record::{ApiBase, CredentialRecord},
    store::CredentialStore,
};

/// SQLite-backed credential store.
pub struct SqliteCredentialStore {
    pool: sqlx::SqlitePool,
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    user_id: String,
    access_token: String,
    refresh_token: String,
    expire_at: i64,
    api_base: String,
    /// Space-delimited profile ids.
    profiles: String,
}

impl TryFrom<CredentialRow> for CredentialRecord {
    type Error = anyhow::Error;

    fn try_from(r: CredentialRow) -> anyhow::Result<Self> {
        let tokens = OAuthTokens {
            access_token: Secret::new(r.access_token),
            refresh_token: Secret::new(r.refresh_token),
            expires_at: u64::try_from(r.expire_at).unwrap_or_default(),
        };
        let profiles = r.profiles.split_whitespace().map(str::to_string).collect();
        Ok(Self::provisioned(
            r.user_id,
            tokens,
            r.api_base.parse::<ApiBase>()?,
            profiles,
        ))
    }
}

impl SqliteCredentialStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) a database file and ensure the schema.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = url
            .parse::<sqlx::sqlite::SqliteConnectOptions>()?
            .create_if_missing(true);
        let pool = sqlx::SqlitePool::connect_with(options).await?;
        Self::init(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Create the `credentials` table if it doesn't exist.
    pub async fn init(pool: &sqlx::SqlitePool) -> anyhow::Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS credentials (
                user_id       TEXT PRIMARY KEY,
                access_token  TEXT NOT NULL,
                refresh_token TEXT NOT NULL,
                expire_at     INTEGER NOT NULL,
                api_base      TEXT NOT NULL,
                profiles      TEXT NOT NULL DEFAULT ''
            )"#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn get(&self, user_id: &str) -> anyhow::Result<Option<CredentialRecord>> {
        let row =
            sqlx::query_as::<_, CredentialRow>("SELECT * FROM credentials WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(CredentialRecord::try_from).transpose()
    }

    async fn save(&self, record: &CredentialRecord) -> anyhow::Result<()> {
        let expire_at = i64::try_from(record.expires_at()).unwrap_or(i64::MAX);
        sqlx::query(
            r#"INSERT INTO credentials
                 (user_id, access_token, refresh_token, expire_at, api_base, profiles)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                 access_token  = excluded.access_token,
                 refresh_token = excluded.refresh_token,
                 expire_at     = excluded.expire_at,
                 api_base      = excluded.api_base,
                 profiles      = excluded.profiles"#,
        )
        .bind(record.user_id())
        .bind(record.access_token().expose_secret().as_str())
        .bind(record.refresh_token().expose_secret().as_str())
        .bind(expire_at)
        .bind(record.api_base().as_str())
        .bind(record.profiles().join(" "))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
