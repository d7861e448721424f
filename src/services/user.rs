// User domain service: account creation/mutation plus the cached surname
// lookup the chat path leans on.

use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::user::User;
use crate::services::cache::{cache_keys, ttl, CacheService};
use crate::services::{PooledConn, ServiceError};

pub struct UserService {
    pool: DieselPool,
    cache: CacheService,
}

impl UserService {
    pub fn new(pool: DieselPool, cache: CacheService) -> Self {
        Self { pool, cache }
    }

    async fn conn(&self) -> Result<PooledConn<'_>, ServiceError> {
        self.pool
            .get()
            .await
            .map_err(|e| ServiceError::Pool(e.to_string()))
    }

    pub async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
        surname: &str,
    ) -> Result<User, ServiceError> {
        let mut conn = self.conn().await?;
        Ok(User::create(&mut conn, email, hashed_password, surname).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User, ServiceError> {
        let mut conn = self.conn().await?;
        User::find_by_email(&mut conn, email)
            .await?
            .ok_or(ServiceError::NotFound("user"))
    }

    pub async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, ServiceError> {
        let mut conn = self.conn().await?;
        Ok(User::update_credentials(&mut conn, user_id, email, hashed_password).await?)
    }

    /// Cached surname lookup for chat attribution.
    pub async fn surname_by_id(&self, user_id: Uuid) -> Result<String, ServiceError> {
        let key = cache_keys::user_surname(user_id);
        if let Some(surname) = self.cache.get_json::<String>(&key).await {
            return Ok(surname);
        }

        let mut conn = self.conn().await?;
        let surname = User::surname_by_id(&mut conn, user_id)
            .await?
            .ok_or(ServiceError::NotFound("user"))?;

        self.cache.set_json(&key, &surname, ttl::SURNAME).await;
        Ok(surname)
    }
}
