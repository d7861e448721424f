// Refresh token database model
// Tokens are opaque 32-byte random hex strings, single-use and rotating:
// consuming one revokes it and issues a replacement.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::schema::refresh_tokens;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = refresh_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = refresh_tokens)]
struct NewRefreshToken<'a> {
    token: &'a str,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Valid iff not past expiry and not revoked.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }

    pub async fn store(
        conn: &mut AsyncPgConnection,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken, diesel::result::Error> {
        let now = Utc::now();
        diesel::insert_into(refresh_tokens::table)
            .values(&NewRefreshToken {
                token,
                user_id,
                expires_at,
                created_at: now,
                updated_at: now,
            })
            .get_result(conn)
            .await
    }

    pub async fn find(
        conn: &mut AsyncPgConnection,
        token: &str,
    ) -> Result<Option<RefreshToken>, diesel::result::Error> {
        refresh_tokens::table
            .find(token)
            .first(conn)
            .await
            .optional()
    }

    /// Mark a single token revoked. Returns the number of rows touched.
    pub async fn revoke(
        conn: &mut AsyncPgConnection,
        token: &str,
    ) -> Result<usize, diesel::result::Error> {
        let now = Utc::now();
        diesel::update(refresh_tokens::table.find(token))
            .set((
                refresh_tokens::revoked_at.eq(Some(now)),
                refresh_tokens::updated_at.eq(now),
            ))
            .execute(conn)
            .await
    }

    /// Revoke every live token belonging to a user (login steals the session).
    pub async fn revoke_all_for_user(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
    ) -> Result<usize, diesel::result::Error> {
        let now = Utc::now();
        diesel::update(
            refresh_tokens::table
                .filter(refresh_tokens::user_id.eq(user_id))
                .filter(refresh_tokens::revoked_at.is_null()),
        )
        .set((
            refresh_tokens::revoked_at.eq(Some(now)),
            refresh_tokens::updated_at.eq(now),
        ))
        .execute(conn)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token_at(expires_at: DateTime<Utc>, revoked_at: Option<DateTime<Utc>>) -> RefreshToken {
        let now = Utc::now();
        RefreshToken {
            token: "ab".repeat(32),
            user_id: Uuid::new_v4(),
            expires_at,
            revoked_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn validity_checks_expiry_and_revocation() {
        let now = Utc::now();

        let live = token_at(now + Duration::days(60), None);
        assert!(live.is_valid(now));

        let expired = token_at(now - Duration::seconds(1), None);
        assert!(!expired.is_valid(now));

        let revoked = token_at(now + Duration::days(60), Some(now));
        assert!(!revoked.is_valid(now));
    }
}
