// User database model

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::schema::users;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub surname: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
struct NewUser<'a> {
    id: Uuid,
    email: &'a str,
    hashed_password: &'a str,
    surname: &'a str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    pub async fn create(
        conn: &mut AsyncPgConnection,
        email: &str,
        hashed_password: &str,
        surname: &str,
    ) -> Result<User, diesel::result::Error> {
        let now = Utc::now();
        diesel::insert_into(users::table)
            .values(&NewUser {
                id: Uuid::new_v4(),
                email,
                hashed_password,
                surname,
                created_at: now,
                updated_at: now,
            })
            .get_result(conn)
            .await
    }

    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
    ) -> Result<Option<User>, diesel::result::Error> {
        users::table
            .find(user_id)
            .first(conn)
            .await
            .optional()
    }

    pub async fn find_by_email(
        conn: &mut AsyncPgConnection,
        email: &str,
    ) -> Result<Option<User>, diesel::result::Error> {
        users::table
            .filter(users::email.eq(email))
            .first(conn)
            .await
            .optional()
    }

    pub async fn update_credentials(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, diesel::result::Error> {
        diesel::update(users::table.find(user_id))
            .set((
                users::email.eq(email),
                users::hashed_password.eq(hashed_password),
                users::updated_at.eq(Utc::now()),
            ))
            .get_result(conn)
            .await
    }

    pub async fn surname_by_id(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
    ) -> Result<Option<String>, diesel::result::Error> {
        users::table
            .find(user_id)
            .select(users::surname)
            .first(conn)
            .await
            .optional()
    }
}
