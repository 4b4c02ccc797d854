use crate::{
    client::{DbClient, DbError, Result, is_unique_violation},
    record::{CredentialsRecord, UserRecord},
};
use sqlx::{query_as, query_scalar};
use tracing::info;
use yatube_common::model::{
    Id,
    user::{CreateUser, Credentials, User, UserHandle, UserMarker},
};

impl DbClient {
    pub async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_snowflake,
                users.handle,
                users.first_name,
                users.last_name
            FROM
                users
            WHERE
                users.user_snowflake = ?
            ",
        )
        .bind(user_id.snowflake().get().cast_signed())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    pub async fn fetch_user_by_handle(&self, handle: &UserHandle) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_snowflake,
                users.handle,
                users.first_name,
                users.last_name
            FROM
                users
            WHERE
                users.handle = ?
            ",
        )
        .bind(handle.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    pub async fn fetch_credentials(&self, handle: &UserHandle) -> Result<Option<Credentials>> {
        let record = query_as::<_, CredentialsRecord>(
            "
            SELECT
                users.user_snowflake,
                users.handle,
                users.first_name,
                users.last_name,
                users.password_hash
            FROM
                users
            WHERE
                users.handle = ?
            ",
        )
        .bind(handle.get())
        .fetch_optional(&self.pool)
        .await?;

        let credentials = record.map(Credentials::try_from).transpose()?;
        Ok(credentials)
    }

    pub async fn create_user(&self, user: &CreateUser) -> Result<Id<UserMarker>> {
        let user_snowflake = self.next_snowflake_i64()?;

        let returned_snowflake = query_scalar::<_, i64>(
            "
            INSERT INTO users (user_snowflake, handle, first_name, last_name, email, password_hash)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING user_snowflake
            ",
        )
        .bind(user_snowflake)
        .bind(user.handle.get())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(user.password_hash.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                DbError::HandleTaken(user.handle.get().to_owned())
            } else {
                err.into()
            }
        })?;

        info!(handle = %user.handle, "Created user");
        Ok(returned_snowflake.cast_unsigned().into())
    }
}

#[cfg(test)]
mod tests {
    use crate::client::{DbClient, DbError};
    use yatube_common::model::{
        auth::PasswordHash,
        user::{CreateUser, UserHandle},
    };

    fn create_user(handle: &str) -> CreateUser {
        CreateUser {
            handle: UserHandle::new(handle.to_owned()).unwrap(),
            first_name: "Lev".to_owned(),
            last_name: "Tolstoy".to_owned(),
            email: String::new(),
            password_hash: PasswordHash::unusable(),
        }
    }

    #[tokio::test]
    async fn users_can_be_fetched_by_id_and_handle() {
        let db = DbClient::connect_in_memory().await.unwrap();
        let id = db.create_user(&create_user("leo")).await.unwrap();

        let by_id = db.fetch_user(id).await.unwrap().unwrap();
        assert_eq!(by_id.handle.get(), "leo");
        assert_eq!(by_id.display_name(), "Lev Tolstoy");

        let by_handle = db
            .fetch_user_by_handle(&by_id.handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_handle, by_id);

        let missing = UserHandle::new("nobody".to_owned()).unwrap();
        assert!(db.fetch_user_by_handle(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn handles_are_unique() {
        let db = DbClient::connect_in_memory().await.unwrap();
        db.create_user(&create_user("leo")).await.unwrap();

        let duplicate = db.create_user(&create_user("leo")).await;
        assert!(matches!(duplicate, Err(DbError::HandleTaken(handle)) if handle == "leo"));
    }

    #[tokio::test]
    async fn credentials_carry_the_stored_hash() {
        let db = DbClient::connect_in_memory().await.unwrap();
        let mut user = create_user("leo");
        user.password_hash = PasswordHash::from_stored("stored-phc".to_owned());
        db.create_user(&user).await.unwrap();

        let credentials = db
            .fetch_credentials(&user.handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(credentials.password_hash.as_str(), "stored-phc");
        assert_eq!(credentials.user.handle, user.handle);
    }
}
