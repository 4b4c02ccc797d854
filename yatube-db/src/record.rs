use sqlx::FromRow;
use time::{Duration, UtcDateTime};
use yatube_common::model::{
    ModelValidationError,
    auth::{Authentication, PasswordHash},
    comment::Comment,
    group::{Group, GroupRef, GroupSlug},
    post::{ImagePath, Post, PostContent},
    user::{Credentials, User, UserHandle},
};

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_snowflake: i64,
    pub handle: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct CredentialsRecord {
    #[sqlx(flatten)]
    pub user: UserRecord,
    pub password_hash: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct GroupRecord {
    pub group_snowflake: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub post_snowflake: i64,
    pub text: String,
    pub theme: String,
    pub image: Option<String>,
    #[sqlx(flatten)]
    pub author: UserRecord,
    pub group_snowflake: Option<i64>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct CommentRecord {
    pub comment_snowflake: i64,
    pub text: String,
    pub post_snowflake: Option<i64>,
    #[sqlx(flatten)]
    pub author: UserRecord,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct AuthenticationRecord {
    pub user_snowflake: i64,
    pub token_hash: Vec<u8>,
    pub created_at: i64,
    pub expires_after_seconds: Option<i64>,
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_snowflake.cast_unsigned().into(),
            handle: UserHandle::new(value.handle)?,
            first_name: value.first_name,
            last_name: value.last_name,
        })
    }
}

impl TryFrom<CredentialsRecord> for Credentials {
    type Error = ModelValidationError;

    fn try_from(value: CredentialsRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: value.user.try_into()?,
            password_hash: PasswordHash::from_stored(value.password_hash),
        })
    }
}

impl TryFrom<GroupRecord> for Group {
    type Error = ModelValidationError;

    fn try_from(value: GroupRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.group_snowflake.cast_unsigned().into(),
            title: value.title,
            slug: GroupSlug::new(value.slug)?,
            description: value.description,
        })
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        // The LEFT JOIN yields either all group columns or none.
        let group = match (value.group_snowflake, value.group_title, value.group_slug) {
            (Some(group_snowflake), Some(title), Some(slug)) => Some(GroupRef {
                id: group_snowflake.cast_unsigned().into(),
                title,
                slug: GroupSlug::new(slug)?,
            }),
            _ => None,
        };

        Ok(Self {
            id: value.post_snowflake.cast_unsigned().into(),
            author: value.author.try_into()?,
            group,
            content: PostContent {
                text: value.text,
                theme: value.theme,
            },
            image: value.image.map(ImagePath::new).transpose()?,
        })
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.comment_snowflake.cast_unsigned().into(),
            author: value.author.try_into()?,
            post: value
                .post_snowflake
                .map(|post_snowflake| post_snowflake.cast_unsigned().into()),
            text: value.text,
        })
    }
}

impl TryFrom<AuthenticationRecord> for Authentication {
    type Error = ModelValidationError;

    fn try_from(value: AuthenticationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: value.user_snowflake.cast_unsigned().into(),
            token_hash: value.token_hash.try_into()?,
            created_at: UtcDateTime::from_unix_timestamp(value.created_at)?,
            expires_after: value
                .expires_after_seconds
                .map(|seconds| Duration::seconds(seconds).try_into())
                .transpose()?,
        })
    }
}
