use crate::{
    client::{DbClient, DbError, Result, is_unique_violation},
    record::GroupRecord,
};
use sqlx::{query, query_as, query_scalar};
use tracing::info;
use yatube_common::model::{
    Id, ModelValidationError,
    group::{CreateGroup, Group, GroupMarker, GroupSlug},
};

impl DbClient {
    pub async fn create_group(&self, group: &CreateGroup) -> Result<Id<GroupMarker>> {
        group.validate().map_err(ModelValidationError::from)?;
        let group_snowflake = self.next_snowflake_i64()?;

        let returned_snowflake = query_scalar::<_, i64>(
            "
            INSERT INTO post_groups (group_snowflake, title, slug, description)
            VALUES (?, ?, ?, ?)
            RETURNING group_snowflake
            ",
        )
        .bind(group_snowflake)
        .bind(&group.title)
        .bind(group.slug.get())
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                DbError::SlugTaken(group.slug.get().to_owned())
            } else {
                err.into()
            }
        })?;

        info!(slug = %group.slug, "Created group");
        Ok(returned_snowflake.cast_unsigned().into())
    }

    pub async fn fetch_group(&self, group_id: Id<GroupMarker>) -> Result<Option<Group>> {
        let record = query_as::<_, GroupRecord>(
            "
            SELECT
                post_groups.group_snowflake,
                post_groups.title,
                post_groups.slug,
                post_groups.description
            FROM
                post_groups
            WHERE
                post_groups.group_snowflake = ?
            ",
        )
        .bind(group_id.snowflake().get().cast_signed())
        .fetch_optional(&self.pool)
        .await?;

        let group = record.map(Group::try_from).transpose()?;
        Ok(group)
    }

    pub async fn fetch_group_by_slug(&self, slug: &GroupSlug) -> Result<Option<Group>> {
        let record = query_as::<_, GroupRecord>(
            "
            SELECT
                post_groups.group_snowflake,
                post_groups.title,
                post_groups.slug,
                post_groups.description
            FROM
                post_groups
            WHERE
                post_groups.slug = ?
            ",
        )
        .bind(slug.get())
        .fetch_optional(&self.pool)
        .await?;

        let group = record.map(Group::try_from).transpose()?;
        Ok(group)
    }

    /// All groups, for the group choice on the post form.
    pub async fn fetch_groups(&self) -> Result<Vec<Group>> {
        let records = query_as::<_, GroupRecord>(
            "
            SELECT
                post_groups.group_snowflake,
                post_groups.title,
                post_groups.slug,
                post_groups.description
            FROM
                post_groups
            ORDER BY
                post_groups.title, post_groups.group_snowflake
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let groups = records
            .into_iter()
            .map(Group::try_from)
            .collect::<Result<_, _>>()?;
        Ok(groups)
    }

    /// Posts of the group stay, with their group cleared.
    pub async fn delete_group(&self, slug: &GroupSlug) -> Result<bool> {
        let result = query(
            "
            DELETE FROM post_groups
            WHERE slug = ?
            ",
        )
        .bind(slug.get())
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(%slug, "Deleted group");
        }
        Ok(deleted)
    }
}
