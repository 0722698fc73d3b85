use crate::db::{self, Database, DatabaseError};
use crate::models::{Group, GroupError, GroupKind, GroupMember, GroupRole};
use log::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum CreateGroupError {
    #[error(transparent)]
    Invalid(#[from] GroupError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub async fn create_group(
    database: &Database,
    name: &str,
    description: Option<&str>,
    kind: GroupKind,
    created_by: &str,
) -> Result<Group, CreateGroupError> {
    let group = Group::new(name, description, kind, created_by)?;
    database.create_group(&group).await?;
    info!("User {} created group {} ({})", created_by, group.name, group.id);
    Ok(group)
}

/// Adds `user_id` to a group, or returns the existing membership. The group's
/// creator always joins as admin.
pub async fn join_group(database: &Database, group_id: &str, user_id: &str) -> db::Result<GroupMember> {
    let group = database.get_group(group_id).await?;
    if let Some(existing) = database.get_membership(group_id, user_id).await? {
        return Ok(existing);
    }

    let role = if group.created_by == user_id {
        GroupRole::Admin
    } else {
        GroupRole::Member
    };
    let member = GroupMember::new(group_id, user_id, role);
    match database.add_member(&member).await {
        Ok(()) => {
            info!("User {} joined group {} as {}", user_id, group_id, role);
            Ok(member)
        }
        // Lost a race with a concurrent join
        Err(DatabaseError::DuplicateMember { .. }) => database
            .get_membership(group_id, user_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("membership of {} in {}", user_id, group_id))),
        Err(e) => Err(e),
    }
}

/// The caller's membership, or `None` for outsiders. A creator missing from
/// the member table is restored as admin.
pub async fn membership(database: &Database, group_id: &str, user_id: &str) -> db::Result<Option<GroupMember>> {
    if let Some(member) = database.get_membership(group_id, user_id).await? {
        return Ok(Some(member));
    }

    let group = database.get_group(group_id).await?;
    if group.created_by != user_id {
        warn!("User {} is not a member of group {}", user_id, group_id);
        return Ok(None);
    }
    join_group(database, group_id, user_id).await.map(Some)
}
