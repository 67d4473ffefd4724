use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreResult};
use crate::db::pool::health_check;
use crate::models::{
    project::{CreateProject, Project, ProjectWithRole, UpdateProject},
    project_member::{CreateProjectMember, MemberWithUser, ProjectMember},
    role::MemberRole,
    sprint::{CreateSprint, Sprint, UpdateSprint},
    user::{CreateUser, User},
};

/// [`Store`] backed by PostgreSQL through the model queries
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn claim_user(
        &self,
        id: Uuid,
        password_hash: &str,
        name: Option<String>,
    ) -> StoreResult<Option<User>> {
        Ok(User::claim(&self.pool, id, password_hash, name).await?)
    }

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        Ok(Project::create(&self.pool, data).await?)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn project_owner(&self, id: Uuid) -> StoreResult<Option<Uuid>> {
        Ok(Project::owner_id(&self.pool, id).await?)
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<ProjectWithRole>> {
        Ok(Project::list_for_user(&self.pool, user_id).await?)
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>> {
        Ok(Project::update(&self.pool, id, data).await?)
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Project::delete(&self.pool, id).await?)
    }

    async fn create_member(&self, data: CreateProjectMember) -> StoreResult<ProjectMember> {
        Ok(ProjectMember::create(&self.pool, data).await?)
    }

    async fn find_member(&self, id: Uuid) -> StoreResult<Option<ProjectMember>> {
        Ok(ProjectMember::find_by_id(&self.pool, id).await?)
    }

    async fn find_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<ProjectMember>> {
        Ok(ProjectMember::find(&self.pool, project_id, user_id).await?)
    }

    async fn list_members(&self, project_id: Uuid) -> StoreResult<Vec<MemberWithUser>> {
        Ok(ProjectMember::list_with_users(&self.pool, project_id).await?)
    }

    async fn update_member_role(
        &self,
        id: Uuid,
        role: MemberRole,
    ) -> StoreResult<Option<ProjectMember>> {
        Ok(ProjectMember::update_role(&self.pool, id, role).await?)
    }

    async fn delete_member(&self, id: Uuid) -> StoreResult<bool> {
        Ok(ProjectMember::delete(&self.pool, id).await?)
    }

    async fn create_sprint(&self, data: CreateSprint) -> StoreResult<Sprint> {
        Ok(Sprint::create(&self.pool, data).await?)
    }

    async fn find_sprint(&self, project_id: Uuid, id: Uuid) -> StoreResult<Option<Sprint>> {
        Ok(Sprint::find(&self.pool, project_id, id).await?)
    }

    async fn list_sprints(&self, project_id: Uuid) -> StoreResult<Vec<Sprint>> {
        Ok(Sprint::list_by_project(&self.pool, project_id).await?)
    }

    async fn update_sprint(
        &self,
        project_id: Uuid,
        id: Uuid,
        data: UpdateSprint,
    ) -> StoreResult<Option<Sprint>> {
        Ok(Sprint::update(&self.pool, project_id, id, data).await?)
    }

    async fn delete_sprint(&self, project_id: Uuid, id: Uuid) -> StoreResult<bool> {
        Ok(Sprint::delete(&self.pool, project_id, id).await?)
    }
}
