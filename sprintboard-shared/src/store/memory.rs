use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Store, StoreError, StoreResult, PROJECT_MEMBERS_PROJECT_USER_KEY, SPRINTS_PROJECT_TITLE_KEY,
    USERS_EMAIL_KEY,
};
use crate::models::{
    project::{CreateProject, Project, ProjectWithRole, UpdateProject},
    project_member::{CreateProjectMember, MemberWithUser, ProjectMember},
    role::{MemberRole, ProjectRole},
    sprint::{CreateSprint, Sprint, UpdateSprint},
    user::{CreateUser, User},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    projects: Vec<Project>,
    members: Vec<ProjectMember>,
    sprints: Vec<Sprint>,
}

impl Tables {
    fn user_exists(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn project_exists(&self, id: Uuid) -> bool {
        self.projects.iter().any(|p| p.id == id)
    }

    fn sprint_title_taken(&self, project_id: Uuid, title: &str, except: Option<Uuid>) -> bool {
        self.sprints
            .iter()
            .any(|s| s.project_id == project_id && s.title == title && Some(s.id) != except)
    }
}

/// In-process [`Store`] with the same constraints as the PostgreSQL schema
///
/// Rows are kept in insertion order; ties on timestamps resolve to that
/// order. Deleting a project cascades to its memberships and sprints.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        if tables
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&data.email))
        {
            return Err(StoreError::UniqueViolation(USERS_EMAIL_KEY.to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            password_hash: data.password_hash,
            name: data.name,
            image: data.image,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn claim_user(
        &self,
        id: Uuid,
        password_hash: &str,
        name: Option<String>,
    ) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;

        let Some(user) = tables
            .users
            .iter_mut()
            .find(|u| u.id == id && u.password_hash.is_none())
        else {
            return Ok(None);
        };

        user.password_hash = Some(password_hash.to_string());
        if name.is_some() {
            user.name = name;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        let mut tables = self.tables.write().await;

        if !tables.user_exists(data.owner_id) {
            return Err(StoreError::ForeignKeyViolation("projects_owner_id_fkey".to_string()));
        }

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            name: data.name,
            description: data.description,
            created_at: now,
            updated_at: now,
        };
        tables.projects.push(project.clone());

        Ok(project)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn project_owner(&self, id: Uuid) -> StoreResult<Option<Uuid>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.id == id).map(|p| p.owner_id))
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<ProjectWithRole>> {
        let tables = self.tables.read().await;

        let mut projects: Vec<ProjectWithRole> = tables
            .projects
            .iter()
            .rev()
            .filter_map(|project| {
                let role = if project.owner_id == user_id {
                    ProjectRole::Owner
                } else {
                    tables
                        .members
                        .iter()
                        .find(|m| m.project_id == project.id && m.user_id == user_id)
                        .map(|m| ProjectRole::from(m.role))?
                };

                Some(ProjectWithRole {
                    project: project.clone(),
                    role,
                })
            })
            .collect();

        projects.sort_by(|a, b| b.project.updated_at.cmp(&a.project.updated_at));
        Ok(projects)
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>> {
        let mut tables = self.tables.write().await;

        let Some(project) = tables.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            project.name = name;
        }
        if let Some(description) = data.description {
            project.description = description;
        }
        project.updated_at = Utc::now();

        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        let before = tables.projects.len();
        tables.projects.retain(|p| p.id != id);
        if tables.projects.len() == before {
            return Ok(false);
        }

        tables.members.retain(|m| m.project_id != id);
        tables.sprints.retain(|s| s.project_id != id);

        Ok(true)
    }

    async fn create_member(&self, data: CreateProjectMember) -> StoreResult<ProjectMember> {
        let mut tables = self.tables.write().await;

        if !tables.project_exists(data.project_id) {
            return Err(StoreError::ForeignKeyViolation(
                "project_members_project_id_fkey".to_string(),
            ));
        }
        if !tables.user_exists(data.user_id) {
            return Err(StoreError::ForeignKeyViolation(
                "project_members_user_id_fkey".to_string(),
            ));
        }
        if tables
            .members
            .iter()
            .any(|m| m.project_id == data.project_id && m.user_id == data.user_id)
        {
            return Err(StoreError::UniqueViolation(
                PROJECT_MEMBERS_PROJECT_USER_KEY.to_string(),
            ));
        }

        let now = Utc::now();
        let member = ProjectMember {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            user_id: data.user_id,
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        tables.members.push(member.clone());

        Ok(member)
    }

    async fn find_member(&self, id: Uuid) -> StoreResult<Option<ProjectMember>> {
        let tables = self.tables.read().await;
        Ok(tables.members.iter().find(|m| m.id == id).cloned())
    }

    async fn find_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<ProjectMember>> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_members(&self, project_id: Uuid) -> StoreResult<Vec<MemberWithUser>> {
        let tables = self.tables.read().await;

        let mut members: Vec<MemberWithUser> = tables
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .filter_map(|member| {
                let user = tables.users.iter().find(|u| u.id == member.user_id)?;
                Some(MemberWithUser {
                    member: member.clone(),
                    email: user.email.clone(),
                    name: user.name.clone(),
                    image: user.image.clone(),
                })
            })
            .collect();

        members.sort_by(|a, b| a.member.created_at.cmp(&b.member.created_at));
        Ok(members)
    }

    async fn update_member_role(
        &self,
        id: Uuid,
        role: MemberRole,
    ) -> StoreResult<Option<ProjectMember>> {
        let mut tables = self.tables.write().await;

        Ok(tables.members.iter_mut().find(|m| m.id == id).map(|member| {
            member.role = role;
            member.updated_at = Utc::now();
            member.clone()
        }))
    }

    async fn delete_member(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        let before = tables.members.len();
        tables.members.retain(|m| m.id != id);
        Ok(tables.members.len() < before)
    }

    async fn create_sprint(&self, data: CreateSprint) -> StoreResult<Sprint> {
        let mut tables = self.tables.write().await;

        if !tables.project_exists(data.project_id) {
            return Err(StoreError::ForeignKeyViolation("sprints_project_id_fkey".to_string()));
        }
        if tables.sprint_title_taken(data.project_id, &data.title, None) {
            return Err(StoreError::UniqueViolation(SPRINTS_PROJECT_TITLE_KEY.to_string()));
        }

        let now = Utc::now();
        let sprint = Sprint {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            title: data.title,
            start_date: data.start_date,
            end_date: data.end_date,
            created_at: now,
            updated_at: now,
        };
        tables.sprints.push(sprint.clone());

        Ok(sprint)
    }

    async fn find_sprint(&self, project_id: Uuid, id: Uuid) -> StoreResult<Option<Sprint>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sprints
            .iter()
            .find(|s| s.id == id && s.project_id == project_id)
            .cloned())
    }

    async fn list_sprints(&self, project_id: Uuid) -> StoreResult<Vec<Sprint>> {
        let tables = self.tables.read().await;

        let mut sprints: Vec<Sprint> = tables
            .sprints
            .iter()
            .rev()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect();

        sprints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sprints)
    }

    async fn update_sprint(
        &self,
        project_id: Uuid,
        id: Uuid,
        data: UpdateSprint,
    ) -> StoreResult<Option<Sprint>> {
        let mut tables = self.tables.write().await;

        if let Some(title) = &data.title {
            if tables.sprint_title_taken(project_id, title, Some(id)) {
                return Err(StoreError::UniqueViolation(SPRINTS_PROJECT_TITLE_KEY.to_string()));
            }
        }

        let Some(sprint) = tables
            .sprints
            .iter_mut()
            .find(|s| s.id == id && s.project_id == project_id)
        else {
            return Ok(None);
        };

        *sprint = Sprint {
            updated_at: Utc::now(),
            ..data.apply_to(sprint)
        };

        Ok(Some(sprint.clone()))
    }

    async fn delete_sprint(&self, project_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        let before = tables.sprints.len();
        tables
            .sprints
            .retain(|s| !(s.id == id && s.project_id == project_id));
        Ok(tables.sprints.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: Some("$argon2id$test".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    async fn project(store: &MemoryStore, owner_id: Uuid, name: &str) -> Project {
        store
            .create_project(CreateProject {
                owner_id,
                name: name.to_string(),
                description: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_email_is_unique_case_insensitively() {
        let store = MemoryStore::new();
        user(&store, "ada@example.com").await;

        let err = store
            .create_user(CreateUser {
                email: "Ada@Example.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_unique(USERS_EMAIL_KEY));

        let found = store.find_user_by_email("ADA@EXAMPLE.COM").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_claim_only_placeholders() {
        let store = MemoryStore::new();
        let placeholder = store
            .create_user(CreateUser {
                email: "new@example.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let claimed = store
            .claim_user(placeholder.id, "$argon2id$hash", Some("New".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claimed.name.as_deref(), Some("New"));
        assert!(!claimed.is_placeholder());

        // Second claim finds no placeholder
        let again = store
            .claim_user(placeholder.id, "$argon2id$other", None)
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_membership_constraints() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let dev = user(&store, "dev@example.com").await;
        let p = project(&store, owner.id, "Apollo").await;

        let data = CreateProjectMember {
            project_id: p.id,
            user_id: dev.id,
            role: MemberRole::Developer,
        };
        store.create_member(data.clone()).await.unwrap();

        let err = store.create_member(data).await.unwrap_err();
        assert!(err.is_unique(PROJECT_MEMBERS_PROJECT_USER_KEY));

        let err = store
            .create_member(CreateProjectMember {
                project_id: Uuid::new_v4(),
                user_id: dev.id,
                role: MemberRole::Client,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn test_list_projects_for_user_with_roles() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice@example.com").await;
        let bob = user(&store, "bob@example.com").await;

        let owned = project(&store, alice.id, "Owned").await;
        let shared = project(&store, bob.id, "Shared").await;
        project(&store, bob.id, "Private").await;

        store
            .create_member(CreateProjectMember {
                project_id: shared.id,
                user_id: alice.id,
                role: MemberRole::Client,
            })
            .await
            .unwrap();

        let projects = store.list_projects_for_user(alice.id).await.unwrap();
        assert_eq!(projects.len(), 2);

        let role_of = |id: Uuid| projects.iter().find(|p| p.project.id == id).map(|p| p.role);
        assert_eq!(role_of(owned.id), Some(ProjectRole::Owner));
        assert_eq!(role_of(shared.id), Some(ProjectRole::Client));
    }

    #[tokio::test]
    async fn test_delete_project_cascades() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let dev = user(&store, "dev@example.com").await;
        let p = project(&store, owner.id, "Apollo").await;

        let member = store
            .create_member(CreateProjectMember {
                project_id: p.id,
                user_id: dev.id,
                role: MemberRole::Developer,
            })
            .await
            .unwrap();
        let sprint = store
            .create_sprint(CreateSprint {
                project_id: p.id,
                title: "Sprint 1".to_string(),
                start_date: None,
                end_date: None,
            })
            .await
            .unwrap();

        assert!(store.delete_project(p.id).await.unwrap());
        assert!(store.find_member(member.id).await.unwrap().is_none());
        assert!(store.find_sprint(p.id, sprint.id).await.unwrap().is_none());
        assert!(!store.delete_project(p.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_sprints_are_scoped_and_titles_unique() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let a = project(&store, owner.id, "A").await;
        let b = project(&store, owner.id, "B").await;

        let new_sprint = |project_id: Uuid, title: &str| CreateSprint {
            project_id,
            title: title.to_string(),
            start_date: None,
            end_date: None,
        };

        let first = store.create_sprint(new_sprint(a.id, "Sprint 1")).await.unwrap();
        let second = store.create_sprint(new_sprint(a.id, "Sprint 2")).await.unwrap();

        // Same title in another project is fine
        store.create_sprint(new_sprint(b.id, "Sprint 1")).await.unwrap();

        let err = store.create_sprint(new_sprint(a.id, "Sprint 1")).await.unwrap_err();
        assert!(err.is_unique(SPRINTS_PROJECT_TITLE_KEY));

        let err = store
            .update_sprint(
                a.id,
                second.id,
                UpdateSprint {
                    title: Some("Sprint 1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_unique(SPRINTS_PROJECT_TITLE_KEY));

        // Wrong project scope behaves as missing
        assert!(store.find_sprint(b.id, first.id).await.unwrap().is_none());
        assert!(!store.delete_sprint(b.id, first.id).await.unwrap());

        let listed = store.list_sprints(a.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
    }
}
