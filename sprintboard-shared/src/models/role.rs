/// Project roles
///
/// Two closed sets:
///
/// - [`MemberRole`] is what a `project_members` row stores (`ADMIN`,
///   `DEVELOPER`, `CLIENT`).
/// - [`ProjectRole`] is a caller's effective role on a project. It adds the
///   synthetic `OWNER`, which is derived from `projects.owner_id` and never
///   persisted.
///
/// ```sql
/// CREATE TYPE member_role AS ENUM ('ADMIN', 'DEVELOPER', 'CLIENT');
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role stored on a membership row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberRole {
    /// Can invite, re-role and remove members
    Admin,

    /// Regular collaborator
    Developer,

    /// External stakeholder
    Client,
}

impl MemberRole {
    /// Wire/database spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "ADMIN",
            MemberRole::Developer => "DEVELOPER",
            MemberRole::Client => "CLIENT",
        }
    }

    /// Capitalized name for human-facing text ("Developer")
    pub fn display_name(&self) -> &'static str {
        match self {
            MemberRole::Admin => "Admin",
            MemberRole::Developer => "Developer",
            MemberRole::Client => "Client",
        }
    }

    pub fn can_manage_members(&self) -> bool {
        matches!(self, MemberRole::Admin)
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the assignable roles
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Role must be ADMIN, DEVELOPER, or CLIENT (got {0:?})")]
pub struct InvalidRole(pub String);

impl FromStr for MemberRole {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(MemberRole::Admin),
            "DEVELOPER" => Ok(MemberRole::Developer),
            "CLIENT" => Ok(MemberRole::Client),
            other => Err(InvalidRole(other.to_string())),
        }
    }
}

/// A caller's effective role on a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectRole {
    /// Derived from `projects.owner_id`
    Owner,
    Admin,
    Developer,
    Client,
}

impl ProjectRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Owner => "OWNER",
            ProjectRole::Admin => "ADMIN",
            ProjectRole::Developer => "DEVELOPER",
            ProjectRole::Client => "CLIENT",
        }
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, ProjectRole::Owner)
    }

    /// Owners and admins may invite, re-role and remove members
    pub fn can_manage_members(&self) -> bool {
        matches!(self, ProjectRole::Owner | ProjectRole::Admin)
    }
}

impl From<MemberRole> for ProjectRole {
    fn from(role: MemberRole) -> Self {
        match role {
            MemberRole::Admin => ProjectRole::Admin,
            MemberRole::Developer => ProjectRole::Developer,
            MemberRole::Client => ProjectRole::Client,
        }
    }
}

impl fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectRole {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "OWNER" {
            return Ok(ProjectRole::Owner);
        }
        s.parse::<MemberRole>().map(ProjectRole::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_parsing() {
        assert_eq!("ADMIN".parse::<MemberRole>(), Ok(MemberRole::Admin));
        assert_eq!("DEVELOPER".parse::<MemberRole>(), Ok(MemberRole::Developer));
        assert_eq!("CLIENT".parse::<MemberRole>(), Ok(MemberRole::Client));

        // OWNER is never assignable, and spelling is exact
        assert!("OWNER".parse::<MemberRole>().is_err());
        assert!("admin".parse::<MemberRole>().is_err());
        assert!("".parse::<MemberRole>().is_err());
    }

    #[test]
    fn test_member_role_serde() {
        let json = serde_json::to_string(&MemberRole::Developer).unwrap();
        assert_eq!(json, "\"DEVELOPER\"");

        let role: MemberRole = serde_json::from_str("\"CLIENT\"").unwrap();
        assert_eq!(role, MemberRole::Client);

        assert!(serde_json::from_str::<MemberRole>("\"OWNER\"").is_err());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(MemberRole::Admin.display_name(), "Admin");
        assert_eq!(MemberRole::Developer.display_name(), "Developer");
        assert_eq!(MemberRole::Client.display_name(), "Client");
    }

    #[test]
    fn test_manage_members_permission() {
        assert!(ProjectRole::Owner.can_manage_members());
        assert!(ProjectRole::Admin.can_manage_members());
        assert!(!ProjectRole::Developer.can_manage_members());
        assert!(!ProjectRole::Client.can_manage_members());

        assert!(MemberRole::Admin.can_manage_members());
        assert!(!MemberRole::Developer.can_manage_members());
        assert!(!MemberRole::Client.can_manage_members());
    }

    #[test]
    fn test_project_role_from_member_role() {
        for role in [MemberRole::Admin, MemberRole::Developer, MemberRole::Client] {
            let effective = ProjectRole::from(role);
            assert!(!effective.is_owner());
            assert_eq!(effective.as_str(), role.as_str());
        }
    }

    #[test]
    fn test_project_role_parsing() {
        assert_eq!("OWNER".parse::<ProjectRole>(), Ok(ProjectRole::Owner));
        assert_eq!("ADMIN".parse::<ProjectRole>(), Ok(ProjectRole::Admin));
        assert!("VIEWER".parse::<ProjectRole>().is_err());
    }
}
