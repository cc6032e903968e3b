//! Generic role permission table: `resource × action → bool`.
//!
//! Used for coarse UI and endpoint gating. The loading flow has its own
//! stage access policy and does not consult this table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::auth::RoleTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Users,
    Roles,
    Stock,
    Products,
    Warehouses,
    Releases,
    Schedules,
    Loads,
    Clients,
}

impl Resource {
    pub const ALL: [Resource; 9] = [
        Resource::Users,
        Resource::Roles,
        Resource::Stock,
        Resource::Products,
        Resource::Warehouses,
        Resource::Releases,
        Resource::Schedules,
        Resource::Loads,
        Resource::Clients,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Roles => "roles",
            Resource::Stock => "stock",
            Resource::Products => "products",
            Resource::Warehouses => "warehouses",
            Resource::Releases => "releases",
            Resource::Schedules => "schedules",
            Resource::Loads => "loads",
            Resource::Clients => "clients",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Resource::ALL.into_iter().find(|r| r.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Permission {
    pub can_create: bool,
    pub can_read: bool,
    pub can_update: bool,
    pub can_delete: bool,
}

impl Permission {
    pub const ALL: Permission = Permission {
        can_create: true,
        can_read: true,
        can_update: true,
        can_delete: true,
    };

    pub const READ: Permission = Permission {
        can_create: false,
        can_read: true,
        can_update: false,
        can_delete: false,
    };

    pub const READ_UPDATE: Permission = Permission {
        can_create: false,
        can_read: true,
        can_update: true,
        can_delete: false,
    };

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => self.can_create,
            Action::Read => self.can_read,
            Action::Update => self.can_update,
            Action::Delete => self.can_delete,
        }
    }

    fn union(self, other: Permission) -> Permission {
        Permission {
            can_create: self.can_create || other.can_create,
            can_read: self.can_read || other.can_read,
            can_update: self.can_update || other.can_update,
            can_delete: self.can_delete || other.can_delete,
        }
    }
}

/// Effective permissions of an actor (union over all roles held)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PermissionSet(pub BTreeMap<Resource, Permission>);

impl PermissionSet {
    pub fn grant(&mut self, resource: Resource, permission: Permission) {
        let current = self.0.get(&resource).copied().unwrap_or_default();
        self.0.insert(resource, current.union(permission));
    }

    /// Unknown resources are denied
    pub fn can_access(&self, resource: Resource, action: Action) -> bool {
        self.0
            .get(&resource)
            .map(|p| p.allows(action))
            .unwrap_or(false)
    }
}

/// Rows seeded into `role_permissions` on first start
pub fn default_permissions(role: RoleTag) -> Vec<(Resource, Permission)> {
    match role {
        RoleTag::Admin => Resource::ALL.into_iter().map(|r| (r, Permission::ALL)).collect(),
        RoleTag::Logistics => Resource::ALL
            .into_iter()
            .map(|r| match r {
                Resource::Users | Resource::Roles => (r, Permission::READ),
                _ => (r, Permission::ALL),
            })
            .collect(),
        RoleTag::Warehouse => vec![
            (Resource::Loads, Permission::READ_UPDATE),
            (Resource::Stock, Permission::READ_UPDATE),
            (Resource::Products, Permission::READ),
            (Resource::Warehouses, Permission::READ),
        ],
        RoleTag::Client => vec![
            (Resource::Loads, Permission::READ),
            (Resource::Releases, Permission::READ),
        ],
        RoleTag::Commercial => vec![
            (Resource::Clients, Permission::READ),
            (Resource::Products, Permission::READ),
            (Resource::Stock, Permission::READ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_resource_is_denied() {
        let set = PermissionSet::default();
        assert!(!set.can_access(Resource::Loads, Action::Read));
    }

    #[test]
    fn test_grants_are_unioned_across_roles() {
        let mut set = PermissionSet::default();
        for (resource, permission) in default_permissions(RoleTag::Client) {
            set.grant(resource, permission);
        }
        assert!(!set.can_access(Resource::Stock, Action::Read));
        for (resource, permission) in default_permissions(RoleTag::Warehouse) {
            set.grant(resource, permission);
        }
        assert!(set.can_access(Resource::Loads, Action::Update));
        assert!(set.can_access(Resource::Releases, Action::Read));
        assert!(!set.can_access(Resource::Loads, Action::Delete));
    }

    #[test]
    fn test_logistics_cannot_manage_users() {
        let perms = default_permissions(RoleTag::Logistics);
        let users = perms.iter().find(|(r, _)| *r == Resource::Users).unwrap().1;
        assert!(users.allows(Action::Read));
        assert!(!users.allows(Action::Create));
    }

    #[test]
    fn test_resource_parse() {
        assert_eq!(Resource::parse("loads"), Some(Resource::Loads));
        assert_eq!(Resource::parse("carregamentos"), None);
    }
}
