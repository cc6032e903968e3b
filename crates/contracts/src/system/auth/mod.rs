use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::a001_warehouse::aggregate::WarehouseId;
use crate::domain::a002_client::aggregate::ClientId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<RoleTag>,
    pub warehouse_id: Option<WarehouseId>,
    pub client_id: Option<ClientId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String, // user_id
    pub username: String,
    pub roles: Vec<RoleTag>,
    pub exp: usize, // expiration timestamp
    pub iat: usize, // issued at
}

impl TokenClaims {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&RoleTag::Admin)
    }
}

/// Role tags an account can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleTag {
    Admin,
    Logistics,
    Warehouse,
    Client,
    /// Sales staff; no rights on the loading flow
    Commercial,
}

impl RoleTag {
    pub const ALL: [RoleTag; 5] = [
        RoleTag::Admin,
        RoleTag::Logistics,
        RoleTag::Warehouse,
        RoleTag::Client,
        RoleTag::Commercial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleTag::Admin => "admin",
            RoleTag::Logistics => "logistics",
            RoleTag::Warehouse => "warehouse",
            RoleTag::Client => "client",
            RoleTag::Commercial => "commercial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        RoleTag::ALL.into_iter().find(|r| r.as_str() == s)
    }

    /// Administrative and logistics-operations roles
    pub fn is_elevated(&self) -> bool {
        matches!(self, RoleTag::Admin | RoleTag::Logistics)
    }
}

impl std::fmt::Display for RoleTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who is acting: identity, roles and the warehouse / client the account is
/// tied to. Resolved per request from the account directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorContext {
    pub actor_id: String,
    pub roles: BTreeSet<RoleTag>,
    pub warehouse_id: Option<WarehouseId>,
    pub client_id: Option<ClientId>,
}

impl ActorContext {
    pub fn new(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            roles: BTreeSet::new(),
            warehouse_id: None,
            client_id: None,
        }
    }

    pub fn with_role(mut self, role: RoleTag) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn with_warehouse(mut self, warehouse_id: WarehouseId) -> Self {
        self.roles.insert(RoleTag::Warehouse);
        self.warehouse_id = Some(warehouse_id);
        self
    }

    pub fn with_client(mut self, client_id: ClientId) -> Self {
        self.roles.insert(RoleTag::Client);
        self.client_id = Some(client_id);
        self
    }

    pub fn has_role(&self, role: RoleTag) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_elevated(&self) -> bool {
        self.roles.iter().any(RoleTag::is_elevated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_tags_round_trip() {
        for role in RoleTag::ALL {
            assert_eq!(RoleTag::parse(role.as_str()), Some(role));
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        assert_eq!(RoleTag::parse("root"), None);
    }

    #[test]
    fn test_elevated_roles() {
        let actor = ActorContext::new("u1").with_role(RoleTag::Logistics);
        assert!(actor.is_elevated());
        let actor = ActorContext::new("u2").with_warehouse(WarehouseId::new_v4());
        assert!(!actor.is_elevated());
        assert!(actor.has_role(RoleTag::Warehouse));
    }
}
