pub mod repository;

use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

use crate::roles;

/// A person allowed to sign in to the catalog back office.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2 hash in PHC string format. Never the plain password.
    pub password: String,
    /// JSON array of the explicitly granted role names.
    #[sea_orm(column_type = "Text")]
    pub roles: String,
    /// Refreshed by every interactive login; strictly increasing.
    pub last_connected_at: Option<NaiveDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Books this user created.
    #[sea_orm(has_many = "super::book::Entity")]
    Book,
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The explicitly stored roles. A malformed column reads as no roles.
    pub fn stored_roles(&self) -> Vec<String> {
        serde_json::from_str::<Vec<String>>(&self.roles).unwrap_or_default()
    }

    /// All roles held by the user, `ROLE_USER` included.
    pub fn role_names(&self) -> Vec<String> {
        let mut names = roles::normalize(self.stored_roles());
        names.insert(0, roles::ROLE_USER.to_owned());
        names
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role_names().iter().any(|r| r == role)
    }
}

/// Serializes role names into the representation stored in `users.roles`.
pub fn encode_roles<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    serde_json::Value::from(roles::normalize(names)).to_string()
}

/// Anything that can authenticate with a password.
///
/// Only stored users can have their hash upgraded; other identities (for
/// example in-memory accounts) report their kind and are rejected.
pub trait PasswordAuthenticated: Send + Sync {
    fn identifier(&self) -> &str;

    fn hashed_password(&self) -> Option<&str>;

    fn kind(&self) -> &'static str;

    fn as_user(&self) -> Option<&Model> {
        None
    }
}

impl PasswordAuthenticated for Model {
    fn identifier(&self) -> &str {
        &self.username
    }

    fn hashed_password(&self) -> Option<&str> {
        Some(&self.password)
    }

    fn kind(&self) -> &'static str {
        "User"
    }

    fn as_user(&self) -> Option<&Model> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_roles(roles: &str) -> Model {
        Model {
            id: 1,
            username: "reader".to_string(),
            password: "$argon2id$stub".to_string(),
            roles: roles.to_string(),
            last_connected_at: None,
        }
    }

    #[test]
    fn every_user_holds_role_user() {
        let user = user_with_roles("[]");
        assert_eq!(user.role_names(), vec!["ROLE_USER".to_string()]);
        assert!(user.has_role(roles::ROLE_USER));
    }

    #[test]
    fn stored_roles_are_exposed_after_role_user() {
        let user = user_with_roles(r#"["ROLE_ADMIN","ROLE_USER","ROLE_ADMIN"]"#);
        assert_eq!(
            user.role_names(),
            vec!["ROLE_USER".to_string(), "ROLE_ADMIN".to_string()]
        );
    }

    #[test]
    fn malformed_roles_column_reads_as_empty() {
        let user = user_with_roles("not json");
        assert!(user.stored_roles().is_empty());
        assert!(!user.has_role(roles::ROLE_ADMIN));
    }

    #[test]
    fn encode_roles_produces_json_array() {
        assert_eq!(
            encode_roles(["ROLE_EDITION_DE_LIVRE", "ROLE_USER"]),
            r#"["ROLE_EDITION_DE_LIVRE"]"#
        );
    }
}
