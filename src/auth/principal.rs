use model::entities::user;

/// The authenticated user attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i32,
    pub username: String,
    /// Every role held, `ROLE_USER` included.
    pub roles: Vec<String>,
}

impl Principal {
    pub fn from_user(user: &user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            roles: user.role_names(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
