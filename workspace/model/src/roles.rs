//! Role names understood by the catalog.
//!
//! Every user implicitly holds [`ROLE_USER`]; the remaining roles are stored
//! explicitly on the user row.

pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
/// Grants book and editor creation.
pub const ROLE_BOOK_CREATE: &str = "ROLE_AJOUT_DE_LIVRE";
/// Grants editing of any author, editor or book.
pub const ROLE_BOOK_EDIT: &str = "ROLE_EDITION_DE_LIVRE";

pub const ALL: [&str; 4] = [ROLE_USER, ROLE_ADMIN, ROLE_BOOK_CREATE, ROLE_BOOK_EDIT];

pub fn is_known(role: &str) -> bool {
    ALL.contains(&role)
}

/// Deduplicates the roles while keeping their first-seen order and drops
/// the implicit [`ROLE_USER`].
pub fn normalize<I, S>(roles: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for role in roles {
        let role = role.as_ref();
        if role != ROLE_USER && !normalized.iter().any(|r| r == role) {
            normalized.push(role.to_owned());
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_duplicates_and_implicit_role() {
        let roles = normalize([ROLE_ADMIN, ROLE_USER, ROLE_BOOK_EDIT, ROLE_ADMIN]);
        assert_eq!(roles, vec![ROLE_ADMIN.to_string(), ROLE_BOOK_EDIT.to_string()]);
    }

    #[test]
    fn known_roles() {
        assert!(is_known(ROLE_BOOK_CREATE));
        assert!(!is_known("ROLE_SUPERHERO"));
    }
}
