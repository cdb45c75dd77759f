//! Authorization policies.
//!
//! A policy answers one question about a principal, an action and the
//! resource it targets. Policies abstain from questions they do not
//! understand; the [`PolicyRegistry`] consults them in registration order and
//! folds their decisions with its [`CombinationRule`].

use std::fmt;

use model::entities::book;
use tracing::{debug, trace, warn};

use super::principal::Principal;
use crate::error::ApiError;

/// Action checked by [`BookCreatorPolicy`].
pub const BOOK_IS_CREATOR: &str = "book.is_creator";
/// Action granted to any authenticated principal.
pub const IS_AUTHENTICATED: &str = "IS_AUTHENTICATED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
    Abstain,
}

/// The subject an action is performed on.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    /// The action does not target a particular row.
    Any,
    Book(&'a book::Model),
}

impl Resource<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Any => "any",
            Resource::Book(_) => "Book",
        }
    }
}

pub trait AuthorizationPolicy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn evaluate(
        &self,
        principal: Option<&Principal>,
        resource: &Resource<'_>,
        action: &str,
    ) -> Decision;
}

/// Grants `ROLE_*` actions to principals holding that role.
#[derive(Debug, Default)]
pub struct RolePolicy;

impl AuthorizationPolicy for RolePolicy {
    fn name(&self) -> &'static str {
        "role"
    }

    fn evaluate(
        &self,
        principal: Option<&Principal>,
        _resource: &Resource<'_>,
        action: &str,
    ) -> Decision {
        if !action.starts_with("ROLE_") {
            return Decision::Abstain;
        }
        match principal {
            Some(principal) if principal.has_role(action) => Decision::Allow,
            _ => Decision::Deny,
        }
    }
}

/// Grants [`IS_AUTHENTICATED`] to anyone with an open session.
#[derive(Debug, Default)]
pub struct AuthenticatedPolicy;

impl AuthorizationPolicy for AuthenticatedPolicy {
    fn name(&self) -> &'static str {
        "authenticated"
    }

    fn evaluate(
        &self,
        principal: Option<&Principal>,
        _resource: &Resource<'_>,
        action: &str,
    ) -> Decision {
        if action != IS_AUTHENTICATED {
            return Decision::Abstain;
        }
        if principal.is_some() {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// Grants [`BOOK_IS_CREATOR`] on a book to the user who created it.
#[derive(Debug, Default)]
pub struct BookCreatorPolicy;

impl AuthorizationPolicy for BookCreatorPolicy {
    fn name(&self) -> &'static str {
        "book_creator"
    }

    fn evaluate(
        &self,
        principal: Option<&Principal>,
        resource: &Resource<'_>,
        action: &str,
    ) -> Decision {
        if action != BOOK_IS_CREATOR {
            return Decision::Abstain;
        }
        let Resource::Book(book) = resource else {
            return Decision::Abstain;
        };
        match principal {
            Some(principal) if book.is_created_by(principal.id) => Decision::Allow,
            _ => Decision::Deny,
        }
    }
}

/// How the decisions of several policies are folded into one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CombinationRule {
    /// Any Allow grants.
    #[default]
    Affirmative,
    /// Any Deny refuses, otherwise any Allow grants.
    DenyOverrides,
    /// Every policy must Allow; an abstention refuses.
    Unanimous,
}

impl CombinationRule {
    /// Folds `decisions` into Allow or Deny. No decision at all, or only
    /// abstentions, is a Deny.
    pub fn combine(&self, decisions: &[Decision]) -> Decision {
        let any = |wanted: Decision| decisions.contains(&wanted);
        let granted = match self {
            CombinationRule::Affirmative => any(Decision::Allow),
            CombinationRule::DenyOverrides => !any(Decision::Deny) && any(Decision::Allow),
            CombinationRule::Unanimous => {
                !decisions.is_empty() && decisions.iter().all(|d| *d == Decision::Allow)
            }
        };
        if granted { Decision::Allow } else { Decision::Deny }
    }
}

/// Ordered set of policies with a combination rule.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    policies: Vec<Box<dyn AuthorizationPolicy>>,
    rule: CombinationRule,
}

impl PolicyRegistry {
    pub fn new(rule: CombinationRule) -> Self {
        Self {
            policies: Vec::new(),
            rule,
        }
    }

    /// The policies every deployment needs, combined affirmatively.
    pub fn with_defaults() -> Self {
        Self::new(CombinationRule::Affirmative)
            .register(AuthenticatedPolicy)
            .register(RolePolicy)
            .register(BookCreatorPolicy)
    }

    pub fn register(mut self, policy: impl AuthorizationPolicy + 'static) -> Self {
        self.policies.push(Box::new(policy));
        self
    }

    /// Only policies that take a position are folded, except under the
    /// unanimous rule where every abstention counts against the request.
    pub fn decide(
        &self,
        principal: Option<&Principal>,
        resource: &Resource<'_>,
        action: &str,
    ) -> Decision {
        let mut decisions = Vec::with_capacity(self.policies.len());
        for policy in &self.policies {
            let decision = policy.evaluate(principal, resource, action);
            trace!(
                policy = policy.name(),
                action,
                resource = resource.kind(),
                ?decision,
                "Policy evaluated"
            );
            if decision != Decision::Abstain || self.rule == CombinationRule::Unanimous {
                decisions.push(decision);
            }
        }
        let decision = self.rule.combine(&decisions);
        debug!(
            action,
            resource = resource.kind(),
            principal = principal.map(|p| p.username.as_str()),
            ?decision,
            "Access decided"
        );
        decision
    }

    pub fn is_granted(
        &self,
        principal: Option<&Principal>,
        resource: &Resource<'_>,
        action: &str,
    ) -> bool {
        self.decide(principal, resource, action) == Decision::Allow
    }

    /// The error to report when `action` was refused.
    pub fn denial(&self, principal: Option<&Principal>, action: &str) -> ApiError {
        match principal {
            None => ApiError::Unauthenticated,
            Some(principal) => {
                warn!(user = principal.username.as_str(), action, "Access denied");
                ApiError::Forbidden(action.to_string())
            }
        }
    }

    pub fn deny_unless_granted(
        &self,
        principal: Option<&Principal>,
        resource: &Resource<'_>,
        action: &str,
    ) -> Result<(), ApiError> {
        if self.is_granted(principal, resource, action) {
            Ok(())
        } else {
            Err(self.denial(principal, action))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use model::entities::book::BookStatus;
    use model::roles::{ROLE_ADMIN, ROLE_BOOK_EDIT, ROLE_USER};

    fn principal(id: i32, roles: &[&str]) -> Principal {
        let mut all = vec![ROLE_USER.to_string()];
        all.extend(roles.iter().map(|r| r.to_string()));
        Principal {
            id,
            username: format!("user{id}"),
            roles: all,
        }
    }

    fn book_created_by(created_by_id: i32) -> book::Model {
        book::Model {
            id: 1,
            title: "Nadja".to_string(),
            isbn: "9782070360024".to_string(),
            cover: "https://covers.example.org/nadja.png".to_string(),
            page_number: 190,
            plot: "Paris, 1926.".to_string(),
            status: BookStatus::Available,
            edited_at: NaiveDate::from_ymd_opt(1928, 5, 25)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            editor_id: 1,
            author_id: 1,
            created_by_id,
        }
    }

    #[test]
    fn creator_is_allowed() {
        let book = book_created_by(1);
        let decision = BookCreatorPolicy.evaluate(
            Some(&principal(1, &[])),
            &Resource::Book(&book),
            BOOK_IS_CREATOR,
        );
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn other_user_is_denied() {
        let book = book_created_by(1);
        let decision = BookCreatorPolicy.evaluate(
            Some(&principal(2, &[ROLE_ADMIN])),
            &Resource::Book(&book),
            BOOK_IS_CREATOR,
        );
        assert_eq!(decision, Decision::Deny);
    }

    #[test]
    fn anonymous_is_denied() {
        let book = book_created_by(1);
        let decision = BookCreatorPolicy.evaluate(None, &Resource::Book(&book), BOOK_IS_CREATOR);
        assert_eq!(decision, Decision::Deny);
    }

    #[test]
    fn non_book_subjects_are_abstained() {
        let creator = principal(1, &[]);
        let decision = BookCreatorPolicy.evaluate(Some(&creator), &Resource::Any, BOOK_IS_CREATOR);
        assert_eq!(decision, Decision::Abstain);
    }

    #[test]
    fn other_actions_are_abstained() {
        let book = book_created_by(1);
        let decision = BookCreatorPolicy.evaluate(
            Some(&principal(1, &[])),
            &Resource::Book(&book),
            "book.is_reader",
        );
        assert_eq!(decision, Decision::Abstain);
    }

    #[test]
    fn role_policy_checks_membership() {
        let editor = principal(4, &[ROLE_BOOK_EDIT]);
        assert_eq!(
            RolePolicy.evaluate(Some(&editor), &Resource::Any, ROLE_BOOK_EDIT),
            Decision::Allow
        );
        assert_eq!(
            RolePolicy.evaluate(Some(&editor), &Resource::Any, ROLE_ADMIN),
            Decision::Deny
        );
        assert_eq!(
            RolePolicy.evaluate(None, &Resource::Any, ROLE_USER),
            Decision::Deny
        );
        assert_eq!(
            RolePolicy.evaluate(Some(&editor), &Resource::Any, IS_AUTHENTICATED),
            Decision::Abstain
        );
    }

    #[test]
    fn authenticated_policy() {
        assert_eq!(
            AuthenticatedPolicy.evaluate(Some(&principal(1, &[])), &Resource::Any, IS_AUTHENTICATED),
            Decision::Allow
        );
        assert_eq!(
            AuthenticatedPolicy.evaluate(None, &Resource::Any, IS_AUTHENTICATED),
            Decision::Deny
        );
    }

    #[test]
    fn registry_scenario() {
        let registry = PolicyRegistry::with_defaults();
        let book = book_created_by(1);
        let u1 = principal(1, &[]);
        let u2 = principal(2, &[]);

        assert!(registry.is_granted(Some(&u1), &Resource::Book(&book), BOOK_IS_CREATOR));
        assert!(!registry.is_granted(Some(&u2), &Resource::Book(&book), BOOK_IS_CREATOR));
        // Every policy abstains on a subject that is not a book: refused by default.
        assert_eq!(
            registry.decide(Some(&u1), &Resource::Any, BOOK_IS_CREATOR),
            Decision::Deny
        );
    }

    #[test]
    fn registry_unknown_action_is_refused() {
        let registry = PolicyRegistry::with_defaults();
        assert!(!registry.is_granted(Some(&principal(1, &[ROLE_ADMIN])), &Resource::Any, "anything"));
    }

    #[test]
    fn combination_rules() {
        use Decision::*;

        assert_eq!(CombinationRule::Affirmative.combine(&[Deny, Allow]), Allow);
        assert_eq!(CombinationRule::Affirmative.combine(&[]), Deny);
        assert_eq!(CombinationRule::DenyOverrides.combine(&[Deny, Allow]), Deny);
        assert_eq!(CombinationRule::DenyOverrides.combine(&[Allow]), Allow);
        assert_eq!(CombinationRule::Unanimous.combine(&[Allow, Allow]), Allow);
        assert_eq!(CombinationRule::Unanimous.combine(&[Allow, Abstain]), Deny);
        assert_eq!(CombinationRule::Unanimous.combine(&[]), Deny);
    }

    #[test]
    fn deny_overrides_registry() {
        #[derive(Debug)]
        struct Blocklist;

        impl AuthorizationPolicy for Blocklist {
            fn name(&self) -> &'static str {
                "blocklist"
            }

            fn evaluate(&self, principal: Option<&Principal>, _: &Resource<'_>, _: &str) -> Decision {
                match principal {
                    Some(p) if p.id == 13 => Decision::Deny,
                    _ => Decision::Abstain,
                }
            }
        }

        let registry = PolicyRegistry::new(CombinationRule::DenyOverrides)
            .register(RolePolicy)
            .register(Blocklist);

        assert!(registry.is_granted(Some(&principal(1, &[ROLE_ADMIN])), &Resource::Any, ROLE_ADMIN));
        assert!(!registry.is_granted(Some(&principal(13, &[ROLE_ADMIN])), &Resource::Any, ROLE_ADMIN));
    }

    #[test]
    fn denial_distinguishes_anonymous_callers() {
        let registry = PolicyRegistry::with_defaults();
        assert!(matches!(
            registry.deny_unless_granted(None, &Resource::Any, ROLE_ADMIN),
            Err(ApiError::Unauthenticated)
        ));
        assert!(matches!(
            registry.deny_unless_granted(Some(&principal(1, &[])), &Resource::Any, ROLE_ADMIN),
            Err(ApiError::Forbidden(_))
        ));
    }
}
