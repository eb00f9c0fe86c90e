//! Navigation gate driven by session liveness and the role claim.

pub mod routes;

use crate::session::{Role, SessionContext};

pub use routes::{dashboard_for, resolve, Access, MatchedRoute, RouteSpec, ROUTES};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Unauthenticated,
    Authorized { role: Option<Role> },
    UnauthorizedRole { role: Option<Role> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Render,
    Redirect(String),
}

/// Who may pass and where to send everyone else
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPolicy {
    /// `None` admits any authenticated role
    pub allowed_roles: Option<Vec<Role>>,
    pub redirect_to: String,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            allowed_roles: None,
            redirect_to: routes::LANDING.to_string(),
        }
    }
}

impl GuardPolicy {
    pub fn new(allowed_roles: Option<Vec<Role>>, redirect_to: impl Into<String>) -> Self {
        Self {
            allowed_roles,
            redirect_to: redirect_to.into(),
        }
    }

    /// Policy for a table route; public routes have none
    pub fn for_route(spec: &RouteSpec) -> Option<Self> {
        match spec.access {
            Access::Public => None,
            Access::Protected {
                allowed_roles,
                redirect_to,
            } => Some(Self::new(Some(allowed_roles.to_vec()), redirect_to)),
        }
    }

    fn admits(&self, role: Option<Role>) -> bool {
        match &self.allowed_roles {
            None => true,
            Some(allowed) => role.is_some_and(|r| allowed.contains(&r)),
        }
    }
}

/// One evaluation of the guard against the current session.
///
/// A dead session runs the logout side effect before redirecting, so stale
/// tokens never linger. The role comes from the token claim; the stored
/// profile is consulted only when the token has no role claim.
pub fn evaluate(session: &SessionContext, policy: &GuardPolicy) -> (GuardState, Decision) {
    if !session.is_authenticated() {
        if let Err(e) = session.logout() {
            tracing::warn!("Failed to clear dead session: {}", e);
        }
        return (
            GuardState::Unauthenticated,
            Decision::Redirect(policy.redirect_to.clone()),
        );
    }

    let role = session.effective_role();

    if !policy.admits(role) {
        let dest = role
            .map(dashboard_for)
            .unwrap_or(policy.redirect_to.as_str())
            .to_string();
        tracing::debug!("Role {:?} not permitted, redirecting to {}", role, dest);
        return (GuardState::UnauthorizedRole { role }, Decision::Redirect(dest));
    }

    (GuardState::Authorized { role }, Decision::Render)
}

/// Stateful guard for one protected view; re-run on every navigation
#[derive(Debug)]
pub struct RouteGuard {
    session: SessionContext,
    policy: GuardPolicy,
    state: GuardState,
    path: Option<String>,
}

impl RouteGuard {
    pub fn new(session: SessionContext, policy: GuardPolicy) -> Self {
        Self {
            session,
            policy,
            state: GuardState::Checking,
            path: None,
        }
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn navigate(&mut self, path: &str) -> Decision {
        self.path = Some(path.to_string());
        let (state, decision) = evaluate(&self.session, &self.policy);
        self.state = state;
        decision
    }
}

/// Outcome of navigating the full route table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(MatchedRoute),
    Redirect(String),
    NotFound,
}

/// Resolve `path` against the route table and gate it
pub fn navigate(session: &SessionContext, path: &str) -> Navigation {
    let Some(route) = resolve(path) else {
        return Navigation::NotFound;
    };

    match GuardPolicy::for_route(route.spec) {
        None => Navigation::Render(route),
        Some(policy) => match evaluate(session, &policy).1 {
            Decision::Render => Navigation::Render(route),
            Decision::Redirect(dest) => Navigation::Redirect(dest),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AuthPayload, MemoryStore, StoredSession};
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token(claims: serde_json::Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).unwrap()
    }

    fn live(role: Option<&str>) -> String {
        let exp = Utc::now().timestamp() + 600;
        match role {
            Some(r) => token(json!({"exp": exp, "role": r})),
            None => token(json!({"exp": exp})),
        }
    }

    fn session_with(access: String, user: Option<serde_json::Value>) -> SessionContext {
        let ctx = SessionContext::in_memory();
        ctx.save_auth(&AuthPayload {
            access: Some(access),
            refresh: Some("r".into()),
            user: user.map(|u| serde_json::from_value(u).unwrap()),
        })
        .unwrap();
        ctx
    }

    #[test]
    fn starts_in_checking() {
        let guard = RouteGuard::new(SessionContext::in_memory(), GuardPolicy::default());
        assert_eq!(guard.state(), &GuardState::Checking);
    }

    #[test]
    fn unauthenticated_redirects_and_logs_out() {
        let ctx = SessionContext::new(MemoryStore::with_session(StoredSession {
            access: Some("not-a-token".into()),
            refresh: Some("r".into()),
            user: None,
        }));
        let mut guard = RouteGuard::new(
            ctx.clone(),
            GuardPolicy::new(Some(vec![Role::Staff]), "/staff/login"),
        );

        assert_eq!(guard.navigate("/incomingRequests"), Decision::Redirect("/staff/login".into()));
        assert_eq!(guard.state(), &GuardState::Unauthenticated);
        assert!(ctx.refresh_token().is_none());
    }

    #[test]
    fn wrong_role_goes_to_own_dashboard() {
        let ctx = session_with(live(Some("student")), None);
        let mut guard = RouteGuard::new(ctx, GuardPolicy::new(Some(vec![Role::Staff]), "/"));

        assert_eq!(
            guard.navigate("/staff/dashboard"),
            Decision::Redirect("/student/dashboard".into())
        );
        assert_eq!(
            guard.state(),
            &GuardState::UnauthorizedRole {
                role: Some(Role::Student)
            }
        );
    }

    #[test]
    fn falls_back_to_stored_role_when_claim_missing() {
        let ctx = session_with(live(None), Some(json!({"username": "t1", "role": "staff"})));
        let mut guard = RouteGuard::new(ctx, GuardPolicy::new(Some(vec![Role::Staff]), "/staff/login"));
        assert_eq!(guard.navigate("/staff/dashboard"), Decision::Render);
        assert_eq!(guard.state(), &GuardState::Authorized { role: Some(Role::Staff) });
    }

    #[test]
    fn unresolvable_role_uses_generic_redirect() {
        let ctx = session_with(live(Some("admin")), None);
        let mut guard = RouteGuard::new(ctx, GuardPolicy::new(Some(vec![Role::Staff]), "/staff/login"));
        assert_eq!(guard.navigate("/staff/dashboard"), Decision::Redirect("/staff/login".into()));
    }

    #[test]
    fn unknown_claim_ignores_stored_profile() {
        let ctx = session_with(
            live(Some("admin")),
            Some(json!({"username": "t1", "role": "staff"})),
        );
        let mut guard = RouteGuard::new(ctx, GuardPolicy::new(Some(vec![Role::Staff]), "/staff/login"));

        assert_eq!(guard.navigate("/staff/dashboard"), Decision::Redirect("/staff/login".into()));
        assert_eq!(guard.state(), &GuardState::UnauthorizedRole { role: None });
    }

    #[test]
    fn reevaluates_on_each_navigation() {
        let ctx = session_with(live(Some("staff")), None);
        let mut guard = RouteGuard::new(ctx.clone(), GuardPolicy::new(Some(vec![Role::Staff]), "/staff/login"));
        assert_eq!(guard.navigate("/staff/dashboard"), Decision::Render);

        ctx.logout().unwrap();
        assert_eq!(guard.navigate("/incomingRequests"), Decision::Redirect("/staff/login".into()));
        assert_eq!(guard.path(), Some("/incomingRequests"));
    }

    #[test]
    fn table_navigation() {
        let ctx = session_with(live(Some("student")), None);
        match navigate(&ctx, "/requestStatus/9") {
            Navigation::Render(route) => assert_eq!(route.param("id"), Some("9")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            navigate(&ctx, "/approvalHistory"),
            Navigation::Redirect("/student/dashboard".into())
        );
        assert_eq!(navigate(&ctx, "/does-not-exist"), Navigation::NotFound);

        let anon = SessionContext::in_memory();
        assert!(matches!(navigate(&anon, "/staff/signup"), Navigation::Render(_)));
        assert_eq!(navigate(&anon, "/newRequest"), Navigation::Redirect("/student/login".into()));
    }
}
