use super::*;
use crate::services::role::Role;
use uuid::Uuid;

fn session(roles: &[Role]) -> Session {
    Session {
        user_id: Uuid::new_v4(),
        email: "crew@wash.io".into(),
        roles: RoleSet::from(roles),
        current_tenant_id: None,
    }
}

fn admin_only() -> RoleSet {
    RoleSet::from([Role::Admin].as_slice())
}

#[test]
fn login_redirect_encodes_original_path() {
    assert_eq!(login_redirect("/dashboard"), "/login?redirect=%2Fdashboard");
    assert_eq!(
        login_redirect("/dashboard/reports?month=2026-10"),
        "/login?redirect=%2Fdashboard%2Freports%3Fmonth%3D2026-10"
    );
}

#[test]
fn empty_requirement_allows_any_session() {
    let s = session(&[Role::Customer]);
    assert_eq!(decide(&RoleSet::default(), Ok(Some(s.clone())), "/dashboard"), GuardDecision::Allow(s));
}

#[test]
fn empty_requirement_allows_session_without_roles() {
    let s = session(&[]);
    assert!(matches!(decide(&RoleSet::default(), Ok(Some(s)), "/dashboard"), GuardDecision::Allow(_)));
}

#[test]
fn no_session_redirects_to_login_with_return_target() {
    assert_eq!(
        decide(&RoleSet::default(), Ok(None), "/dashboard/payments"),
        GuardDecision::RedirectLogin("/login?redirect=%2Fdashboard%2Fpayments".into())
    );
}

#[test]
fn staff_is_unauthorized_for_admin_route() {
    let decision = decide(&admin_only(), Ok(Some(session(&[Role::Staff]))), "/dashboard/settings");
    assert_eq!(decision, GuardDecision::RedirectUnauthorized);
}

#[test]
fn admin_and_staff_is_allowed_for_admin_route() {
    let decision = decide(&admin_only(), Ok(Some(session(&[Role::Admin, Role::Staff]))), "/dashboard/settings");
    assert!(matches!(decision, GuardDecision::Allow(_)));
}

#[test]
fn no_session_with_required_roles_goes_to_login_not_unauthorized() {
    let decision = decide(&admin_only(), Ok(None), "/dashboard/settings");
    assert!(matches!(decision, GuardDecision::RedirectLogin(_)));
}

#[test]
fn resolution_error_fails_closed() {
    let decision = decide(
        &RoleSet::default(),
        Err(StoreError::Unavailable("down".into())),
        "/dashboard",
    );
    assert_eq!(decision, GuardDecision::RedirectLogin("/login?redirect=%2Fdashboard".into()));
}
