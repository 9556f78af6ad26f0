use super::*;

fn session(roles: &[Role]) -> Session {
    Session {
        user_id: Uuid::nil(),
        email: "crew@wash.io".into(),
        roles: RoleSet::from(roles),
        current_tenant_id: Some(Uuid::nil()),
    }
}

fn keys(nav: &[NavItem]) -> Vec<&'static str> {
    nav.iter().map(|n| n.key).collect()
}

#[test]
fn page_paths_are_unique() {
    let mut paths: Vec<_> = PAGES.iter().map(|p| p.path).collect();
    paths.sort_unstable();
    paths.dedup();
    assert_eq!(paths.len(), PAGES.len());
}

#[test]
fn customer_sees_only_overview() {
    let nav = nav_for(&session(&[Role::Customer]), &PAGES[0]);
    assert_eq!(keys(&nav), vec!["overview"]);
    assert!(nav[0].active);
}

#[test]
fn manager_sees_payments_and_reports_but_not_staff() {
    let nav = nav_for(&session(&[Role::Manager]), &PAGES[0]);
    assert_eq!(keys(&nav), vec!["overview", "payments", "reports"]);
}

#[test]
fn owner_sees_everything() {
    let nav = nav_for(&session(&[Role::Owner]), &PAGES[0]);
    assert_eq!(keys(&nav), vec!["overview", "payments", "reports", "staff", "settings"]);
}

#[test]
fn active_flag_follows_current_page() {
    let settings = PAGES.iter().find(|p| p.key == "settings").unwrap();
    let nav = nav_for(&session(&[Role::Admin]), settings);
    let active: Vec<_> = nav.iter().filter(|n| n.active).map(|n| n.key).collect();
    assert_eq!(active, vec!["settings"]);
}

#[test]
fn shell_carries_tenant_and_admin_flag() {
    let shell = shell_for(&PAGES[0], session(&[Role::Admin]));
    assert_eq!(shell.page, "overview");
    assert_eq!(shell.tenant_id, Some(Uuid::nil()));
    assert!(shell.can_switch_tenant);

    let shell = shell_for(&PAGES[0], session(&[Role::Owner]));
    assert!(!shell.can_switch_tenant);
}
