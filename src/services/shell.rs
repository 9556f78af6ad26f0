//! Dashboard shell: page registry and role-filtered sidebar navigation.

use serde::Serialize;
use uuid::Uuid;

use super::role::{Role, RoleSet};
use super::session::Session;

/// A protected dashboard page.
#[derive(Debug)]
pub struct Page {
    pub key: &'static str,
    pub path: &'static str,
    pub title: &'static str,
    /// Empty means any authenticated user.
    pub roles: &'static [Role],
}

impl Page {
    #[must_use]
    pub fn required_roles(&self) -> RoleSet {
        RoleSet::from(self.roles)
    }

    #[must_use]
    pub fn visible_to(&self, session: &Session) -> bool {
        self.roles.is_empty() || session.roles().intersects(&self.required_roles())
    }
}

const MANAGEMENT: &[Role] = &[Role::Owner, Role::Admin, Role::Manager];
const ADMINISTRATION: &[Role] = &[Role::Owner, Role::Admin];

pub const PAGES: &[Page] = &[
    Page { key: "overview", path: "/dashboard", title: "Overview", roles: &[] },
    Page { key: "payments", path: "/dashboard/payments", title: "Payments", roles: MANAGEMENT },
    Page { key: "reports", path: "/dashboard/reports", title: "Reports", roles: MANAGEMENT },
    Page { key: "staff", path: "/dashboard/staff", title: "Staff", roles: ADMINISTRATION },
    Page { key: "settings", path: "/dashboard/settings", title: "Settings", roles: ADMINISTRATION },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub key: &'static str,
    pub path: &'static str,
    pub title: &'static str,
    pub active: bool,
}

/// Layout description returned for every dashboard page.
#[derive(Debug, Clone, Serialize)]
pub struct PageShell {
    pub page: &'static str,
    pub title: &'static str,
    pub user: Session,
    pub tenant_id: Option<Uuid>,
    /// Platform admins see tenant switching controls.
    pub can_switch_tenant: bool,
    pub nav: Vec<NavItem>,
}

/// Sidebar entries the session may open, marking `current` as active.
#[must_use]
pub fn nav_for(session: &Session, current: &Page) -> Vec<NavItem> {
    PAGES
        .iter()
        .filter(|p| p.visible_to(session))
        .map(|p| NavItem { key: p.key, path: p.path, title: p.title, active: p.key == current.key })
        .collect()
}

#[must_use]
pub fn shell_for(page: &Page, session: Session) -> PageShell {
    PageShell {
        page: page.key,
        title: page.title,
        nav: nav_for(&session, page),
        tenant_id: session.current_tenant(),
        can_switch_tenant: session.has_role(Role::Admin),
        user: session,
    }
}

#[cfg(test)]
#[path = "shell_test.rs"]
mod tests;
