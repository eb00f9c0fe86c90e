use std::collections::HashMap;

use crate::session::Role;

pub const LANDING: &str = "/";
pub const STUDENT_LOGIN: &str = "/student/login";
pub const STAFF_LOGIN: &str = "/staff/login";
pub const STUDENT_DASHBOARD: &str = "/student/dashboard";
pub const STAFF_DASHBOARD: &str = "/staff/dashboard";

const STUDENT_ONLY: &[Role] = &[Role::Student];
const STAFF_ONLY: &[Role] = &[Role::Staff];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected {
        allowed_roles: &'static [Role],
        redirect_to: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    pub pattern: &'static str,
    pub name: &'static str,
    pub access: Access,
}

const fn public(pattern: &'static str, name: &'static str) -> RouteSpec {
    RouteSpec {
        pattern,
        name,
        access: Access::Public,
    }
}

const fn student(pattern: &'static str, name: &'static str) -> RouteSpec {
    RouteSpec {
        pattern,
        name,
        access: Access::Protected {
            allowed_roles: STUDENT_ONLY,
            redirect_to: STUDENT_LOGIN,
        },
    }
}

const fn staff(pattern: &'static str, name: &'static str) -> RouteSpec {
    RouteSpec {
        pattern,
        name,
        access: Access::Protected {
            allowed_roles: STAFF_ONLY,
            redirect_to: STAFF_LOGIN,
        },
    }
}

pub static ROUTES: &[RouteSpec] = &[
    // Public
    public(LANDING, "landing"),
    public(STUDENT_LOGIN, "student-login"),
    public(STAFF_LOGIN, "staff-login"),
    public("/student/signup", "student-signup"),
    public("/staff/signup", "staff-signup"),
    // Student
    student(STUDENT_DASHBOARD, "student-dashboard"),
    student("/newRequest", "new-request"),
    student("/pendingRequests", "pending-requests"),
    student("/requestHistory", "request-history"),
    student("/requestStatus/:id", "request-status"),
    student("/student/profile", "student-profile"),
    student("/bonafideDept", "bonafide-form"),
    student("/internship", "internship-form"),
    // Staff
    staff(STAFF_DASHBOARD, "staff-dashboard"),
    staff("/incomingRequests", "incoming-requests"),
    staff("/approvalHistory", "approval-history"),
    staff("/editRequirements", "edit-requirements"),
    staff("/staff/profile", "staff-profile"),
    staff("/internshipEdit", "internship-edit"),
];

/// Home screen for a role
pub fn dashboard_for(role: Role) -> &'static str {
    match role {
        Role::Student => STUDENT_DASHBOARD,
        Role::Staff => STAFF_DASHBOARD,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute {
    pub spec: &'static RouteSpec,
    pub params: HashMap<String, String>,
}

impl MatchedRoute {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn match_pattern(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts = segments(pattern);
    let path_parts = segments(path);
    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (expected, actual) in pattern_parts.iter().zip(path_parts.iter()) {
        if let Some(name) = expected.strip_prefix(':') {
            params.insert(name.to_string(), (*actual).to_string());
        } else if expected != actual {
            return None;
        }
    }
    Some(params)
}

/// Match a path against the route table. Query strings and fragments are
/// ignored; `None` means not found.
pub fn resolve(path: &str) -> Option<MatchedRoute> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    ROUTES.iter().find_map(|spec| {
        match_pattern(spec.pattern, path).map(|params| MatchedRoute { spec, params })
    })
}
