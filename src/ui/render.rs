//! ui::render
//!
//! Plain-text rendering of listings and session status.

use std::fmt::Write as _;

use super::output::{format_id, format_list};
use crate::auth::SessionStatus;
use crate::console::navigation::Route;
use crate::console::pagination::Pagination;
use crate::core::types::{Department, SubDepartment};

/// One line per department, with its sub-departments beneath it.
pub fn departments(items: &[Department]) -> String {
    let mut out = String::new();
    for (i, department) in items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{}  {}", format_id(department.id), department.name);
        if department.sub_departments.is_empty() {
            continue;
        }
        let subs: Vec<String> = department
            .sub_departments
            .iter()
            .map(|s| format!("{}  {}", format_id(s.id), s.name))
            .collect();
        let _ = write!(out, "\n{}", format_list(&subs, "    - "));
    }
    out
}

/// One line per sub-department, naming its department.
pub fn sub_departments(items: &[SubDepartment]) -> String {
    let lines: Vec<String> = items
        .iter()
        .map(|s| {
            format!(
                "{}  {}  ({} {})",
                format_id(s.id),
                s.name,
                s.department.name,
                format_id(s.department.id)
            )
        })
        .collect();
    format_list(&lines, "")
}

/// Pager footer. Empty when everything fits on one page.
pub fn pagination(pagination: &Pagination) -> String {
    if !pagination.is_needed() {
        return String::new();
    }
    let mut footer = format!("{} ({} total)", pagination, pagination.total);
    if pagination.can_next {
        let _ = write!(footer, ", next: --page {}", pagination.page + 1);
    }
    footer
}

pub fn status(status: &SessionStatus, route: Route) -> String {
    match status {
        SessionStatus::Loading => "Session: loading".to_string(),
        SessionStatus::Anonymous => format!("Not logged in (view: {})", route.path()),
        SessionStatus::Authenticated(session) => {
            let mut line = format!("Logged in as {}", session.identity.username);
            if let Some(at) = session.identity.logged_in_at {
                let _ = write!(line, " since {}", at.format("%Y-%m-%d %H:%M UTC"));
            }
            let _ = write!(line, " (view: {})", route.path());
            line
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credential, Identity, Session};
    use crate::core::types::{DepartmentRef, EntityId, SubDepartmentSummary};

    fn department(id: i64, name: &str, subs: &[(i64, &str)]) -> Department {
        Department {
            id: EntityId::new(id),
            name: name.to_string(),
            sub_departments: subs
                .iter()
                .map(|(id, name)| SubDepartmentSummary {
                    id: EntityId::new(*id),
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn departments_nest_their_sub_departments() {
        let text = departments(&[
            department(1, "Engineering", &[(2, "Platform")]),
            department(3, "Sales", &[]),
        ]);
        assert_eq!(text, "#1  Engineering\n    - #2  Platform\n#3  Sales");
    }

    #[test]
    fn sub_departments_name_their_owner() {
        let text = sub_departments(&[SubDepartment {
            id: EntityId::new(2),
            name: "Platform".into(),
            department: DepartmentRef {
                id: EntityId::new(1),
                name: "Engineering".into(),
            },
        }]);
        assert_eq!(text, "#2  Platform  (Engineering #1)");
    }

    #[test]
    fn footer_only_when_paged() {
        assert_eq!(pagination(&Pagination::new(1, 10, 4, false)), "");
        assert_eq!(
            pagination(&Pagination::new(1, 10, 12, true)),
            "Page 1 of 2 (12 total), next: --page 2"
        );
    }

    #[test]
    fn status_lines() {
        assert_eq!(
            status(&SessionStatus::Anonymous, Route::Login),
            "Not logged in (view: /login)"
        );
        let session = Session {
            credential: Credential::new("tok"),
            identity: Identity::new("ada"),
        };
        let line = status(&SessionStatus::Authenticated(session), Route::Departments);
        assert_eq!(line, "Logged in as ada (view: /departments)");
    }
}
