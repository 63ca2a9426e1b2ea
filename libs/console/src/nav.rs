//! Admin console surfaces and their access requirements

use crate::role::Role;

/// Entry point of the admin console
pub const ADMIN_PATH: &str = "/admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminSection {
    Dashboard,
    Blogs,
    Services,
    Leads,
    Faqs,
    Users,
    Settings,
}

impl AdminSection {
    /// Sidebar order
    pub const ALL: [AdminSection; 7] = [
        AdminSection::Dashboard,
        AdminSection::Blogs,
        AdminSection::Services,
        AdminSection::Leads,
        AdminSection::Faqs,
        AdminSection::Users,
        AdminSection::Settings,
    ];

    pub fn path(self) -> &'static str {
        match self {
            AdminSection::Dashboard => ADMIN_PATH,
            AdminSection::Blogs => "/admin/blogs",
            AdminSection::Services => "/admin/services",
            AdminSection::Leads => "/admin/leads",
            AdminSection::Faqs => "/admin/faqs",
            AdminSection::Users => "/admin/users",
            AdminSection::Settings => "/admin/settings",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AdminSection::Dashboard => "Dashboard",
            AdminSection::Blogs => "Blogs",
            AdminSection::Services => "Services",
            AdminSection::Leads => "Leads",
            AdminSection::Faqs => "FAQs",
            AdminSection::Users => "Users",
            AdminSection::Settings => "Settings",
        }
    }

    /// Weakest role allowed to open the section
    pub fn required_role(self) -> Role {
        match self {
            AdminSection::Users | AdminSection::Settings => Role::SuperAdmin,
            _ => Role::Editor,
        }
    }

    /// Section owning `path`: exact match for the dashboard, prefix for the rest
    pub fn from_path(path: &str) -> Option<AdminSection> {
        let path = path.trim_end_matches('/');
        if path == ADMIN_PATH {
            return Some(AdminSection::Dashboard);
        }

        AdminSection::ALL[1..].iter().copied().find(|section| {
            path.strip_prefix(section.path())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(AdminSection::from_path("/admin"), Some(AdminSection::Dashboard));
        assert_eq!(AdminSection::from_path("/admin/"), Some(AdminSection::Dashboard));
        assert_eq!(AdminSection::from_path("/admin/leads"), Some(AdminSection::Leads));
        assert_eq!(
            AdminSection::from_path("/admin/blogs/42/edit"),
            Some(AdminSection::Blogs)
        );
        assert_eq!(AdminSection::from_path("/admin/blogsx"), None);
        assert_eq!(AdminSection::from_path("/blog"), None);
    }

    #[test]
    fn test_required_roles() {
        assert_eq!(AdminSection::Users.required_role(), Role::SuperAdmin);
        assert_eq!(AdminSection::Settings.required_role(), Role::SuperAdmin);
        assert_eq!(AdminSection::Leads.required_role(), Role::Editor);
    }
}
