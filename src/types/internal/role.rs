/// Closed set of user roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    User,
    CompanyAdmin,
    Admin,
}

impl UserRole {
    /// String representation used for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::CompanyAdmin => "company_admin",
            Self::Admin => "admin",
        }
    }
}
