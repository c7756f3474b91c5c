use thiserror::Error;

/// Write-time validation failures for domain entities
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("user {user_id} must belong to the same company (user company {user_company_id}, activity company {company_id})")]
    UserCompanyMismatch {
        user_id: i64,
        user_company_id: i64,
        company_id: i64,
    },

    #[error("invalid date: failed to parse {0}")]
    InvalidDate(String),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("email {email} is already taken within company {company_id}")]
    EmailTaken { email: String, company_id: i64 },

    #[error("name must not be blank")]
    BlankName,

    #[error("company name {0} is already taken")]
    CompanyNameTaken(String),
}
