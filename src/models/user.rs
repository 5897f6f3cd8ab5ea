use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Role {
    Admin,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Client => "Client",
        }
    }

    /// Landing page for a signed-in user of this role.
    pub fn home(&self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Client => "/home",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip)] // never serialize password hash
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub created_at: i64,
}

/// Registration payload. Fields are optional so that a missing field is
/// reported as a validation message rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterReq {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterReq {
    /// Validates in field order and returns the first failure message.
    pub fn validate(self) -> Result<NewUser, &'static str> {
        let name = self.name.unwrap_or_default().trim().to_string();
        if name.chars().count() < 3 {
            return Err("Full name must be at least 3 characters");
        }
        let email = self.email.unwrap_or_default().trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err("Invalid email address");
        }
        let password = self.password.unwrap_or_default();
        if password.chars().count() < 6 {
            return Err("Password must be at least 6 characters");
        }
        Ok(NewUser { name, email, password })
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !email.chars().any(char::is_whitespace)
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}
