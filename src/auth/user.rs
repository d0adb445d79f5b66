use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Portal roles, declared in hierarchy order
///
/// The derived ordering is the role hierarchy: a role "has" every role at or
/// below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Visitor,
    Guest,
    Student,
    Master,
    Admin,
}

impl Role {
    pub const HIERARCHY: [Role; 5] = [
        Role::Visitor,
        Role::Guest,
        Role::Student,
        Role::Master,
        Role::Admin,
    ];

    /// Map a backend numeric role code
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Role::Guest,
            1 => Role::Student,
            2 => Role::Master,
            5 => Role::Admin,
            _ => Role::Guest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Visitor => "visitor",
            Role::Guest => "guest",
            Role::Student => "student",
            Role::Master => "master",
            Role::Admin => "admin",
        }
    }

    /// Display label for badges
    pub fn label(&self) -> &'static str {
        match self {
            Role::Visitor => "Visitor",
            Role::Guest => "Guest",
            Role::Student => "Student",
            Role::Master => "Master",
            Role::Admin => "Admin",
        }
    }

    /// Check if this role is at or above `required` in the hierarchy
    pub fn includes(&self, required: Role) -> bool {
        *self >= required
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    // Unrecognized roles carry no privileges
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "guest" => Role::Guest,
            "student" => Role::Student,
            "master" => Role::Master,
            "admin" => Role::Admin,
            _ => Role::Visitor,
        })
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Role::Visitor)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque license tier tag such as `pro_univ_master` or `free`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct License(String);

impl License {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn free() -> Self {
        Self::new("free")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_pro(&self) -> bool {
        self.0.starts_with("pro")
    }

    /// Class licenses let members join their organization's classes
    pub fn is_class_license(&self) -> bool {
        self.0 == "basic_class" || self.0 == "pro_class"
    }

    /// Badge label for display
    pub fn badge(&self) -> &'static str {
        match self.0.as_str() {
            "guest" => "GUEST",
            "pro" | "pro_class" | "pro_univ_student" | "pro_univ_master" => "PRO",
            "basic_personal" | "basic_class" => "BASIC",
            _ => "FREE",
        }
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an organization license is counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    /// Unlimited users on licensed devices
    Device,
    /// Limited number of named users
    User,
}

/// One organization membership of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub account_id: String,
    pub organization_id: Option<String>,
    pub organization_name: String,
    pub role: Role,
    pub license: License,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_type: Option<LicenseType>,
    pub is_active: bool,
}

/// The membership the user is currently acting through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAccount {
    pub account_id: String,
    pub organization_id: Option<String>,
    pub organization_name: String,
    pub role: Role,
    pub license: License,
}

impl From<&Account> for CurrentAccount {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.account_id.clone(),
            organization_id: account.organization_id.clone(),
            organization_name: account.organization_name.clone(),
            role: account.role,
            license: account.license.clone(),
        }
    }
}

/// Represents a logged-in portal user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub guest_expiration_date: Option<chrono::DateTime<chrono::Utc>>,
    pub is_authenticated: bool,
    pub current_account: CurrentAccount,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl User {
    /// Creates an authenticated user acting through a single account
    pub fn new(id: impl Into<String>, name: impl Into<String>, account: Account) -> Self {
        let mut account = account;
        account.is_active = true;
        Self {
            id: id.into(),
            name: name.into(),
            email: String::new(),
            profile_image_url: None,
            guest_expiration_date: None,
            is_authenticated: true,
            current_account: CurrentAccount::from(&account),
            accounts: vec![account],
        }
    }

    pub fn role(&self) -> Role {
        self.current_account.role
    }

    pub fn license(&self) -> &License {
        &self.current_account.license
    }

    pub fn find_account(&self, account_id: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|account| account.account_id == account_id)
    }

    /// Restore the active-account invariant: `current_account` is present in
    /// `accounts` and is the only entry flagged active
    pub fn normalize_accounts(&mut self) {
        let current_id = self.current_account.account_id.clone();
        if self.find_account(&current_id).is_none() {
            self.accounts.push(Account {
                account_id: current_id.clone(),
                organization_id: self.current_account.organization_id.clone(),
                organization_name: self.current_account.organization_name.clone(),
                role: self.current_account.role,
                license: self.current_account.license.clone(),
                license_type: None,
                is_active: true,
            });
        }
        for account in &mut self.accounts {
            account.is_active = account.account_id == current_id;
        }
    }
}

/// Partial profile update; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    /// `Some(None)` clears the image
    pub profile_image_url: Option<Option<String>>,
    pub role: Option<Role>,
    pub license: Option<License>,
}

/// Data for a new, initially inactive account
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub account_id: Option<String>,
    pub organization_id: Option<String>,
    pub organization_name: Option<String>,
    pub role: Option<Role>,
    pub license: Option<License>,
    pub license_type: Option<LicenseType>,
}
