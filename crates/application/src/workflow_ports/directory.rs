use async_trait::async_trait;
use ruleflow_core::{AppResult, TenantId, UserId};
use serde::{Deserialize, Serialize};

/// Phone number as returned by the user directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhoneNumber {
    /// Country dial code, e.g. `+91`.
    pub dial_code: String,
    /// Local number.
    pub value: String,
    /// Whether this is the primary number.
    pub primary: bool,
}

impl PhoneNumber {
    /// Renders the number with its dial code.
    #[must_use]
    pub fn formatted(&self) -> String {
        format!("{} {}", self.dial_code, self.value)
            .trim()
            .to_owned()
    }
}

/// User as returned by the user directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    /// User id; zero when the profile is a degraded default.
    pub id: i64,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Phone numbers.
    pub phone_numbers: Vec<PhoneNumber>,
    /// Job title.
    pub designation: String,
    /// Department.
    pub department: String,
    /// IANA timezone.
    pub timezone: String,
}

impl UserProfile {
    /// Returns first and last name joined by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// Tenant as returned by the tenant directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantProfile {
    /// Tenant id.
    pub id: i64,
    /// Account name.
    pub account_name: String,
    /// Company name.
    pub company_name: String,
    /// Company website.
    pub website: String,
    /// Industry.
    pub industry: String,
    /// IANA timezone.
    pub timezone: String,
}

/// Currency as returned by the configuration directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Currency {
    /// Currency id.
    pub id: i64,
    /// Display code, e.g. `USD`.
    pub name: String,
}

/// Port for the user, tenant and currency directories.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Fetches one user.
    async fn user(&self, token: &str, user_id: UserId) -> AppResult<UserProfile>;

    /// Fetches one tenant.
    async fn tenant(&self, token: &str, tenant_id: TenantId) -> AppResult<TenantProfile>;

    /// Fetches one currency.
    async fn currency(&self, token: &str, currency_id: i64) -> AppResult<Currency>;
}
