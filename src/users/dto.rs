use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AccountResult;
use crate::users::repo_types::{User, UserUpdate};
use crate::users::services::NewAccount;
use crate::validation::{optional_non_blank, require_non_blank, validate_email};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(alias = "firstName")]
    pub first_name: String,
    #[serde(alias = "lastName")]
    pub last_name: String,
    #[serde(default, alias = "phoneNumber")]
    pub phone_number: Option<String>,
}

impl RegisterRequest {
    pub fn validate(self) -> AccountResult<NewAccount> {
        validate_email(&self.email)?;
        require_non_blank("password", &self.password)?;
        require_non_blank("first_name", &self.first_name)?;
        require_non_blank("last_name", &self.last_name)?;
        Ok(NewAccount {
            email: self.email,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: self.phone_number,
        })
    }
}

/// Request body for a profile update. Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default, alias = "phoneNumber")]
    pub phone_number: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> AccountResult<UserUpdate> {
        optional_non_blank("first_name", self.first_name.as_deref())?;
        optional_non_blank("last_name", self.last_name.as_deref())?;
        optional_non_blank("phone_number", self.phone_number.as_deref())?;
        Ok(UserUpdate {
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: self.phone_number,
        })
    }
}

/// Query string of the internal link endpoint.
#[derive(Debug, Deserialize)]
pub struct LinkExternalIdentityParams {
    pub email: String,
    #[serde(alias = "externalId")]
    pub external_id: String,
}

impl LinkExternalIdentityParams {
    pub fn validate(&self) -> AccountResult<()> {
        validate_email(&self.email)?;
        require_non_blank("external_id", &self.external_id)
    }
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub external_identity_id: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            external_identity_id: u.external_identity_id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            phone_number: u.phone_number,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
