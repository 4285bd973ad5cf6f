use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AccountResult;
use crate::validation::{require_non_blank, validate_email};

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> AccountResult<()> {
        validate_email(&self.email)?;
        require_non_blank("password", &self.password)
    }
}

/// Response returned after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
    pub email: String,
}

/// Request body for password change.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(alias = "oldPassword")]
    pub old_password: String,
    #[serde(alias = "newPassword")]
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> AccountResult<()> {
        require_non_blank("old_password", &self.old_password)?;
        require_non_blank("new_password", &self.new_password)
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
