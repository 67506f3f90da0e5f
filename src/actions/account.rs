//! Account actions: sign-up, verification, and password reset.
//! None of these need a session.

use serde::Deserialize;
use serde_json::json;

use super::validate::Validate;
use super::{payload, ActionReply, ActionResult, Actions, Redirect, RegisterData, StatusPayload, Step};
use crate::dispatch::{AuthRequirement, CacheDirective, DescriptorBuilder, RequestDescriptor};
use crate::error::{ActionError, GENERIC_FAILURE};
use crate::graphql::mutations;
use crate::graphql::Operation;

#[derive(Debug, Deserialize)]
struct SignupPayload {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResetCodePayload {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    reset_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResetPasswordPayload {
    #[serde(default)]
    message: Option<String>,
}

fn anonymous(operation: Operation) -> DescriptorBuilder {
    RequestDescriptor::trusted(operation)
        .auth(AuthRequirement::None)
        .cache(CacheDirective::Default)
}

/// Where a validated reset code sends the user. Token and email go in as given.
pub fn reset_password_location(token: &str, email: &str) -> String {
    format!("/signin/reset-password/{}?email={}", token, email)
}

impl Actions {
    /// Create an account. The input is validated before anything is sent.
    pub async fn register(&self, data: &RegisterData) -> ActionReply {
        self.settle("register", self.try_register(data).await)
    }

    async fn try_register(&self, data: &RegisterData) -> Step<ActionReply> {
        data.validate()?;

        let descriptor = anonymous(mutations::SIGN_UP)
            .variables(json!({
                "name": data.name.trim(),
                "email": data.email.trim(),
                "password": data.password,
            }))
            .build();
        let mut response = self.run(descriptor).await?;

        match payload::<SignupPayload>(&mut response, "signup")? {
            Some(signup) => Ok(ActionReply::Done(ActionResult::ok(
                signup.message.unwrap_or_else(|| "Account created".to_string()),
            ))),
            None => Err(ActionError::Business("Failed to sign up".to_string()).into()),
        }
    }

    /// Send the account verification code again.
    pub async fn resend_verification_code(&self, email: &str) -> ActionReply {
        self.settle("resend_verification_code", self.try_resend_verification_code(email).await)
    }

    async fn try_resend_verification_code(&self, email: &str) -> Step<ActionReply> {
        let descriptor = anonymous(mutations::RESEND_VALIDATING_OTP)
            .variables(json!({ "email": email }))
            .build();
        let mut response = self.run(descriptor).await?;

        let status = StatusPayload::confirmed(
            payload(&mut response, "resendValidatingOTP")?,
            "Failed to resend the OTP code please try again.",
        )?;
        Ok(ActionReply::Done(ActionResult::ok(status.message_or("Verification code sent"))))
    }

    /// Start the password reset flow by mailing a reset code.
    pub async fn forgot_password(&self, email: &str) -> ActionReply {
        self.settle("forgot_password", self.try_forgot_password(email).await)
    }

    async fn try_forgot_password(&self, email: &str) -> Step<ActionReply> {
        if email.trim().is_empty() {
            return Err(ActionError::Validation("Invalid email".to_string()).into());
        }

        let descriptor = anonymous(mutations::FORGET_PASSWORD)
            .variables(json!({ "email": email.trim() }))
            .build();
        let mut response = self.run(descriptor).await?;

        let status = StatusPayload::confirmed(payload(&mut response, "forgetPassword")?, GENERIC_FAILURE)?;
        Ok(ActionReply::Done(ActionResult::ok(status.message_or("success"))))
    }

    /// Confirm an account with the code it was mailed.
    pub async fn verify_account(&self, email: &str, otp: &str) -> ActionReply {
        self.settle("verify_account", self.try_verify_account(email, otp).await)
    }

    async fn try_verify_account(&self, email: &str, otp: &str) -> Step<ActionReply> {
        let descriptor = anonymous(mutations::VERIFY_ACCOUNT)
            .variables(json!({ "email": email, "otp": otp }))
            .build();
        let mut response = self.run(descriptor).await?;

        let status = StatusPayload::confirmed(payload(&mut response, "verifyAccount")?, "Unexpected Error")?;
        Ok(ActionReply::Done(ActionResult::ok(status.message_or("Account verified"))))
    }

    /// Check a reset code. On success the caller is sent to the reset form
    /// with the short-lived reset token in the path; there is no result.
    pub async fn validate_reset_code(&self, email: &str, otp: &str) -> ActionReply {
        self.settle("validate_reset_code", self.try_validate_reset_code(email, otp).await)
    }

    async fn try_validate_reset_code(&self, email: &str, otp: &str) -> Step<ActionReply> {
        let descriptor = anonymous(mutations::VALIDATE_RESET_PASSWORD_OTP)
            .variables(json!({ "email": email, "otp": otp }))
            .build();
        let mut response = self.run(descriptor).await?;

        let fallback = "Invalid Server Response";
        let token = match payload::<ResetCodePayload>(&mut response, "validateResetPasswordOTP")? {
            Some(ResetCodePayload { success: Some(true), reset_token: Some(token), .. }) if !token.is_empty() => token,
            Some(ResetCodePayload { success: Some(true), .. }) => {
                return Err(ActionError::Business(fallback.to_string()).into());
            }
            Some(ResetCodePayload { message, .. }) => {
                let message = message.filter(|m| !m.trim().is_empty());
                return Err(ActionError::Business(message.unwrap_or_else(|| fallback.to_string())).into());
            }
            None => return Err(ActionError::Business(fallback.to_string()).into()),
        };

        Ok(ActionReply::Redirect(Redirect::to(reset_password_location(&token, email))))
    }

    /// Send the password reset code again.
    pub async fn resend_reset_code(&self, email: &str) -> ActionReply {
        self.settle("resend_reset_code", self.try_resend_reset_code(email).await)
    }

    async fn try_resend_reset_code(&self, email: &str) -> Step<ActionReply> {
        let descriptor = anonymous(mutations::RESEND_RESET_PASSWORD_OTP)
            .variables(json!({ "email": email }))
            .build();
        let mut response = self.run(descriptor).await?;

        let status = StatusPayload::confirmed(
            payload(&mut response, "resendResetPasswordOTP")?,
            "Failed to send the code. Please try again later",
        )?;
        Ok(ActionReply::Done(ActionResult::ok(status.message_or("Code sent successfully"))))
    }

    /// Set a new password. Authenticates with the reset token, never the session.
    pub async fn reset_password(&self, new_password: &str, token: &str) -> ActionReply {
        self.settle("reset_password", self.try_reset_password(new_password, token).await)
    }

    async fn try_reset_password(&self, new_password: &str, token: &str) -> Step<ActionReply> {
        if token.trim().is_empty() {
            return Err(ActionError::Validation("The reset link is invalid or has expired".to_string()).into());
        }
        if new_password.is_empty() {
            return Err(ActionError::Validation("Please enter a new password".to_string()).into());
        }

        let descriptor = anonymous(mutations::RESET_PASSWORD)
            .variables(json!({ "newPassword": new_password }))
            .bearer(token)
            .build();
        let mut response = self.run(descriptor).await?;

        // the backend reports no success flag here, only a message
        match payload::<ResetPasswordPayload>(&mut response, "resetPassword")?.and_then(|p| p.message) {
            Some(message) if !message.trim().is_empty() => Ok(ActionReply::Done(ActionResult::ok(message))),
            _ => Err(ActionError::Business("Failed to Reset Password".to_string()).into()),
        }
    }
}
