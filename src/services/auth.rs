//! Account endpoints: login, profile, verification codes, password reset

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{Account, License, Role, TokenPair, User};
use crate::error::Result;
use crate::http::{ApiClient, RequestOptions};
use crate::routes::paths;

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub login_id: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

/// `GET /user/profile` body
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    #[serde(default)]
    pub email: Option<String>,
    pub real_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    /// Numeric role code: 0 guest, 1 student, 2 master, 5 admin
    pub role: i64,
    #[serde(default)]
    pub organization_id: Option<i64>,
    #[serde(default)]
    pub organization_name: Option<String>,
}

impl UserProfile {
    pub fn role(&self) -> Role {
        Role::from_code(self.role)
    }

    /// License implied by the role and organization membership
    pub fn license(&self) -> License {
        match self.role() {
            Role::Master => License::new("pro_univ_master"),
            Role::Admin => License::new("admin"),
            Role::Student if self.organization_id.is_some() => License::new("pro_univ_student"),
            _ => License::free(),
        }
    }

    /// Session user for this profile, acting through its single account
    pub fn into_user(self, login_id: &str) -> User {
        let account = Account {
            account_id: format!("acc_{}", self.id),
            organization_id: self.organization_id.map(|id| id.to_string()),
            organization_name: self.organization_name.clone().unwrap_or_default(),
            role: self.role(),
            license: self.license(),
            license_type: None,
            is_active: true,
        };

        let mut user = User::new(login_id, self.real_name, account);
        user.email = self.email.unwrap_or_default();
        user.profile_image_url = self.profile_image_url;
        user
    }
}

/// Generic `{ message }` acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Dashboard a freshly logged-in user lands on
pub fn landing_path(role: Role) -> &'static str {
    match role {
        Role::Admin => paths::ADMIN_DASHBOARD,
        Role::Master => paths::MASTER_DASHBOARD,
        Role::Student => paths::STUDENT_DASHBOARD,
        Role::Guest | Role::Visitor => paths::HOME,
    }
}

/// Account operations bound to one [`ApiClient`]
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Authenticate, store the issued tokens, load the profile and start the
    /// session
    pub async fn login(&self, login_id: &str, password: &str) -> Result<User> {
        let response: LoginResponse = self
            .client
            .post(
                "/user/login",
                &LoginRequest { login_id, password },
                RequestOptions::new().skip_auth(),
            )
            .await?;

        let tokens = TokenPair::new(response.access_token, response.refresh_token);
        self.client.auth().tokens().set(&tokens);

        let profile = match self.profile().await {
            Ok(profile) => profile,
            Err(e) => {
                self.client.auth().tokens().clear();
                return Err(e);
            }
        };

        let user = profile.into_user(login_id);
        self.client.auth().login(user.clone(), None);
        info!("Logged in {} as {}", login_id, user.role());
        Ok(user)
    }

    pub async fn profile(&self) -> Result<UserProfile> {
        self.client.get("/user/profile", RequestOptions::new()).await
    }

    /// Local logout; the backend keeps no session to end
    pub fn logout(&self) {
        self.client.auth().logout();
    }

    pub async fn send_verification_email(&self, email: &str) -> Result<MessageResponse> {
        self.client
            .post(
                "/auth/send-verification-email",
                &json!({ "email": email }),
                RequestOptions::new(),
            )
            .await
    }

    pub async fn verify_verification_code(
        &self,
        email: &str,
        verification_code: &str,
    ) -> Result<MessageResponse> {
        self.client
            .post(
                "/auth/verify-verification-code",
                &json!({ "email": email, "verificationCode": verification_code }),
                RequestOptions::new(),
            )
            .await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse> {
        self.client
            .post(
                "/auth/password-reset",
                &json!({ "email": email }),
                RequestOptions::new().skip_auth(),
            )
            .await
    }

    pub async fn send_deletion_code(&self) -> Result<MessageResponse> {
        self.client
            .post("/auth/send-deletion-code", &json!({}), RequestOptions::new())
            .await
    }

    pub async fn verify_deletion_code(&self, deletion_code: &str) -> Result<MessageResponse> {
        self.client
            .post(
                "/auth/verify-deletion-code",
                &json!({ "deletionCode": deletion_code }),
                RequestOptions::new(),
            )
            .await
    }

    pub async fn change_password_by_reset_token(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<MessageResponse> {
        self.client
            .post(
                "/user/change-password",
                &json!({ "resetToken": reset_token, "newPassword": new_password }),
                RequestOptions::new().skip_auth(),
            )
            .await
    }
}
