use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{HistoryStore, UserStore},
    error::{AppError, AppResult},
    models::{user::DATE_FORMAT, NewUser, PublicUser, ViewHistoryEntry},
    services::mail::{Mailer, OutgoingMail},
};

const MAX_USERNAME_LEN: usize = 15;
const MAX_EMAIL_LEN: usize = 50;
const MAX_IMAGE_URL_LEN: usize = 400;

// ============================================================================
// Tokens
// ============================================================================

/// Session token payload: the public user plus standard timing claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    #[serde(flatten)]
    pub user: PublicUser,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 session tokens
#[derive(Clone)]
pub struct TokenService {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: chrono::Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            header: Header::default(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: chrono::Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user: &PublicUser) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            user: user.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        // Signing failures are server faults, not bad credentials
        encode(&self.header, &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Decodes a token, rejecting bad signatures and expired tokens
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

// ============================================================================
// Passwords and reset codes
// ============================================================================

/// bcrypt is CPU-bound, so it runs off the async workers
pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

/// A reset code: the ten decimal digits in uniformly shuffled order
pub fn generate_reset_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut digits = ['1', '2', '3', '4', '5', '6', '7', '8', '9', '0'];
    digits.shuffle(rng);
    digits.iter().collect()
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub dob: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    /// Email address or username
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub curr_pass: Option<String>,
    pub new_pass: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
    pub reset_code: Option<ResetCode>,
    pub password: Option<String>,
}

/// Reset codes arrive as a JSON string or, from older clients, a number
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ResetCode {
    Text(String),
    Number(u64),
}

impl ResetCode {
    /// The code as a digit string, or `None` when blank
    pub fn normalized(&self) -> Option<String> {
        match self {
            ResetCode::Text(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            ResetCode::Number(number) => Some(number.to_string()),
        }
    }
}

impl From<&str> for ResetCode {
    fn from(code: &str) -> Self {
        ResetCode::Text(code.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user: PublicUser,
    pub history: Vec<ViewHistoryEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgotPasswordOutcome {
    CodeSent,
    PasswordReset,
}

/// Treats absent and empty fields alike; returns the value trimmed
fn required<'a>(value: &'a Option<String>, field: &str) -> AppResult<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::InvalidInput(format!(
            "{} is not available in request body",
            field
        ))),
    }
}

/// Presence check for secrets, which are used exactly as sent
fn required_secret<'a>(value: &'a Option<String>, field: &str) -> AppResult<&'a str> {
    required(value, field)?;
    Ok(value.as_deref().unwrap_or_default())
}

fn within(value: &str, max: usize, field: &str) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

// ============================================================================
// Service
// ============================================================================

/// Account flows: signup, login, profile, password change and reset
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    history: Arc<dyn HistoryStore>,
    tokens: TokenService,
    mailer: Mailer,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        history: Arc<dyn HistoryStore>,
        tokens: TokenService,
        mailer: Mailer,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            history,
            tokens,
            mailer,
            bcrypt_cost,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn signup(&self, request: SignupRequest) -> AppResult<()> {
        let email = required(&request.email, "Email")?;
        let password = required_secret(&request.password, "Password")?;
        let username = required(&request.username, "Username")?;
        let dob = required(&request.dob, "Dob")?;
        let image_url = required(&request.image_url, "imageUrl")?;

        within(username, MAX_USERNAME_LEN, "Username")?;
        within(email, MAX_EMAIL_LEN, "Email")?;
        within(image_url, MAX_IMAGE_URL_LEN, "imageUrl")?;

        let dob = NaiveDate::parse_from_str(dob, DATE_FORMAT).map_err(|_| {
            AppError::InvalidInput(format!(
                "Dob '{}' must look like '07 Mar 1994'",
                dob
            ))
        })?;

        let password_hash = hash_password(password.to_string(), self.bcrypt_cost).await?;

        let user = NewUser {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            dob,
            password_hash,
            image_url: image_url.to_string(),
            created_on: Utc::now().date_naive(),
        };

        if !self.users.create_user(&user).await? {
            return Err(AppError::Conflict("User already exist".to_string()));
        }

        tracing::info!(user_id = %user.user_id, username = %user.username, "User created");
        Ok(())
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResult> {
        let login = required(&request.email, "Email")?;
        let password = required_secret(&request.password, "Password")?;

        let user = self
            .users
            .find_by_login(login)
            .await?
            .ok_or_else(|| AppError::NotFound("There is no user with this email".to_string()))?;

        if !verify_password(password.to_string(), user.password.clone()).await? {
            tracing::info!(user_id = %user.user_id, "Login rejected: bad password");
            return Err(AppError::NotFound("Invalid user credentials".to_string()));
        }

        let public = PublicUser::from(&user);
        let token = self.tokens.issue(&public)?;

        tracing::info!(user_id = %user.user_id, "Login successful");
        Ok(LoginResult {
            token,
            user: public,
        })
    }

    pub async fn profile(&self, user_id: Uuid) -> AppResult<Profile> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Could not find any user details".to_string()))?;

        let history = self.history.get_history(user_id).await?;

        Ok(Profile {
            user: PublicUser::from(&user),
            history,
        })
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> AppResult<()> {
        let current = required_secret(&request.curr_pass, "Current password")?;
        let new = required_secret(&request.new_pass, "New password")?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Could not find any user details".to_string()))?;

        if !verify_password(current.to_string(), user.password.clone()).await? {
            return Err(AppError::InvalidInput(
                "Enter the correct password".to_string(),
            ));
        }

        let password_hash = hash_password(new.to_string(), self.bcrypt_cost).await?;
        self.users.update_password(user_id, &password_hash).await?;

        self.mailer
            .send_in_background(OutgoingMail::password_changed(&user.email));

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Two-phase reset: without a code, mail one; with a code, apply the new password
    pub async fn forgot_password(
        &self,
        request: ForgotPasswordRequest,
    ) -> AppResult<ForgotPasswordOutcome> {
        let email = required(&request.email, "Email")?;

        let Some(code) = request.reset_code.as_ref().and_then(ResetCode::normalized) else {
            if self.users.find_by_email(email).await?.is_none() {
                return Err(AppError::NotFound("User not found".to_string()));
            }

            let code = generate_reset_code(&mut rand::thread_rng());
            self.users.set_reset_code(email, &code).await?;
            self.mailer
                .send_in_background(OutgoingMail::reset_code(email, &code));

            tracing::info!(email = %email, "Reset code issued");
            return Ok(ForgotPasswordOutcome::CodeSent);
        };

        let password = required_secret(&request.password, "Password")?;
        let password_hash = hash_password(password.to_string(), self.bcrypt_cost).await?;

        if !self
            .users
            .reset_password(email, &code, &password_hash)
            .await?
        {
            return Err(AppError::InvalidInput(
                "Incorrect verification code. Check your email".to_string(),
            ));
        }

        tracing::info!(email = %email, "Password reset");
        Ok(ForgotPasswordOutcome::PasswordReset)
    }
}
