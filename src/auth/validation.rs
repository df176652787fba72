use serde::Deserialize;

use crate::error::FieldError;

pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Raw sign-up body, exactly as deserialized from the request.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
}

/// Raw sign-in body.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Normalized sign-up payload: trimmed name, lower-cased email, defaulted
/// role. Password is still plaintext at this stage and nowhere later.
#[derive(Debug, Clone)]
pub struct SignUpData {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct SignInData {
    pub email: String,
    pub password: String,
}

pub fn validate_sign_up(req: &SignUpRequest) -> Result<SignUpData, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = req.name.trim().to_string();
    let name_len = name.chars().count();
    if name_len < 2 {
        errors.push(FieldError::new("name", "Name must be at least 2 characters"));
    } else if name_len > 255 {
        errors.push(FieldError::new("name", "Name is too long"));
    }

    let email = normalize_email(&req.email);
    if let Err(e) = check_email(&email) {
        errors.push(e);
    }

    if let Err(e) = check_password(&req.password) {
        errors.push(e);
    }

    let role = match req.role.as_deref() {
        None => Role::default(),
        Some(raw) => Role::parse(raw).unwrap_or_else(|| {
            errors.push(FieldError::new("role", "Role must be 'user' or 'admin'"));
            Role::default()
        }),
    };

    if errors.is_empty() {
        Ok(SignUpData {
            name,
            email,
            password: req.password.clone(),
            role,
        })
    } else {
        Err(errors)
    }
}

pub fn validate_sign_in(req: &SignInRequest) -> Result<SignInData, Vec<FieldError>> {
    let mut errors = Vec::new();

    let email = normalize_email(&req.email);
    if let Err(e) = check_email(&email) {
        errors.push(e);
    }

    if let Err(e) = check_password(&req.password) {
        errors.push(e);
    }

    if errors.is_empty() {
        Ok(SignInData {
            email,
            password: req.password.clone(),
        })
    } else {
        Err(errors)
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn check_email(email: &str) -> Result<(), FieldError> {
    if email.chars().count() > 255 {
        return Err(FieldError::new("email", "Email is too long"));
    }
    if !is_valid_email(email) {
        return Err(FieldError::new("email", "Invalid email address"));
    }
    Ok(())
}

// Passwords are deliberately not trimmed; leading/trailing whitespace is
// significant.
fn check_password(password: &str) -> Result<(), FieldError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN {
        return Err(FieldError::new(
            "password",
            "Password must be at least 6 characters",
        ));
    }
    if len > PASSWORD_MAX {
        return Err(FieldError::new("password", "Password is too long"));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    if email.matches('@').count() != 1 || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
