use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Counted in UTF-16 code units, the way mobile text fields report length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

// Same shape the mobile platform uses for its email address pattern.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9+._%\-]{1,256}@[a-zA-Z0-9][a-zA-Z0-9\-]{0,64}(\.[a-zA-Z0-9][a-zA-Z0-9\-]{0,25})+$",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Password,
    PasswordConfirm,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Password => "password",
            Field::PasswordConfirm => "password confirmation",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

/// Every field problem found in one form submission, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: Field, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// The field a form should focus: the first one that failed.
    pub fn first_field(&self) -> Option<Field> {
        self.errors.first().map(|e| e.field)
    }

    pub fn message_for(&self, field: Field) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn validate_name(name: &str, errors: &mut ValidationErrors) {
    if name.is_empty() {
        errors.add(Field::Name, "Name is required");
    }
}

pub fn validate_email(email: &str, errors: &mut ValidationErrors) {
    if email.is_empty() {
        errors.add(Field::Email, "Email must not be empty");
    } else if !is_valid_email(email) {
        errors.add(Field::Email, "Invalid email format");
    }
}

pub fn validate_password(password: &str, errors: &mut ValidationErrors) {
    if password.is_empty() {
        errors.add(Field::Password, "Password must not be empty");
    } else if password.encode_utf16().count() < MIN_PASSWORD_LENGTH {
        errors.add(Field::Password, "Password must be at least 6 characters");
    }
}

pub fn validate_password_confirm(password: &str, confirm: &str, errors: &mut ValidationErrors) {
    if confirm.is_empty() {
        errors.add(
            Field::PasswordConfirm,
            "Password confirmation must not be empty",
        );
    } else if password != confirm {
        errors.add(Field::PasswordConfirm, "Password confirmation does not match");
    }
}
