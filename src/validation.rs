//! Client-side form checks, run before any request leaves the process.

use regex::Regex;
use std::sync::LazyLock;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[A-Za-z0-9._%+'-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
    .expect("email pattern is valid")
});

/// Form field a validation message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
  Email,
  FirstName,
  LastName,
  Password,
  ConfirmPassword,
}

impl Field {
  pub fn label(self) -> &'static str {
    match self {
      Field::Email => "Email",
      Field::FirstName => "First name",
      Field::LastName => "Last name",
      Field::Password => "Password",
      Field::ConfirmPassword => "Confirm password",
    }
  }
}

/// One or more field errors, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.joined())]
pub struct ValidationFailure {
  errors: Vec<(Field, String)>,
}

impl ValidationFailure {
  fn push(&mut self, field: Field, message: &str) {
    // First failing rule wins for a field
    if self.message_for(field).is_none() {
      self.errors.push((field, message.to_string()));
    }
  }

  pub fn message_for(&self, field: Field) -> Option<&str> {
    self
      .errors
      .iter()
      .find(|(f, _)| *f == field)
      .map(|(_, m)| m.as_str())
  }

  fn joined(&self) -> String {
    let messages: Vec<&str> = self.errors.iter().map(|(_, m)| m.as_str()).collect();
    messages.join("; ")
  }

  pub fn is_empty(&self) -> bool {
    self.errors.is_empty()
  }

  fn into_result(self) -> Result<(), ValidationFailure> {
    if self.is_empty() {
      Ok(())
    } else {
      Err(self)
    }
  }
}

pub fn is_valid_email(email: &str) -> bool {
  EMAIL_RE.is_match(email.trim())
}

fn check_email(failure: &mut ValidationFailure, email: &str) {
  if !is_valid_email(email) {
    failure.push(Field::Email, "Please enter a valid email address");
  }
}

/// Create and edit forms share the same rules.
pub fn validate_user_form(
  email: &str,
  first_name: &str,
  last_name: &str,
) -> Result<(), ValidationFailure> {
  let mut failure = ValidationFailure::default();
  check_email(&mut failure, email);
  if first_name.trim().is_empty() {
    failure.push(Field::FirstName, "First name is required");
  }
  if last_name.trim().is_empty() {
    failure.push(Field::LastName, "Last name is required");
  }
  failure.into_result()
}

pub fn validate_sign_in(email: &str, password: &str) -> Result<(), ValidationFailure> {
  let mut failure = ValidationFailure::default();
  check_email(&mut failure, email);
  if password.is_empty() {
    failure.push(Field::Password, "Password is required");
  }
  failure.into_result()
}

pub fn validate_sign_up(
  email: &str,
  password: &str,
  confirm: &str,
) -> Result<(), ValidationFailure> {
  let mut failure = ValidationFailure::default();
  check_email(&mut failure, email);
  if password.chars().count() < MIN_PASSWORD_LEN {
    failure.push(Field::Password, "Password must be at least 6 characters");
  }
  if confirm.chars().count() < MIN_PASSWORD_LEN {
    failure.push(
      Field::ConfirmPassword,
      "Password must be at least 6 characters",
    );
  } else if password != confirm {
    failure.push(Field::ConfirmPassword, "Passwords don't match");
  }
  failure.into_result()
}
