use crate::db::models::YEARS;
use crate::error::AppError;

pub const MAX_BIO_LEN: usize = 500;

pub fn validate_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();

    if !(2..=50).contains(&len) {
        return Err(AppError::Validation("Name must be 2-50 characters".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Lowercases and checks the address, optionally against one allowed domain.
pub fn validate_email(email: &str, allowed_domain: Option<&str>) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::Validation("Please provide a valid email".to_string()));
    }

    if let Some(domain) = allowed_domain {
        if !email.ends_with(&format!("@{}", domain)) {
            return Err(AppError::Validation(format!("Please use your @{} email", domain)));
        }
    }

    Ok(email)
}

pub fn validate_password(password: &str, confirm: &str) -> Result<(), AppError> {
    if password.chars().count() < 8 {
        return Err(AppError::Validation("Password must be at least 8 characters long".to_string()));
    }
    if password != confirm {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }
    Ok(())
}

pub fn validate_year(year: &str) -> Result<String, AppError> {
    let year = year.trim();
    if !YEARS.contains(&year) {
        return Err(AppError::Validation(format!(
            "Year must be one of: {}",
            YEARS.join(", ")
        )));
    }
    Ok(year.to_string())
}

pub fn validate_branch(branch: &str) -> Result<String, AppError> {
    let branch = branch.trim();
    if branch.is_empty() {
        return Err(AppError::Validation("Please provide your branch".to_string()));
    }
    Ok(branch.to_string())
}

pub fn validate_bio(bio: &str) -> Result<String, AppError> {
    if bio.chars().count() > MAX_BIO_LEN {
        return Err(AppError::Validation("Bio cannot be more than 500 characters".to_string()));
    }
    Ok(bio.trim().to_string())
}

/// Trims entries and drops blanks and duplicates, keeping first occurrence.
pub fn clean_interests(interests: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(interests.len());
    for interest in interests {
        let interest = interest.trim();
        if !interest.is_empty() && !cleaned.iter().any(|c| c == interest) {
            cleaned.push(interest.to_string());
        }
    }
    cleaned
}

pub const MAX_MENTEES_LIMIT: i64 = 20;

/// A required short text field such as a company or degree.
pub fn validate_required(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    if value.chars().count() > 100 {
        return Err(AppError::Validation(format!("{} cannot be more than 100 characters", field)));
    }
    Ok(value.to_string())
}

pub fn validate_max_mentees(max: i64) -> Result<i64, AppError> {
    if !(1..=MAX_MENTEES_LIMIT).contains(&max) {
        return Err(AppError::Validation(format!(
            "Max mentees must be between 1 and {}",
            MAX_MENTEES_LIMIT
        )));
    }
    Ok(max)
}

/// Optional profile link; blank means unset.
pub fn validate_url(url: Option<String>) -> Result<Option<String>, AppError> {
    let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) else {
        return Ok(None);
    };
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(AppError::Validation(format!("Invalid link: {}", url)));
    }
    Ok(Some(url))
}
