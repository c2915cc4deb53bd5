//! Display-side redaction for emails and identifiers.

/// Rendered for absent or empty input.
pub const PLACEHOLDER: &str = "---";

const EMAIL_MARKER: &str = "***";
const ID_MARKER: &str = "...";

/// Masks the local part of an email, keeping its first three characters and
/// the full domain: `abc@example.com` → `abc***@example.com`.
///
/// Input without a domain part (no `@`, or nothing after it) is returned
/// unchanged.
pub fn mask_email(email: Option<&str>) -> String {
    let email = match email {
        Some(e) if !e.is_empty() => e,
        _ => return PLACEHOLDER.to_owned(),
    };

    let Some((local, domain)) = email.split_once('@').filter(|(_, d)| !d.is_empty()) else {
        return email.to_owned();
    };

    let prefix: String = local.chars().take(3).collect();
    format!("{prefix}{EMAIL_MARKER}@{domain}")
}

/// Keeps the first and last four characters of an identifier:
/// `1234567890` → `1234...7890`.
///
/// Inputs shorter than eight characters are not special-cased, so the two
/// halves overlap (`abc` → `abc...abc`).
pub fn mask_id(id: Option<&str>) -> String {
    let id = match id {
        Some(s) if !s.is_empty() => s,
        _ => return PLACEHOLDER.to_owned(),
    };

    let chars: Vec<char> = id.chars().collect();
    let head: String = chars.iter().take(4).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{head}{ID_MARKER}{tail}")
}
