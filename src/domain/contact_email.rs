use validator::validate_email;

/// A syntactically valid, normalized email address.
///
/// The domain must be a dotted host name ending in an alphabetic top-level
/// label; bare hosts and address literals are refused.
///
/// Normalization lowercases the address and strips sub-address tags for
/// providers that deliver them to the base mailbox. Gmail addresses also
/// lose their dots and `googlemail.com` is folded into `gmail.com`, so every
/// spelling of the same mailbox compares equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactEmail(String);

impl ContactEmail {
    pub fn parse(s: String) -> Result<Self, String> {
        let trimmed = s.trim();
        if validate_email(trimmed) && has_public_domain(trimmed) {
            Ok(Self(normalize(trimmed)))
        } else {
            Err("Please provide a valid email address".to_string())
        }
    }
}

fn has_public_domain(email: &str) -> bool {
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if domain.starts_with('[') {
        return false;
    }
    let mut labels = domain.rsplit('.');
    let top_level = labels.next().unwrap_or_default();
    if labels.next().is_none() {
        return false;
    }
    let top_level = top_level.to_lowercase();
    top_level.starts_with("xn--")
        || (top_level.chars().count() >= 2 && top_level.chars().all(char::is_alphabetic))
}

/// Sub-address separator used by a provider, if it has one.
fn tag_separator(domain: &str) -> Option<char> {
    match domain {
        "gmail.com" | "googlemail.com" => Some('+'),
        "outlook.com" | "hotmail.com" | "live.com" => Some('+'),
        "icloud.com" | "me.com" => Some('+'),
        "yahoo.com" | "ymail.com" | "rocketmail.com" => Some('-'),
        _ => None,
    }
}

fn normalize(email: &str) -> String {
    let lowercased = email.to_lowercase();
    let Some((local, domain)) = lowercased.rsplit_once('@') else {
        return lowercased;
    };
    let Some(separator) = tag_separator(domain) else {
        return lowercased;
    };
    let mut canonical_local = local.split(separator).next().unwrap_or(local).to_string();
    let mut domain = domain;
    if domain == "gmail.com" || domain == "googlemail.com" {
        canonical_local.retain(|c| c != '.');
        domain = "gmail.com";
    }
    if canonical_local.is_empty() {
        return lowercased;
    }
    format!("{}@{}", canonical_local, domain)
}

impl AsRef<str> for ContactEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContactEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
