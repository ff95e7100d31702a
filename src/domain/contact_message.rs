use unicode_segmentation::UnicodeSegmentation;

/// Body of a contact submission, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage(String);

impl ContactMessage {
    pub const MIN_LENGTH: usize = 10;
    pub const MAX_LENGTH: usize = 1000;

    pub fn parse(s: String) -> Result<Self, String> {
        let trimmed = s.trim();
        let length = trimmed.graphemes(true).count();
        if (Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err("Message must be between 10 and 1000 characters".to_string())
        }
    }
}

impl AsRef<str> for ContactMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
