use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubject(String);

impl ContactSubject {
    pub const MIN_LENGTH: usize = 5;
    pub const MAX_LENGTH: usize = 100;

    pub fn parse(s: String) -> Result<Self, String> {
        let trimmed = s.trim();
        let length = trimmed.graphemes(true).count();
        if (Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err("Subject must be between 5 and 100 characters".to_string())
        }
    }
}

impl AsRef<str> for ContactSubject {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
