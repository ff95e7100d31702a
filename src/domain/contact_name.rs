use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactName(String);

impl ContactName {
    pub const MIN_LENGTH: usize = 2;
    pub const MAX_LENGTH: usize = 50;

    /// Trims the input and checks it is 2 to 50 characters made of ASCII
    /// letters and whitespace. The length rule is reported first.
    pub fn parse(s: String) -> Result<Self, String> {
        let trimmed = s.trim();
        let length = trimmed.graphemes(true).count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            return Err("Name must be between 2 and 50 characters".to_string());
        }
        let only_letters_and_spaces = trimmed
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace());
        if !only_letters_and_spaces {
            return Err("Name can only contain letters and spaces".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl AsRef<str> for ContactName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
