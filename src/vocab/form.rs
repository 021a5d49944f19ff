use thiserror::Error;

use super::word::{MasteryLevel, NewWord};

pub const COMMON_TAGS: &[&str] = &[
    "Noun",
    "Verb",
    "Adjective",
    "Adverb",
    "JLPT N5",
    "JLPT N4",
    "JLPT N3",
    "Daily Life",
    "Work",
    "Travel",
    "Food",
];

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("word is required")]
    EmptyHeadword,
    #[error("email and password are required")]
    MissingCredentials,
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}

/// What the user is typing into the add-word form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordDraft {
    pub word: String,
    pub reading: String,
    pub meaning: String,
    pub tags: Vec<String>,
}

/// Form action requested alongside the posted draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftAction {
    Save,
    AddTag(String),
    AddCustomTag,
    RemoveTag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    pub word: String,
    pub reading: Option<String>,
    pub meaning: Option<String>,
    pub tags: Vec<String>,
}

impl ValidDraft {
    pub fn into_new_word(self, user_id: &str) -> NewWord {
        NewWord {
            user_id: user_id.to_string(),
            word: self.word,
            reading: self.reading,
            meaning: self.meaning,
            tags: self.tags,
            mastery_level: MasteryLevel::New,
        }
    }
}

impl WordDraft {
    pub fn headword(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            ..Self::default()
        }
    }

    /// Adds a trimmed tag unless it is blank or already selected.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|existing| existing == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|existing| existing != tag);
    }

    pub fn available_common_tags(&self) -> Vec<&'static str> {
        COMMON_TAGS
            .iter()
            .copied()
            .filter(|tag| !self.tags.iter().any(|existing| existing == tag))
            .collect()
    }

    /// Rebuilds a draft and the requested action from urlencoded form pairs.
    ///
    /// Recognised fields: `word`, `reading`, `meaning`, repeated `tags`,
    /// `custom_tag`, and one of `add_tag` / `remove_tag` / `add_custom_tag`
    /// submit buttons. Anything else is ignored.
    pub fn from_form(pairs: &[(String, String)]) -> (Self, DraftAction) {
        let mut draft = WordDraft::default();
        let mut custom_tag = String::new();
        let mut action = DraftAction::Save;

        for (key, value) in pairs {
            match key.as_str() {
                "word" => draft.word = value.clone(),
                "reading" => draft.reading = value.clone(),
                "meaning" => draft.meaning = value.clone(),
                "tags" => {
                    draft.add_tag(value);
                }
                "custom_tag" => custom_tag = value.clone(),
                "add_tag" => action = DraftAction::AddTag(value.clone()),
                "remove_tag" => action = DraftAction::RemoveTag(value.clone()),
                "add_custom_tag" => action = DraftAction::AddCustomTag,
                _ => {}
            }
        }

        // The custom tag box is committed on save too, so Enter in that field
        // never silently loses what was typed.
        match &action {
            DraftAction::AddTag(tag) => {
                let tag = tag.clone();
                draft.add_tag(&tag);
            }
            DraftAction::RemoveTag(tag) => {
                let tag = tag.clone();
                draft.remove_tag(&tag);
            }
            DraftAction::AddCustomTag | DraftAction::Save => {
                for tag in custom_tag.split(',') {
                    draft.add_tag(tag);
                }
            }
        }

        (draft, action)
    }

    pub fn validate(&self) -> Result<ValidDraft, ValidationError> {
        let word = self.word.trim();
        if word.is_empty() {
            return Err(ValidationError::EmptyHeadword);
        }

        Ok(ValidDraft {
            word: word.to_string(),
            reading: non_blank(&self.reading),
            meaning: non_blank(&self.meaning),
            tags: self.tags.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn validate_sign_in(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        Ok(())
    }

    pub fn validate_sign_up(&self) -> Result<(), ValidationError> {
        self.validate_sign_in()?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }
        Ok(())
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_add_tag_suppresses_duplicates_and_blanks() {
        let mut draft = WordDraft::default();
        assert!(draft.add_tag("Noun"));
        assert!(!draft.add_tag(" Noun "));
        assert!(!draft.add_tag("   "));
        assert!(draft.add_tag("  Food "));
        assert_eq!(draft.tags, vec!["Noun", "Food"]);
    }

    #[test]
    fn test_available_common_tags_excludes_selected() {
        let mut draft = WordDraft::default();
        draft.add_tag("Verb");
        let available = draft.available_common_tags();
        assert_eq!(available.len(), COMMON_TAGS.len() - 1);
        assert!(!available.contains(&"Verb"));
    }

    #[test]
    fn test_validate_headword_only() {
        let valid = WordDraft::headword("  さくら ").validate().unwrap();
        assert_eq!(valid.word, "さくら");
        assert!(valid.reading.is_none());
        assert!(valid.meaning.is_none());
        assert!(valid.tags.is_empty());

        let new_word = valid.into_new_word("u1");
        assert_eq!(new_word.mastery_level, MasteryLevel::New);
        assert_eq!(new_word.user_id, "u1");
    }

    #[test]
    fn test_validate_rejects_blank_headword() {
        assert_eq!(
            WordDraft::headword("   ").validate(),
            Err(ValidationError::EmptyHeadword)
        );
    }

    #[test]
    fn test_from_form_collects_tags_in_order() {
        let (draft, action) = WordDraft::from_form(&pairs(&[
            ("word", "たべる"),
            ("reading", "taberu"),
            ("tags", "Verb"),
            ("tags", "JLPT N5"),
            ("tags", "Verb"),
            ("custom_tag", "Food, Daily Life ,"),
        ]));

        assert_eq!(action, DraftAction::Save);
        assert_eq!(draft.word, "たべる");
        assert_eq!(draft.tags, vec!["Verb", "JLPT N5", "Food", "Daily Life"]);
    }

    #[test]
    fn test_from_form_tag_actions() {
        let (draft, action) =
            WordDraft::from_form(&pairs(&[("tags", "Noun"), ("add_tag", "Work")]));
        assert_eq!(action, DraftAction::AddTag("Work".to_string()));
        assert_eq!(draft.tags, vec!["Noun", "Work"]);

        let (draft, _) =
            WordDraft::from_form(&pairs(&[("tags", "Noun"), ("tags", "Work"), ("remove_tag", "Noun")]));
        assert_eq!(draft.tags, vec!["Work"]);
    }

    #[test]
    fn test_credentials_validation() {
        let creds = Credentials {
            email: "a@example.com".into(),
            password: "12345".into(),
        };
        assert!(creds.validate_sign_in().is_ok());
        assert_eq!(
            creds.validate_sign_up(),
            Err(ValidationError::PasswordTooShort { min: 6 })
        );

        let empty = Credentials::default();
        assert_eq!(empty.validate_sign_in(), Err(ValidationError::MissingCredentials));
    }
}
