use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// How well a word is known. Stored as a small integer in the `words` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MasteryLevel {
    #[default]
    New,
    Learning,
    Mastered,
}

impl MasteryLevel {
    pub fn label(self) -> &'static str {
        match self {
            MasteryLevel::New => "New",
            MasteryLevel::Learning => "Learning",
            MasteryLevel::Mastered => "Mastered",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            MasteryLevel::New => "mastery-new",
            MasteryLevel::Learning => "mastery-learning",
            MasteryLevel::Mastered => "mastery-mastered",
        }
    }
}

impl TryFrom<u8> for MasteryLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MasteryLevel::New),
            1 => Ok(MasteryLevel::Learning),
            2 => Ok(MasteryLevel::Mastered),
            other => Err(format!("invalid mastery level: {other}")),
        }
    }
}

impl From<MasteryLevel> for u8 {
    fn from(level: MasteryLevel) -> Self {
        match level {
            MasteryLevel::New => 0,
            MasteryLevel::Learning => 1,
            MasteryLevel::Mastered => 2,
        }
    }
}

/// A row of the hosted `words` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: String,
    pub user_id: String,
    pub word: String,
    #[serde(default)]
    pub reading: Option<String>,
    #[serde(default)]
    pub meaning: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mastery_level: MasteryLevel,
    pub created_at: DateTime<Utc>,
}

impl Word {
    pub fn first_char(&self) -> Option<char> {
        self.word.chars().next()
    }

    pub fn is_mastered(&self) -> bool {
        self.mastery_level == MasteryLevel::Mastered
    }
}

/// Insert payload. `user_id` comes from the caller's scope, never from user input.
#[derive(Debug, Clone, Serialize)]
pub struct NewWord {
    pub user_id: String,
    pub word: String,
    pub reading: Option<String>,
    pub meaning: Option<String>,
    pub tags: Vec<String>,
    pub mastery_level: MasteryLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordOrder {
    NewestFirst,
    Headword,
}

impl WordOrder {
    /// PostgREST `order` parameter value.
    pub fn as_query_value(self) -> &'static str {
        match self {
            WordOrder::NewestFirst => "created_at.desc",
            WordOrder::Headword => "word.asc",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordQuery {
    pub created_since: Option<DateTime<Utc>>,
    pub order: Option<WordOrder>,
}

impl WordQuery {
    pub fn newest_first() -> Self {
        Self {
            created_since: None,
            order: Some(WordOrder::NewestFirst),
        }
    }

    pub fn by_headword() -> Self {
        Self {
            created_since: None,
            order: Some(WordOrder::Headword),
        }
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.created_since = Some(since);
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
