pub mod form;
pub mod stats;
pub mod syllabary;
pub mod word;

pub use form::{Credentials, DraftAction, ValidDraft, ValidationError, WordDraft, COMMON_TAGS};
pub use stats::{DayBoundary, ProgressStats};
pub use syllabary::{group_words, SyllabaryIndex, HIRAGANA_GROUPS};
pub use word::{MasteryLevel, NewWord, Word, WordOrder, WordQuery};
