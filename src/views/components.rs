use std::fmt::Write;

use super::escape;
use crate::flash::Toast;
use crate::vocab::{ProgressStats, Word};

pub fn toast(toast: &Toast) -> String {
    let class = if toast.is_error() { "toast destructive" } else { "toast" };
    format!(
        "<div class=\"{class}\" role=\"status\"><strong>{}</strong><div>{}</div></div>",
        escape(&toast.title),
        escape(&toast.description)
    )
}

pub fn tag_badges(tags: &[String]) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let mut html = String::from("<div class=\"tags\">");
    for tag in tags {
        let _ = write!(html, "<span class=\"badge\">{}</span>", escape(tag));
    }
    html.push_str("</div>");
    html
}

/// Card body for a single word. `trailing` is appended inside the card, used
/// by the dictionary for its delete button.
pub fn word_card(word: &Word, trailing: &str) -> String {
    let level = word.mastery_level;
    let mut html = String::from("<div class=\"card word-card\">");
    let _ = write!(
        html,
        "<h3>{}<span class=\"badge {}\">{}</span></h3>",
        escape(&word.word),
        level.css_class(),
        level.label()
    );
    if let Some(reading) = word.reading.as_deref().filter(|r| !r.is_empty()) {
        let _ = write!(html, "<p class=\"muted reading\">{}</p>", escape(reading));
    }
    if let Some(meaning) = word.meaning.as_deref().filter(|m| !m.is_empty()) {
        let _ = write!(html, "<p class=\"meaning\">{}</p>", escape(meaning));
    }
    html.push_str(&tag_badges(&word.tags));
    html.push_str(trailing);
    html.push_str("</div>");
    html
}

pub fn progress_stats(stats: &ProgressStats) -> String {
    format!(
        "<div class=\"stats\">\
         <div class=\"card stat highlight\"><div class=\"value\">{today}</div><div class=\"label\">Today's Words</div></div>\
         <div class=\"card stat\"><div class=\"value\">{streak}</div><div class=\"label\">Streak (days)</div></div>\
         <div class=\"card stat\"><div class=\"value\">{total}</div><div class=\"label\">Total Words</div></div>\
         <div class=\"card stat\"><div class=\"value\">{rate}%</div><div class=\"label\">{mastered} / {total}</div></div>\
         </div>",
        today = stats.words_today,
        streak = stats.streak,
        total = stats.total_words,
        rate = stats.mastery_rate(),
        mastered = stats.mastered_words,
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::vocab::MasteryLevel;

    fn word() -> Word {
        Word {
            id: "w1".into(),
            user_id: "u1".into(),
            word: "<script>".into(),
            reading: Some(String::new()),
            meaning: Some("tag".into()),
            tags: vec!["Noun".into()],
            mastery_level: MasteryLevel::Learning,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_word_card_escapes_and_skips_blank_reading() {
        let html = word_card(&word(), "");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("class=\"muted reading\""));
        assert!(html.contains("mastery-learning\">Learning"));
        assert!(html.contains("<span class=\"badge\">Noun</span>"));
    }

    #[test]
    fn test_progress_stats_shows_rate() {
        let stats = ProgressStats {
            words_today: 1,
            streak: 1,
            total_words: 3,
            mastered_words: 2,
        };
        let html = progress_stats(&stats);
        assert!(html.contains("67%"));
        assert!(html.contains("2 / 3"));
    }
}
