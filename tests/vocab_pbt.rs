//! Property-based tests for dictionary grouping and progress statistics.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use bunko::vocab::stats::{day_start, mastery_rate};
use bunko::vocab::syllabary::group_for_char;
use bunko::vocab::{group_words, MasteryLevel, ProgressStats, Word, WordDraft, HIRAGANA_GROUPS};

// ============================================================================
// Generators
// ============================================================================

fn arb_mastery() -> impl Strategy<Value = MasteryLevel> {
    prop_oneof![
        Just(MasteryLevel::New),
        Just(MasteryLevel::Learning),
        Just(MasteryLevel::Mastered),
    ]
}

fn arb_first_char() -> impl Strategy<Value = char> {
    prop_oneof![
        // Hiragana block, including small kana and marks outside every group.
        (0x3041u32..=0x3096u32).prop_map(|c| char::from_u32(c).unwrap_or('あ')),
        // Katakana and kanji stay unplaced.
        (0x30A1u32..=0x30F6u32).prop_map(|c| char::from_u32(c).unwrap_or('ア')),
        prop::sample::select(vec!['猫', '東', 'A', 'z', '1']),
    ]
}

fn arb_word() -> impl Strategy<Value = Word> {
    (arb_first_char(), "[a-z]{0,4}", arb_mastery(), 0i64..10_000).prop_map(
        |(first, rest, mastery_level, minutes)| Word {
            id: format!("{first}{rest}{minutes}"),
            user_id: "user".to_string(),
            word: format!("{first}{rest}"),
            reading: None,
            meaning: None,
            tags: Vec::new(),
            mastery_level,
            created_at: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
        },
    )
}

// ============================================================================
// Grouping
// ============================================================================

proptest! {
    #[test]
    fn grouping_keeps_every_word_exactly_once(words in prop::collection::vec(arb_word(), 0..40)) {
        let total = words.len();
        let index = group_words(words);

        prop_assert_eq!(index.groups.len(), HIRAGANA_GROUPS.len());
        prop_assert_eq!(index.placed_count() + index.unplaced.len(), total);
    }

    #[test]
    fn grouped_words_start_with_a_group_char(words in prop::collection::vec(arb_word(), 0..40)) {
        let index = group_words(words);

        for (bucket, group) in index.groups.iter().zip(HIRAGANA_GROUPS) {
            prop_assert_eq!(bucket.label, group.label);
            for word in &bucket.words {
                let first = word.first_char().unwrap();
                prop_assert!(group.chars.contains(&first));
            }
        }
        for word in &index.unplaced {
            prop_assert!(word.first_char().and_then(group_for_char).is_none());
        }
    }

    #[test]
    fn grouping_preserves_input_order(words in prop::collection::vec(arb_word(), 0..40)) {
        let words: Vec<Word> = words
            .into_iter()
            .enumerate()
            .map(|(i, mut word)| {
                word.id = i.to_string();
                word
            })
            .collect();
        let input_ids: Vec<String> = words.iter().map(|w| w.id.clone()).collect();
        let index = group_words(words);

        for bucket in &index.groups {
            let positions: Vec<usize> = bucket
                .words
                .iter()
                .map(|w| input_ids.iter().position(|id| *id == w.id).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|pair| pair[0] <= pair[1]));
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

proptest! {
    #[test]
    fn mastery_rate_is_a_percentage(total in 0usize..500, mastered_seed in 0usize..500) {
        let mastered = if total == 0 { 0 } else { mastered_seed % (total + 1) };
        let rate = mastery_rate(mastered, total);

        prop_assert!(rate <= 100);
        if total == 0 || mastered == 0 {
            prop_assert_eq!(rate, 0);
        }
        if mastered == total && total > 0 {
            prop_assert_eq!(rate, 100);
        }
    }

    #[test]
    fn stats_count_mastered_words(words in prop::collection::vec(arb_word(), 0..40)) {
        let stats = ProgressStats::compute(&words, &[]);
        let mastered = words.iter().filter(|w| w.mastery_level == MasteryLevel::Mastered).count();

        prop_assert_eq!(stats.total_words, words.len());
        prop_assert_eq!(stats.mastered_words, mastered);
        prop_assert_eq!(stats.words_today, 0);
        prop_assert_eq!(stats.streak, 1);
    }

    #[test]
    fn day_start_is_midnight_not_after_now(offset_hours in -12i32..=14, minutes in 0i64..(60 * 24 * 365)) {
        let tz = chrono::FixedOffset::east_opt(offset_hours * 3600).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes);
        let local_now = now.with_timezone(&tz);

        let start = day_start(&local_now);

        prop_assert!(start <= now);
        prop_assert!(now - start < Duration::days(1));
        prop_assert_eq!(start.with_timezone(&tz).time(), chrono::NaiveTime::MIN);
    }
}

// ============================================================================
// Draft tags
// ============================================================================

proptest! {
    #[test]
    fn draft_tags_stay_unique_and_trimmed(tags in prop::collection::vec("[ a-cN]{0,5}", 0..20)) {
        let mut draft = WordDraft::headword("猫");
        for tag in &tags {
            draft.add_tag(tag);
        }

        for (i, tag) in draft.tags.iter().enumerate() {
            prop_assert!(!tag.is_empty());
            prop_assert_eq!(tag.trim(), tag.as_str());
            prop_assert!(!draft.tags[i + 1..].contains(tag));
        }
    }
}
