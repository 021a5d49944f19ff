//! Buckets words by the hiragana line of their first character.

use serde::Serialize;

use super::word::Word;

pub struct SyllabaryGroup {
    pub label: &'static str,
    pub chars: &'static [char],
}

pub const HIRAGANA_GROUPS: &[SyllabaryGroup] = &[
    SyllabaryGroup { label: "Vowels", chars: &['あ', 'い', 'う', 'え', 'お'] },
    SyllabaryGroup { label: "K-line", chars: &['か', 'き', 'く', 'け', 'こ'] },
    SyllabaryGroup { label: "S-line", chars: &['さ', 'し', 'す', 'せ', 'そ'] },
    SyllabaryGroup { label: "T-line", chars: &['た', 'ち', 'つ', 'て', 'と'] },
    SyllabaryGroup { label: "N-line", chars: &['な', 'に', 'ぬ', 'ね', 'の'] },
    SyllabaryGroup { label: "H-line", chars: &['は', 'ひ', 'ふ', 'へ', 'ほ'] },
    SyllabaryGroup { label: "M-line", chars: &['ま', 'み', 'む', 'め', 'も'] },
    SyllabaryGroup { label: "Y-line", chars: &['や', 'ゆ', 'よ'] },
    SyllabaryGroup { label: "R-line", chars: &['ら', 'り', 'る', 'れ', 'ろ'] },
    SyllabaryGroup { label: "W-line", chars: &['わ', 'を', 'ん'] },
    SyllabaryGroup { label: "G-line", chars: &['が', 'ぎ', 'ぐ', 'げ', 'ご'] },
    SyllabaryGroup { label: "Z-line", chars: &['ざ', 'じ', 'ず', 'ぜ', 'ぞ'] },
    SyllabaryGroup { label: "D-line", chars: &['だ', 'ぢ', 'づ', 'で', 'ど'] },
    SyllabaryGroup { label: "B-line", chars: &['ば', 'び', 'ぶ', 'べ', 'ぼ'] },
    SyllabaryGroup { label: "P-line", chars: &['ぱ', 'ぴ', 'ぷ', 'ぺ', 'ぽ'] },
];

#[derive(Debug, Clone, Serialize)]
pub struct GroupBucket {
    pub label: &'static str,
    pub words: Vec<Word>,
}

/// Result of [`group_words`]. `groups` always holds every configured group in
/// configuration order; words outside all groups land in `unplaced`.
#[derive(Debug, Clone, Serialize)]
pub struct SyllabaryIndex {
    pub groups: Vec<GroupBucket>,
    pub unplaced: Vec<Word>,
}

impl SyllabaryIndex {
    pub fn get(&self, label: &str) -> Option<&[Word]> {
        self.groups
            .iter()
            .find(|bucket| bucket.label == label)
            .map(|bucket| bucket.words.as_slice())
    }

    pub fn placed_count(&self) -> usize {
        self.groups.iter().map(|bucket| bucket.words.len()).sum()
    }
}

pub fn group_for_char(c: char) -> Option<&'static str> {
    HIRAGANA_GROUPS
        .iter()
        .find(|group| group.chars.contains(&c))
        .map(|group| group.label)
}

pub fn group_words<I>(words: I) -> SyllabaryIndex
where
    I: IntoIterator<Item = Word>,
{
    let mut groups: Vec<GroupBucket> = HIRAGANA_GROUPS
        .iter()
        .map(|group| GroupBucket {
            label: group.label,
            words: Vec::new(),
        })
        .collect();
    let mut unplaced = Vec::new();

    for word in words {
        let position = word
            .first_char()
            .and_then(|c| HIRAGANA_GROUPS.iter().position(|group| group.chars.contains(&c)));

        match position {
            Some(idx) => groups[idx].words.push(word),
            None => unplaced.push(word),
        }
    }

    SyllabaryIndex { groups, unplaced }
}
