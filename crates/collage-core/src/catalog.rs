//! Font and emoji catalogs offered by the toolbar.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Font family options for text items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontFamily {
    /// Platform UI font (default).
    #[default]
    SystemUi,
    NanumGothic,
    NanumMyeongjo,
    NanumPen,
    NotoSansKr,
    NotoSerifKr,
    Pretendard,
    Gaegu,
    BlackHanSans,
    DoHyeon,
    Jua,
    PoorStory,
}

impl FontFamily {
    /// Family name as looked up by font systems.
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::SystemUi => "system-ui",
            FontFamily::NanumGothic => "Nanum Gothic",
            FontFamily::NanumMyeongjo => "Nanum Myeongjo",
            FontFamily::NanumPen => "Nanum Pen Script",
            FontFamily::NotoSansKr => "Noto Sans KR",
            FontFamily::NotoSerifKr => "Noto Serif KR",
            FontFamily::Pretendard => "Pretendard",
            FontFamily::Gaegu => "Gaegu",
            FontFamily::BlackHanSans => "Black Han Sans",
            FontFamily::DoHyeon => "Do Hyeon",
            FontFamily::Jua => "Jua",
            FontFamily::PoorStory => "Poor Story",
        }
    }

    /// Get display name for UI.
    pub fn display_name(&self) -> &'static str {
        match self {
            FontFamily::SystemUi => "Default",
            other => other.name(),
        }
    }

    /// CSS `font-family` value for browser renderers.
    pub fn css_value(&self) -> String {
        match self {
            FontFamily::SystemUi => "system-ui".to_string(),
            other => format!("\"{}\", system-ui", other.name()),
        }
    }

    /// Whether this is the generic platform font rather than a named family.
    pub fn is_generic(&self) -> bool {
        matches!(self, FontFamily::SystemUi)
    }

    /// Look a family up by its name or display name, ignoring case and spacing.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = normalize(name);
        Self::all().iter().copied().find(|family| {
            normalize(family.name()) == wanted || normalize(family.display_name()) == wanted
        })
    }

    /// Get all available font families.
    pub fn all() -> &'static [FontFamily] {
        &[
            FontFamily::SystemUi,
            FontFamily::NanumGothic,
            FontFamily::NanumMyeongjo,
            FontFamily::NanumPen,
            FontFamily::NotoSansKr,
            FontFamily::NotoSerifKr,
            FontFamily::Pretendard,
            FontFamily::Gaegu,
            FontFamily::BlackHanSans,
            FontFamily::DoHyeon,
            FontFamily::Jua,
            FontFamily::PoorStory,
        ]
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// A named group of emoji in the picker.
#[derive(Debug, Clone, Copy)]
pub struct EmojiCategory {
    pub name: &'static str,
    glyphs: &'static [&'static str],
}

impl EmojiCategory {
    /// Glyphs in picker order with duplicates removed.
    pub fn glyphs(&self) -> Vec<&'static str> {
        let mut seen = HashSet::new();
        self.glyphs
            .iter()
            .copied()
            .filter(|glyph| seen.insert(*glyph))
            .collect()
    }
}

/// Emoji offered by the picker, by category.
pub const EMOJI_CATEGORIES: &[EmojiCategory] = &[
    EmojiCategory {
        name: "Faces",
        glyphs: &[
            "😀", "😃", "😄", "😁", "😆", "😅", "😂", "🤣", "😊", "😇", "🙂", "🙃", "😉", "😌",
            "😍", "🥰", "😘", "😋", "😛", "😜", "🤪", "🤨", "🧐", "🤓", "😎", "🤩", "🥳", "😏",
            "😒", "😞", "😔", "😟", "😕", "🥺", "😢", "😭", "😤", "😠", "😡", "🤯", "😳", "🥵",
            "🥶", "😱", "🤗", "🤔", "🤭", "🤫", "😶", "😐", "😬", "🙄", "😴", "🤤", "😵", "🤐",
            "🥴", "🤢", "🤧", "😷", "🤒", "🤕",
        ],
    },
    EmojiCategory {
        name: "Animals",
        glyphs: &[
            "🐶", "🐱", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼", "🐨", "🐯", "🦁", "🐮", "🐷", "🐸",
            "🐵", "🙈", "🙉", "🙊", "🐔", "🐧", "🐦", "🐤", "🦆", "🦅", "🦉", "🦇", "🐺", "🐴",
            "🦄", "🐝", "🐛", "🦋", "🐌", "🐞", "🐢", "🐍", "🦖", "🐙", "🦑", "🦀", "🐠", "🐟",
            "🐬", "🐳", "🦈", "🐊", "🐘", "🦒", "🐈", "🐇", "🦔",
        ],
    },
    EmojiCategory {
        name: "Food",
        glyphs: &[
            "🍎", "🍐", "🍊", "🍋", "🍌", "🍉", "🍇", "🍓", "🫐", "🍒", "🍑", "🥭", "🍍", "🥥",
            "🥝", "🍅", "🥑", "🥦", "🌽", "🥕", "🥐", "🍞", "🧀", "🥚", "🍳", "🥞", "🧇", "🥓",
            "🍗", "🌭", "🍔", "🍟", "🍕", "🌮", "🥗", "🍝", "🍜", "🍣", "🍱", "🥟", "🍙", "🍚",
            "🍦", "🧁", "🍰", "🎂", "🍭", "🍫", "🍿", "🍪", "☕", "🍵", "🧋",
        ],
    },
    EmojiCategory {
        name: "Activities",
        glyphs: &[
            "⚽", "🏀", "🏈", "⚾", "🎾", "🏐", "🏉", "🎱", "🏓", "🏸", "🥊", "⛳", "🎣", "🛹",
            "🏂", "🏄", "🏊", "🚴", "🎪", "🎭", "🎨", "🎬", "🎤", "🎧", "🎼", "🎹", "🥁", "🎷",
            "🎺", "🎸", "🎻", "🎲", "🎯", "🎳", "🎮", "🧩", "📷", "💡", "🎈", "🎉", "🎊", "🎁",
        ],
    },
    EmojiCategory {
        name: "Nature",
        glyphs: &[
            "🌱", "🌲", "🌳", "🌴", "🌵", "🌾", "🌿", "🍀", "🍁", "🍂", "🍃", "🌺", "🌸", "🌼",
            "🌻", "🌞", "🌝", "🌛", "🌕", "🌙", "🌎", "💫", "⭐", "🌟", "✨", "⚡", "🔥", "🌈",
            "☀️", "⛅", "☁️", "❄️", "⛄", "💧", "🌊", "⭐",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_lookup() {
        assert_eq!(FontFamily::from_name("noto sans kr"), Some(FontFamily::NotoSansKr));
        assert_eq!(FontFamily::from_name("Default"), Some(FontFamily::SystemUi));
        assert_eq!(FontFamily::from_name("system-ui"), Some(FontFamily::SystemUi));
        assert_eq!(FontFamily::from_name("Comic Sans"), None);
    }

    #[test]
    fn test_css_value() {
        assert_eq!(FontFamily::SystemUi.css_value(), "system-ui");
        assert_eq!(FontFamily::Jua.css_value(), "\"Jua\", system-ui");
    }

    #[test]
    fn test_emoji_glyphs_deduplicated() {
        let nature = EMOJI_CATEGORIES
            .iter()
            .find(|c| c.name == "Nature")
            .unwrap();
        let glyphs = nature.glyphs();
        let stars = glyphs.iter().filter(|g| **g == "⭐").count();
        assert_eq!(stars, 1);
        assert!(glyphs.len() < nature.glyphs.len());
    }
}
