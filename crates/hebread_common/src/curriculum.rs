//! Curriculum data: the Hebrew alphabet and basic nikud (vowel points).
//!
//! Letters are keyed by a canonical id (`alef`, `bet`, ...) so progress stays
//! stable whether an exercise reports the id, the glyph or a final form.

use serde::Serialize;

/// Bucket key used by group exercises that don't target one letter
pub const WILDCARD_LETTER: &str = "*";

/// A single alphabet entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Letter {
    pub id: &'static str,
    pub glyph: &'static str,
    pub name: &'static str,
    /// Name of the letter written in Hebrew with nikud
    pub heb: &'static str,
    pub sound: &'static str,
    pub example: &'static str,
    pub final_form: Option<&'static str>,
}

const fn letter(
    id: &'static str,
    glyph: &'static str,
    name: &'static str,
    heb: &'static str,
    sound: &'static str,
    example: &'static str,
    final_form: Option<&'static str>,
) -> Letter {
    Letter {
        id,
        glyph,
        name,
        heb,
        sound,
        example,
        final_form,
    }
}

/// The 22 base letters
pub const LETTERS: &[Letter] = &[
    letter(
        "alef",
        "א",
        "Alef",
        "אָלֶף",
        "silent / vowel carrier",
        "אוֹר",
        None,
    ),
    letter("bet", "ב", "Bet", "בֵּית", "b / v", "בַּיִת", None),
    letter("gimel", "ג", "Gimel", "גִּימֶל", "g", "גָּמָל", None),
    letter("dalet", "ד", "Dalet", "דָּלֶת", "d", "דֶּלֶת", None),
    letter("he", "ה", "He", "הֵא", "h", "הַר", None),
    letter("vav", "ו", "Vav", "וָו", "v / o / u", "וָו", None),
    letter("zayin", "ז", "Zayin", "זַיִן", "z", "זְמַן", None),
    letter("het", "ח", "Het", "חֵית", "ch (throaty)", "חָלָב", None),
    letter("tet", "ט", "Tet", "טֵית", "t", "טוֹב", None),
    letter("yod", "י", "Yod", "יוֹד", "y / i", "יָד", None),
    letter("kaf", "כ", "Kaf", "כַּף", "k / kh", "כֶּסֶף", Some("ך")),
    letter("lamed", "ל", "Lamed", "לָמֶד", "l", "לֶחֶם", None),
    letter("mem", "מ", "Mem", "מֵם", "m", "מַיִם", Some("ם")),
    letter("nun", "נ", "Nun", "נוּן", "n", "נֵר", Some("ן")),
    letter("samekh", "ס", "Samekh", "סָמֶךְ", "s", "סֵפֶר", None),
    letter("ayin", "ע", "Ayin", "עַיִן", "glottal stop", "עֵץ", None),
    letter("pe", "פ", "Pe", "פֵּא", "p / f", "פֶּה", Some("ף")),
    letter("tsadi", "צ", "Tsadi", "צָדִי", "ts", "צָפוֹן", Some("ץ")),
    letter("qof", "ק", "Qof", "קוֹף", "q / k", "קֶרַח", None),
    letter("resh", "ר", "Resh", "רֵישׁ", "r", "רֹאשׁ", None),
    letter("shin", "ש", "Shin/Sin", "שִׁין", "sh / s", "שֶׁמֶשׁ", None),
    letter("tav", "ת", "Tav", "תָּו", "t", "תּוֹרָה", None),
];

/// Read-only view over the alphabet
#[derive(Debug, Clone, Copy)]
pub struct Curriculum {
    letters: &'static [Letter],
}

impl Default for Curriculum {
    fn default() -> Self {
        Self::hebrew()
    }
}

impl Curriculum {
    pub fn hebrew() -> Self {
        Self { letters: LETTERS }
    }

    pub fn letters(&self) -> &'static [Letter] {
        self.letters
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    /// Find a letter by id, base glyph or final form
    pub fn find(&self, token: &str) -> Option<&'static Letter> {
        let token = token.trim();
        self.letters
            .iter()
            .find(|l| l.id == token || l.glyph == token || l.final_form == Some(token))
    }

    /// Map any known spelling of a letter to its canonical id.
    /// Unknown tokens (including the wildcard) pass through unchanged.
    pub fn canonical_id(&self, token: &str) -> String {
        match self.find(token) {
            Some(l) => l.id.to_string(),
            None => token.trim().to_string(),
        }
    }
}

// ============================================================================
// Nikud
// ============================================================================

/// Mater lectionis spellings that don't follow base + mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Special {
    VavDotted,
    VavHolam,
    YodHiriq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Nikud {
    pub id: &'static str,
    pub name: &'static str,
    pub mark: &'static str,
    pub translit: &'static str,
    pub special: Option<Special>,
}

const fn nikud(
    id: &'static str,
    name: &'static str,
    mark: &'static str,
    translit: &'static str,
) -> Nikud {
    Nikud {
        id,
        name,
        mark,
        translit,
        special: None,
    }
}

const fn nikud_special(
    id: &'static str,
    name: &'static str,
    mark: &'static str,
    translit: &'static str,
    special: Special,
) -> Nikud {
    Nikud {
        id,
        name,
        mark,
        translit,
        special: Some(special),
    }
}

pub const NIKUD: &[Nikud] = &[
    nikud("sheva", "Sheva", "\u{05B0}", "ə"),
    nikud("hiriq", "Hiriq", "\u{05B4}", "i"),
    nikud("tsere", "Tsere", "\u{05B5}", "e"),
    nikud("segol", "Segol", "\u{05B6}", "e"),
    nikud("patah", "Patah", "\u{05B7}", "a"),
    nikud("qamats", "Qamats", "\u{05B8}", "a"),
    nikud("holam", "Holam", "\u{05B9}", "o"),
    nikud("qubuts", "Qubuts", "\u{05BB}", "u"),
    nikud_special("shuruk", "Shuruk", "\u{05BC}", "u", Special::VavDotted),
    nikud_special("holam_vav", "Holam vav", "\u{05B9}", "o", Special::VavHolam),
    nikud_special("hiriq_yod", "Hiriq yod", "\u{05B4}", "i", Special::YodHiriq),
];

pub fn find_nikud(id: &str) -> Option<&'static Nikud> {
    NIKUD.iter().find(|n| n.id == id)
}

/// Compose a base consonant with a vowel point.
/// Unknown nikud ids return the base unchanged.
pub fn compose_syllable(base: &str, nikud_id: &str) -> String {
    let Some(n) = find_nikud(nikud_id) else {
        return base.to_string();
    };
    match n.special {
        Some(Special::VavDotted) => "ו\u{05BC}".to_string(),
        Some(Special::VavHolam) => "ו\u{05B9}".to_string(),
        Some(Special::YodHiriq) => "\u{05B4}י".to_string(),
        None => format!("{}{}", base, n.mark),
    }
}

/// Syllable drill rows: base glyph and the vowels practised with it
pub const SYLLABLE_DRILLS: &[(&str, &[&str])] = &[
    ("ב", &["patah", "qamats", "tsere", "hiriq", "holam", "qubuts"]),
    ("מ", &["patah", "segol", "hiriq", "holam", "qubuts"]),
    ("ל", &["patah", "segol", "tsere", "hiriq"]),
    ("ש", &["patah", "segol", "tsere", "hiriq", "holam"]),
    ("ק", &["patah", "qamats", "holam"]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drill {
    pub syllable: String,
    pub base: &'static str,
    pub vowel: &'static str,
}

/// Flatten the drill table into individual syllables
pub fn expand_drill_set() -> Vec<Drill> {
    SYLLABLE_DRILLS
        .iter()
        .flat_map(|&(base, vowels)| {
            vowels.iter().map(move |&v| Drill {
                syllable: compose_syllable(base, v),
                base,
                vowel: v,
            })
        })
        .collect()
}
