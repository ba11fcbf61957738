//! Corrosion-rate severity classes produced by the classifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classifier output vocabulary.
///
/// The classifier emits an integer class index; [`SeverityClass::from_class_index`]
/// maps it to a label. Indices outside the trained vocabulary map to
/// [`SeverityClass::Unknown`] rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeverityClass {
    Resistant,
    Good,
    Questionable,
    Poor,
    Unknown,
}

/// Class index → label, keyed by the stringified index the model was trained with.
const CLASS_TABLE: &[(&str, SeverityClass)] = &[
    ("0", SeverityClass::Resistant),
    ("1", SeverityClass::Good),
    ("2", SeverityClass::Questionable),
    ("3", SeverityClass::Poor),
];

impl SeverityClass {
    /// All classes with a defined rate band, in ascending severity.
    pub const RATED: [SeverityClass; 4] = [
        SeverityClass::Resistant,
        SeverityClass::Good,
        SeverityClass::Questionable,
        SeverityClass::Poor,
    ];

    pub fn from_class_index(index: i64) -> Self {
        let key = index.to_string();
        CLASS_TABLE
            .iter()
            .find(|(k, _)| *k == key)
            .map(|&(_, class)| class)
            .unwrap_or(SeverityClass::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resistant => "Resistant",
            Self::Good => "Good",
            Self::Questionable => "Questionable",
            Self::Poor => "Poor",
            Self::Unknown => "Unknown",
        }
    }

    /// Letter grade on the A–D corrosion scale.
    pub fn grade(&self) -> Option<char> {
        match self {
            Self::Resistant => Some('A'),
            Self::Good => Some('B'),
            Self::Questionable => Some('C'),
            Self::Poor => Some('D'),
            Self::Unknown => None,
        }
    }

    /// Corrosion-rate band in mm/year.
    pub fn rate_band(&self) -> Option<&'static str> {
        match self {
            Self::Resistant => Some("< 0.05 mm/year"),
            Self::Good => Some("< 0.51 mm/year"),
            Self::Questionable => Some("0.51 – 1.27 mm/year"),
            Self::Poor => Some("> 1.27 mm/year"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for SeverityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
