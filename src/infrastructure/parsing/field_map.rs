//! Label-to-attribute field mapping
//!
//! The details table on a release page is a sequence of label/value
//! rows whose order and count the site changes freely. Extraction is
//! therefore split in two passes: scan whatever rows exist, then map
//! known labels onto record attributes through this static table. Row
//! reordering costs nothing; only a label rename requires touching the
//! table.

/// Record attribute a details-table label maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappedField {
    Language,
    Director,
    Production,
    Genre,
    Translator,
    ImdbRating,
    Certification,
}

/// One mapping: all label spellings observed on the site -> attribute.
pub struct FieldMapping {
    pub labels: &'static [&'static str],
    pub field: MappedField,
}

/// Labels as the archive renders them (Malayalam, with the English
/// variants some older pages use), already normalized.
pub static FIELD_MAPPINGS: &[FieldMapping] = &[
    FieldMapping {
        labels: &["ഭാഷ", "language"],
        field: MappedField::Language,
    },
    FieldMapping {
        labels: &["സംവിധാനം", "director"],
        field: MappedField::Director,
    },
    FieldMapping {
        labels: &["നിർമ്മാണം", "production"],
        field: MappedField::Production,
    },
    FieldMapping {
        labels: &["ജോണർ", "genre"],
        field: MappedField::Genre,
    },
    FieldMapping {
        labels: &["പരിഭാഷ", "translator", "translated by"],
        field: MappedField::Translator,
    },
    FieldMapping {
        labels: &["ഐഎംഡിബി റേറ്റിംഗ്", "imdb rating", "rating"],
        field: MappedField::ImdbRating,
    },
    FieldMapping {
        labels: &["സർട്ടിഫിക്കേഷൻ", "certification", "certificate"],
        field: MappedField::Certification,
    },
];

/// Normalize a raw label cell: trim, drop the trailing colon, lowercase
/// the ASCII range (Malayalam text is unaffected).
pub fn normalize_label(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(':')
        .trim()
        .to_ascii_lowercase()
}

/// Look a normalized label up in the mapping table.
pub fn lookup(label: &str) -> Option<MappedField> {
    FIELD_MAPPINGS
        .iter()
        .find(|m| m.labels.contains(&label))
        .map(|m| m.field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malayalam_labels_resolve() {
        assert_eq!(lookup(&normalize_label("ഭാഷ:")), Some(MappedField::Language));
        assert_eq!(
            lookup(&normalize_label("സംവിധാനം:")),
            Some(MappedField::Director)
        );
        assert_eq!(
            lookup(&normalize_label(" പരിഭാഷ : ")),
            Some(MappedField::Translator)
        );
    }

    #[test]
    fn english_variants_resolve_case_insensitively() {
        assert_eq!(
            lookup(&normalize_label("IMDb Rating:")),
            Some(MappedField::ImdbRating)
        );
        assert_eq!(lookup(&normalize_label("Genre")), Some(MappedField::Genre));
    }

    #[test]
    fn unknown_labels_are_ignored() {
        assert_eq!(lookup(&normalize_label("റൺടൈം:")), None);
        assert_eq!(lookup(&normalize_label("Runtime:")), None);
    }
}
