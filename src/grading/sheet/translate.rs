//! Header translation for exports produced by a German-localized platform.
//! Translation must be loud: a header no rule can map is a structural error,
//! because every downstream rule addresses columns by their English names.

use super::SheetError;

const FULL: &[(&str, &str)] = &[
    ("Vorname", "First name"),
    ("Nachname", "Surname"),
    ("ID-Nummer", "ID number"),
    ("E-Mail-Adresse", "Email address"),
    (
        "Zuletzt aus diesem Kurs geladen",
        "Last downloaded from this course",
    ),
];

const PREFIX: &[(&str, &str)] = &[
    ("Aufgabe", "Assignment"),
    ("Test", "Quiz"),
    ("Kurs gesamt", "Course total"),
];

const SUFFIX: &[(&str, &str)] = &[("Punkte", "Real"), ("Prozentsatz", "Percentage")];

/// Translates a full header row. Short-circuits when the export is already
/// English (any identity header matches an English name verbatim).
pub(super) fn translate_headers(headers: &[String]) -> Result<Vec<String>, SheetError> {
    let already_english = headers
        .iter()
        .any(|header| FULL.iter().any(|(_, english)| header == english));
    if already_english {
        return Ok(headers.to_vec());
    }
    headers.iter().map(|header| translate_header(header)).collect()
}

fn translate_header(header: &str) -> Result<String, SheetError> {
    // The platform inserts non-breaking spaces when exporting in German.
    let cleaned = header.replace('\u{a0}', " ");

    if let Some((_, english)) = FULL.iter().find(|(german, _)| *german == cleaned) {
        return Ok((*english).to_string());
    }

    let mut translated = cleaned.clone();
    for (german, english) in PREFIX {
        if translated.starts_with(german) {
            translated = translated.replacen(german, english, 1);
        }
    }
    for (german, english) in SUFFIX {
        let suffix = format!("({german})");
        if translated.ends_with(&suffix) {
            let stem = translated.len() - suffix.len();
            translated = format!("{}({english})", &translated[..stem]);
        }
    }

    if translated == cleaned {
        Err(SheetError::UntranslatableColumn(cleaned))
    } else {
        Ok(translated)
    }
}
