// libs/appointment-cell/src/services/normalizer.rs
//
// Free-text appointment types, states and modalities coming from the
// dashboard or the backend are folded into the fixed enumerations here.
// Every mapping is an ordered rule table that always ends in a defined value.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{AppointmentState, CanonicalType, Modality};

static TYPE_SYNONYMS: LazyLock<HashMap<&'static str, CanonicalType>> = LazyLock::new(|| {
    use CanonicalType::*;
    HashMap::from([
        ("general", General),
        ("generales", General),
        ("cita general", General),
        ("citas generales", General),
        ("consulta general", General),
        ("oposicion", Opposition),
        ("oposición", Opposition),
        ("oposiciones", Opposition),
        ("opposition", Opposition),
        ("certificacion", Certification),
        ("certificación", Certification),
        ("certificaciones", Certification),
        ("certification", Certification),
        ("cesion de marca", TrademarkAssignment),
        ("cesión de marca", TrademarkAssignment),
        ("cesiones de marca", TrademarkAssignment),
        ("cesion", TrademarkAssignment),
        ("cesión", TrademarkAssignment),
        ("trademarkassignment", TrademarkAssignment),
        ("trademark assignment", TrademarkAssignment),
        ("renovacion", Renewal),
        ("renovación", Renewal),
        ("renovaciones", Renewal),
        ("renewal", Renewal),
        ("busqueda de antecedentes", BackgroundSearch),
        ("búsqueda de antecedentes", BackgroundSearch),
        ("busquedas de antecedentes", BackgroundSearch),
        ("búsquedas de antecedentes", BackgroundSearch),
        ("backgroundsearch", BackgroundSearch),
        ("background search", BackgroundSearch),
        ("sin especificar", Unspecified),
        ("unspecified", Unspecified),
    ])
});

// Root words with optional accents, tried in order when no synonym matched.
static TYPE_RULES: LazyLock<Vec<(Regex, CanonicalType)>> = LazyLock::new(|| {
    [
        (r"\bopos[ií]ci[oó]n(es)?\b", CanonicalType::Opposition),
        (r"\bcertificaci[oó]n(es)?\b|\bcertificad[oa]s?\b", CanonicalType::Certification),
        (r"\bces[ií][oó]n(es)?\b|\btraspaso\b", CanonicalType::TrademarkAssignment),
        (r"\brenovaci[oó]n(es)?\b|\brenovar\b", CanonicalType::Renewal),
        (r"\bb[uú]squedas?\b|\bantecedentes?\b", CanonicalType::BackgroundSearch),
        (r"\bgeneral(es)?\b", CanonicalType::General),
    ]
    .into_iter()
    .filter_map(|(pattern, canonical)| Regex::new(pattern).ok().map(|re| (re, canonical)))
    .collect()
});

const STATE_RULES: &[(&[&str], AppointmentState)] = &[
    (&["cancel", "anulad", "anular"], AppointmentState::Cancelled),
    (&["reprogram", "reagend", "reschedul"], AppointmentState::Rescheduled),
    (&["finaliz", "complet", "realizad"], AppointmentState::Completed),
];

const VIRTUAL_MARKERS: &[&str] = &["virtual", "en linea", "en línea", "online", "remota", "remoto"];

fn fold(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Canonical appointment type for free text. Empty or unrecognised input
/// maps to `Unspecified`.
pub fn normalize_type(raw: &str) -> CanonicalType {
    let folded = fold(raw);
    if folded.is_empty() {
        return CanonicalType::Unspecified;
    }

    if let Some(canonical) = TYPE_SYNONYMS.get(folded.as_str()) {
        return *canonical;
    }

    TYPE_RULES
        .iter()
        .find(|(pattern, _)| pattern.is_match(&folded))
        .map(|(_, canonical)| *canonical)
        .unwrap_or(CanonicalType::Unspecified)
}

/// Canonical state for a backend status string, by substring. Anything
/// unrecognised is treated as a live, scheduled appointment.
pub fn normalize_state(raw: &str) -> AppointmentState {
    let folded = fold(raw);

    STATE_RULES
        .iter()
        .find(|(markers, _)| markers.iter().any(|m| folded.contains(m)))
        .map(|(_, state)| *state)
        .unwrap_or(AppointmentState::Scheduled)
}

pub fn normalize_modality(raw: &str) -> Modality {
    let folded = fold(raw);
    if VIRTUAL_MARKERS.iter().any(|m| folded.contains(m)) {
        Modality::Virtual
    } else {
        Modality::InPerson
    }
}
