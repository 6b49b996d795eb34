//! Rule-based noun lemmatizer.
//!
//! Reduces plural nouns to their base form using WordNet-style suffix
//! detachment plus an exception table for irregular forms. There is no
//! dictionary lookup, so rules are guarded to avoid stripping the `s` of
//! singular words (`process`, `status`, `analysis`).
//!
//! Rules are applied until the token stops changing, which makes
//! [`lemmatize`] idempotent: `lemmatize(lemmatize(t)) == lemmatize(t)`.

use std::collections::HashMap;

/// Irregular forms, checked before any suffix rule. Values are fixed points.
pub(crate) const LEMMA_EXCEPTIONS: &[(&str, &str)] = &[
    ("alias", "alias"),
    ("aliases", "alias"),
    ("analyses", "analysis"),
    ("appendices", "appendix"),
    ("atlas", "atlas"),
    ("axes", "axis"),
    ("bias", "bias"),
    ("caches", "cache"),
    ("canvas", "canvas"),
    ("children", "child"),
    ("crises", "crisis"),
    ("criteria", "criterion"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("halves", "half"),
    ("indices", "index"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("matrices", "matrix"),
    ("men", "man"),
    ("mice", "mouse"),
    ("phenomena", "phenomenon"),
    ("selves", "self"),
    ("shelves", "shelf"),
    ("teeth", "tooth"),
    ("theses", "thesis"),
    ("vertices", "vertex"),
    ("women", "woman"),
];

/// Upper bound on rule applications for a single token.
const MAX_RULE_PASSES: usize = 8;

/// Lemmatize a lowercase alphabetic token.
pub(crate) fn lemmatize(token: &str, exceptions: &HashMap<&'static str, &'static str>) -> String {
    let mut current = token.to_string();
    for _ in 0..MAX_RULE_PASSES {
        match apply_rule(&current, exceptions) {
            Some(next) if next != current => current = next,
            _ => break,
        }
    }
    current
}

fn apply_rule(token: &str, exceptions: &HashMap<&'static str, &'static str>) -> Option<String> {
    if let Some(base) = exceptions.get(token) {
        return Some((*base).to_string());
    }

    let len = token.chars().count();

    if len > 4 {
        if let Some(stem) = token.strip_suffix("ies") {
            return Some(format!("{stem}y"));
        }
    }
    if let Some(stem) = token.strip_suffix("sses") {
        return Some(format!("{stem}ss"));
    }
    if let Some(stem) = token.strip_suffix("shes") {
        return Some(format!("{stem}sh"));
    }
    if let Some(stem) = token.strip_suffix("ches") {
        if stem.ends_with(['t', 'n', 'r', 'a']) {
            return Some(format!("{stem}ch"));
        }
    }
    if len > 4 {
        if let Some(stem) = token.strip_suffix("xes") {
            return Some(format!("{stem}x"));
        }
    }
    if len > 3
        && token.ends_with('s')
        && !token.ends_with("ss")
        && !token.ends_with("us")
        && !token.ends_with("is")
    {
        return token.strip_suffix('s').map(str::to_string);
    }

    None
}
