//! Free-text search over the officer and template directories.

use super::domain::{Officer, Template};

/// Case-insensitive substring match on name, organization, state code or badge.
pub fn officer_matches(officer: &Officer, term: &str) -> bool {
    let Some(needle) = normalized(term) else {
        return true;
    };

    [
        Some(officer.name.as_str()),
        Some(officer.organization.as_str()),
        Some(officer.state.code()),
        officer.badge_number.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Case-insensitive substring match on name, subject or body.
pub fn template_matches(template: &Template, term: &str) -> bool {
    let Some(needle) = normalized(term) else {
        return true;
    };

    [&template.name, &template.subject, &template.body]
        .into_iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

pub fn search_officers(officers: Vec<Officer>, term: &str) -> Vec<Officer> {
    officers
        .into_iter()
        .filter(|officer| officer_matches(officer, term))
        .collect()
}

pub fn search_templates(templates: Vec<Template>, term: &str) -> Vec<Template> {
    templates
        .into_iter()
        .filter(|template| template_matches(template, term))
        .collect()
}

fn normalized(term: &str) -> Option<String> {
    let trimmed = term.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}
