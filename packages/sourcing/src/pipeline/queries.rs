//! Search-query variant generation.
//!
//! Produces the ordered fallback ladder the orchestrator walks when a
//! variant comes up short: precise → broad → alternative → loose. The
//! ordering is a precision → recall trade-off and determines how search
//! quality degrades under sparse results, so it is fixed.

use crate::types::requirements::{JobRequirements, QueryVariant, VariantKind};

/// Titles kept by the broad variant.
const BROAD_TITLE_LIMIT: usize = 3;

/// Build the ordered query-variant ladder for a set of requirements.
///
/// - **precise**: the full derived filter set
/// - **broad**: industry dropped, titles truncated to the top three
/// - **alternative**: keyed on nice-to-have skills instead of required
///   skills; only emitted when any exist
/// - **loose**: single most senior title plus location, no skill or
///   industry constraint
pub fn generate_query_variants(requirements: &JobRequirements) -> Vec<QueryVariant> {
    let mut variants = Vec::with_capacity(4);

    variants.push(QueryVariant {
        kind: VariantKind::Precise,
        keywords: requirements.required_skills.clone(),
        titles: requirements.titles.clone(),
        location: requirements.location.clone(),
        industry: requirements.industry.clone(),
    });

    variants.push(QueryVariant {
        kind: VariantKind::Broad,
        keywords: requirements.required_skills.clone(),
        titles: requirements
            .titles
            .iter()
            .take(BROAD_TITLE_LIMIT)
            .cloned()
            .collect(),
        location: requirements.location.clone(),
        industry: None,
    });

    if !requirements.nice_to_have_skills.is_empty() {
        variants.push(QueryVariant {
            kind: VariantKind::Alternative,
            keywords: requirements.nice_to_have_skills.clone(),
            titles: requirements
                .titles
                .iter()
                .take(BROAD_TITLE_LIMIT)
                .cloned()
                .collect(),
            location: requirements.location.clone(),
            industry: None,
        });
    }

    variants.push(QueryVariant {
        kind: VariantKind::Loose,
        keywords: Vec::new(),
        titles: requirements.top_title().map(String::from).into_iter().collect(),
        location: requirements.location.clone(),
        industry: None,
    });

    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirements() -> JobRequirements {
        JobRequirements {
            titles: vec![
                "Staff Engineer".into(),
                "Senior Engineer".into(),
                "Engineer II".into(),
                "Engineer".into(),
            ],
            required_skills: vec!["Rust".into(), "Postgres".into()],
            nice_to_have_skills: vec!["Kafka".into()],
            location: Some("Berlin".into()),
            industry: Some("Fintech".into()),
            min_years: Some(5.0),
            seniority: None,
        }
    }

    #[test]
    fn cascade_order_is_precise_broad_alternative_loose() {
        let variants = generate_query_variants(&requirements());
        let kinds: Vec<_> = variants.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                VariantKind::Precise,
                VariantKind::Broad,
                VariantKind::Alternative,
                VariantKind::Loose,
            ]
        );
    }

    #[test]
    fn precise_carries_the_full_filter_set() {
        let variants = generate_query_variants(&requirements());
        let precise = &variants[0];
        assert_eq!(precise.keywords, vec!["Rust", "Postgres"]);
        assert_eq!(precise.titles.len(), 4);
        assert_eq!(precise.industry.as_deref(), Some("Fintech"));
        assert_eq!(precise.location.as_deref(), Some("Berlin"));
    }

    #[test]
    fn broad_drops_industry_and_truncates_titles() {
        let variants = generate_query_variants(&requirements());
        let broad = &variants[1];
        assert_eq!(broad.industry, None);
        assert_eq!(broad.titles.len(), 3);
        assert_eq!(broad.keywords, vec!["Rust", "Postgres"]);
    }

    #[test]
    fn alternative_uses_nice_to_have_skills() {
        let variants = generate_query_variants(&requirements());
        let alternative = &variants[2];
        assert_eq!(alternative.keywords, vec!["Kafka"]);
    }

    #[test]
    fn alternative_is_skipped_without_nice_to_haves() {
        let mut reqs = requirements();
        reqs.nice_to_have_skills.clear();
        let variants = generate_query_variants(&reqs);
        let kinds: Vec<_> = variants.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![VariantKind::Precise, VariantKind::Broad, VariantKind::Loose]
        );
    }

    #[test]
    fn loose_keeps_only_top_title_and_location() {
        let variants = generate_query_variants(&requirements());
        let loose = variants.last().unwrap();
        assert_eq!(loose.kind, VariantKind::Loose);
        assert_eq!(loose.titles, vec!["Staff Engineer"]);
        assert_eq!(loose.location.as_deref(), Some("Berlin"));
        assert!(loose.keywords.is_empty());
        assert!(loose.industry.is_none());
    }
}
