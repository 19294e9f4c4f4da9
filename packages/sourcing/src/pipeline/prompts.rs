//! LLM prompts for the sourcing pipeline.
//!
//! The extraction prompt pins the model to a single object with two
//! mandatory fields; the scoring prompt is deliberately lenient so
//! incomplete public profiles are not over-penalized.

use crate::types::candidate::Candidate;
use crate::types::requirements::JobRequirements;

/// Prompt for deriving structured requirements from a job description.
pub const FORMAT_REQUIREMENTS_PROMPT: &str = r#"Extract structured hiring requirements from this job description.

Output JSON:
{
    "titles": ["acceptable role titles, most senior first"],
    "required_skills": ["skills the role cannot do without"],
    "nice_to_have_skills": ["skills that are a bonus"],
    "location": "target location or null",
    "industry": "target industry or null",
    "min_years": minimum years of relevant experience or null,
    "seniority": "entry | mid | senior | lead | principal | executive, or null"
}

Keep lists short and concrete. Do not invent requirements that are not in
the description.

Job Description:
{description}"#;

/// Prompt for structured extraction over a scraped profile.
pub const EXTRACT_PROFILE_PROMPT: &str = r#"Extract a structured candidate profile from this scraped data.

Output a SINGLE JSON object (never an array) with exactly this shape:
{
    "full_name": "candidate's full name (MANDATORY)",
    "profile_url": "canonical profile URL (MANDATORY)",
    "headline": "profile headline or null",
    "location": "location or null",
    "current_title": "current role title or null",
    "current_company": "current employer or null",
    "photo_url": "photo URL or null",
    "skills": ["up to 10 skills"],
    "experience": [
        {"title": "role title", "company": "employer", "duration": "duration as written, e.g. '2019 - Present' or '3 yrs 4 mos'"}
    ]
}

Rules:
1. full_name and profile_url are mandatory; copy them from the data, never invent them
2. Omit or null any field the data does not contain
3. At most 10 skills, most relevant first

Scraped Profile:
{profile}"#;

/// Prompt for rubric scoring of one candidate.
pub const SCORE_CANDIDATE_PROMPT: &str = r#"Score this candidate against the job requirements.

Be GENEROUS: public profiles are often incomplete. Give credit for
transferable and adjacent skills, and do not penalize missing data the
candidate likely has.

Rubric (score each component independently):
- skills_match: 0-25, required-skill coverage including close equivalents
- experience_fit: 0-25, years and depth versus what the role needs
- industry_relevance: 0-20, industry background fit
- title_fit: 0-15, title and seniority alignment
- bonus: 0-10, nice-to-have skills present

Output JSON:
{
    "skills_match": 0-25,
    "experience_fit": 0-25,
    "industry_relevance": 0-20,
    "title_fit": 0-15,
    "bonus": 0-10,
    "matched_skills": ["required skills the candidate has"],
    "missing_skills": ["required skills not in evidence"],
    "bonus_skills": ["nice-to-have skills the candidate has"],
    "relevant_years": years in SIMILAR roles (not total career),
    "seniority": "entry | mid | senior | lead | principal | executive",
    "industry_match": "match | adjacent | mismatch",
    "reasoning": "2-3 sentences on the fit"
}

Job Description:
{description}

Requirements:
{requirements}

Candidate:
{candidate}"#;

/// Fill the requirements-formatting prompt.
pub fn format_requirements_prompt(description: &str) -> String {
    FORMAT_REQUIREMENTS_PROMPT.replace("{description}", description)
}

/// Fill the profile-extraction prompt.
pub fn format_extract_prompt(profile: &serde_json::Value) -> String {
    EXTRACT_PROFILE_PROMPT.replace("{profile}", &profile.to_string())
}

/// Fill the scoring prompt.
pub fn format_score_prompt(
    candidate: &Candidate,
    description: &str,
    requirements: &JobRequirements,
) -> String {
    let candidate_block = serde_json::json!({
        "name": candidate.full_name,
        "headline": candidate.headline,
        "location": candidate.location,
        "current_title": candidate.current_title,
        "current_company": candidate.current_company,
        "skills": candidate.skills,
        "experience_years": candidate.experience_years,
    });
    let requirements_block =
        serde_json::to_string(requirements).unwrap_or_else(|_| "{}".to_string());

    SCORE_CANDIDATE_PROMPT
        .replace("{description}", description)
        .replace("{requirements}", &requirements_block)
        .replace("{candidate}", &candidate_block.to_string())
}
