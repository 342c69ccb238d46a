//! Attribute-path rule table.

use serde::{Deserialize, Serialize};

/// One `(attribute path, keywords)` row; keywords are already normalized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub path: String,
    pub keywords: Vec<String>,
}

impl FieldRule {
    pub fn new(path: &str, keywords: &[&str]) -> Self {
        Self {
            path: path.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Topics that mark free-text questions the engine must not touch.
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "years of experience",
    "experience",
    "employment history",
    "work history",
    "current company",
    "previous company",
    "salary",
    "compensation",
    "expected pay",
    "cover letter",
    "skill",
    "tech stack",
    "notice period",
    "start date",
    "resume",
    "curriculum vitae",
    "education",
    "degree",
    "gpa",
];

/// The built-in table, in evaluation order.
pub fn default_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::new(
            "identity.full_name",
            &["full name", "legal name", "applicant name", "candidate name"],
        ),
        FieldRule::new(
            "identity.first_name",
            &["first name", "given name", "firstname", "legal first name"],
        ),
        FieldRule::new(
            "identity.last_name",
            &["last name", "surname", "family name", "lastname"],
        ),
        FieldRule::new("identity.email", &["email", "email address", "e mail"]),
        FieldRule::new(
            "identity.phone",
            &["phone", "phone number", "mobile", "cell", "telephone"],
        ),
        FieldRule::new(
            "address.street",
            &["street", "street address", "address line", "address 1", "address"],
        ),
        FieldRule::new("address.city", &["city", "town"]),
        FieldRule::new("address.state", &["state", "province", "region"]),
        FieldRule::new(
            "address.zip",
            &["zip", "zip code", "postal code", "postcode"],
        ),
        FieldRule::new("address.country", &["country", "nation"]),
        FieldRule::new(
            "work_auth.eligible_to_work_us",
            &[
                "authorized to work",
                "eligible to work",
                "work authorization",
                "work in the us",
                "work in the united states",
                "legally authorized",
                "lawfully authorized",
                "authorization to work",
                "currently authorized to work in the country",
                "authorized to work in the country",
                "authorized to work in the country to which you are applying",
            ],
        ),
        FieldRule::new(
            "work_auth.requires_sponsorship",
            &[
                "requires sponsorship",
                "require sponsorship",
                "visa sponsorship",
                "need sponsorship",
                "now or in the future require sponsorship",
                "require company sponsorship now or in the future",
                "maintain or extend your current work authorization status",
                "maintain or extend",
                "sponsorship",
            ],
        ),
        FieldRule::new(
            "work_auth.open_to_relocate",
            &[
                "open to relocate",
                "willing to relocate",
                "available to relocate",
                "relocation",
                "open to relocation",
                "commuting distance",
            ],
        ),
        FieldRule::new(
            "work_auth.worked_here_before",
            &[
                "worked here before",
                "previously worked here",
                "employed here before",
                "former employee",
                "worked for this company before",
                "in the past in a full time part time contractor or intern capacity",
            ],
        ),
        FieldRule::new("demographics.gender", &["gender", "sex", "gender identity"]),
        FieldRule::new(
            "demographics.pronouns",
            &["pronouns", "preferred pronouns", "pronoun"],
        ),
        FieldRule::new(
            "demographics.ethnicity",
            &["ethnicity", "race", "racial", "ethnic background"],
        ),
        FieldRule::new(
            "demographics.disability_status",
            &["disability", "disabled", "disability status"],
        ),
        FieldRule::new(
            "demographics.veteran_status",
            &["veteran", "protected veteran", "military service"],
        ),
        FieldRule::new(
            "education.school",
            &[
                "school",
                "school name",
                "university",
                "university name",
                "college",
                "institution",
            ],
        ),
        FieldRule::new(
            "education.degree",
            &[
                "degree type",
                "highest degree",
                "degree level",
                "education level",
                "level of education",
                "highest level of education",
            ],
        ),
        FieldRule::new(
            "education.field_of_study",
            &["field of study", "major", "area of study", "discipline"],
        ),
        FieldRule::new("links.linkedin", &["linkedin", "linkedin profile"]),
        FieldRule::new("links.github", &["github", "git hub"]),
        FieldRule::new(
            "links.portfolio",
            &["portfolio", "work samples", "projects url"],
        ),
        FieldRule::new(
            "links.website",
            &["website", "personal website", "personal site", "homepage"],
        ),
    ]
}

/// Every keyword of `rules`; a forbidden topic is tolerated when one of
/// these also appears.
pub fn allowed_keywords(rules: &[FieldRule]) -> impl Iterator<Item = &str> {
    rules
        .iter()
        .flat_map(|rule| rule.keywords.iter().map(String::as_str))
}
