//! Value candidate generation: the phrasings a page might use for one
//! profile value, most canonical first.

use perceiver_form::normalize;

const YES_TOKENS: &[&str] = &["yes", "y", "true", "1"];
const NO_TOKENS: &[&str] = &["no", "n", "false", "0"];

const PREFER_NOT_TO_SAY: &[&str] = &[
    "prefer not to say",
    "i prefer not to say",
    "prefer not to disclose",
    "prefer not to answer",
    "decline to answer",
    "decline to self identify",
    "i do not wish to answer",
    "i don t wish to answer",
    "choose not to answer",
    "choose not to disclose",
    "i choose not to disclose",
    "not specified",
];

/// Canonical value followed by its aliases; a value matching any member
/// expands to the whole family.
const COUNTRY_FAMILIES: &[&[&str]] = &[
    &[
        "united states",
        "usa",
        "us",
        "u s",
        "u s a",
        "united states of america",
        "america",
    ],
    &[
        "united kingdom",
        "uk",
        "u k",
        "great britain",
        "gb",
    ],
];

const GENDER_FAMILIES: &[&[&str]] = &[
    &["male", "man", "cisgender man", "m"],
    &["female", "woman", "cisgender woman", "f"],
    &[
        "non binary",
        "nonbinary",
        "genderqueer",
        "gender non conforming",
    ],
];

const PRONOUN_FAMILIES: &[&[&str]] = &[
    &["he him", "he him his", "he"],
    &["she her", "she her hers", "she"],
    &["they them", "they them theirs", "they"],
];

const ETHNICITY_FAMILIES: &[&[&str]] = &[
    &["white", "caucasian", "white not hispanic or latino"],
    &[
        "black or african american",
        "african american",
        "black",
        "black or african american not hispanic or latino",
    ],
    &["asian", "asian not hispanic or latino"],
    &["hispanic or latino", "hispanic", "latino", "latina", "latinx"],
    &["two or more races", "multiracial", "two or more races not hispanic or latino"],
    &[
        "american indian or alaska native",
        "native american",
        "american indian",
    ],
    &[
        "native hawaiian or other pacific islander",
        "pacific islander",
        "native hawaiian",
    ],
];

const DEGREE_FAMILIES: &[&[&str]] = &[
    &[
        "bachelor s degree",
        "bachelors degree",
        "bachelor s",
        "bachelors",
        "bachelor",
        "ba",
        "bs",
        "bsc",
        "b s",
        "b a",
    ],
    &["mba", "master of business administration"],
    &[
        "master s degree",
        "masters degree",
        "master s",
        "masters",
        "master",
        "ms",
        "ma",
        "msc",
        "m s",
        "m a",
    ],
    &[
        "phd",
        "ph d",
        "doctorate",
        "doctor of philosophy",
        "doctoral degree",
    ],
    &["md", "m d", "doctor of medicine"],
    &["jd", "j d", "juris doctor"],
    &[
        "associate s degree",
        "associate degree",
        "associates degree",
        "associate",
        "aa",
        "as",
    ],
    &["high school diploma", "high school", "ged"],
];

pub fn is_yes_token(normalized: &str) -> bool {
    YES_TOKENS.contains(&normalized)
}

pub fn is_no_token(normalized: &str) -> bool {
    NO_TOKENS.contains(&normalized)
}

/// Polarity of a yes/no value, `None` for anything else.
pub fn yes_no(raw: &str) -> Option<bool> {
    let normalized = normalize(raw);
    if is_yes_token(&normalized) {
        Some(true)
    } else if is_no_token(&normalized) {
        Some(false)
    } else {
        None
    }
}

pub fn is_prefer_not_to_say(normalized: &str) -> bool {
    PREFER_NOT_TO_SAY.contains(&normalized)
}

fn work_auth_phrasings(path: &str, yes: bool) -> &'static [&'static str] {
    match (path, yes) {
        ("work_auth.eligible_to_work_us", true) => &[
            "authorized",
            "eligible",
            "i am authorized to work",
            "authorized to work",
            "legally authorized",
            "eligible to work",
        ],
        ("work_auth.eligible_to_work_us", false) => &[
            "not authorized",
            "not eligible",
            "i am not authorized to work",
            "not authorized to work",
            "not legally authorized",
        ],
        ("work_auth.requires_sponsorship", true) => &[
            "i require sponsorship",
            "require sponsorship",
            "i will require sponsorship",
            "will require sponsorship",
            "sponsorship required",
        ],
        ("work_auth.requires_sponsorship", false) => &[
            "i do not require sponsorship",
            "do not require sponsorship",
            "i don t require sponsorship",
            "don t require sponsorship",
            "i will not require sponsorship",
            "will not require sponsorship",
            "no sponsorship required",
        ],
        ("work_auth.open_to_relocate", true) => &[
            "open to relocate",
            "willing to relocate",
            "open to relocation",
            "i am willing to relocate",
        ],
        ("work_auth.open_to_relocate", false) => &[
            "not willing to relocate",
            "not open to relocate",
            "not open to relocation",
            "i am not willing to relocate",
        ],
        ("work_auth.worked_here_before", true) => &[
            "i have worked here before",
            "previously worked here",
            "former employee",
        ],
        ("work_auth.worked_here_before", false) => &[
            "i have not worked here before",
            "never worked here",
            "not a former employee",
        ],
        _ => &[],
    }
}

fn veteran_phrasings(yes: bool) -> &'static [&'static str] {
    if yes {
        &[
            "i am a protected veteran",
            "protected veteran",
            "i identify as one or more of the classifications of protected veteran",
            "veteran",
        ]
    } else {
        &[
            "i am not a protected veteran",
            "not a protected veteran",
            "i am not a veteran",
            "not a veteran",
        ]
    }
}

fn disability_phrasings(yes: bool) -> &'static [&'static str] {
    if yes {
        &[
            "yes i have a disability or have had one in the past",
            "yes i have a disability",
            "i have a disability",
        ]
    } else {
        &[
            "no i do not have a disability and have not had one in the past",
            "no i do not have a disability",
            "i do not have a disability",
            "no i don t have a disability",
        ]
    }
}

fn family_of(families: &[&'static [&'static str]], value: &str) -> Option<&'static [&'static str]> {
    families
        .iter()
        .copied()
        .find(|family| family.contains(&value))
}

/// Ordered, de-duplicated normalized phrasings equivalent to `raw` for
/// `path`. Empty when `raw` is blank after normalization.
pub fn candidates_for(path: &str, raw: &str) -> Vec<String> {
    let value = normalize(raw);
    if value.is_empty() {
        return Vec::new();
    }
    let mut list: Vec<&str> = vec![value.as_str()];
    let polarity = if is_yes_token(&value) {
        Some(true)
    } else if is_no_token(&value) {
        Some(false)
    } else {
        None
    };

    if path.starts_with("work_auth.") {
        if let Some(yes) = polarity {
            list.extend(if yes {
                ["yes", "true", "1"]
            } else {
                ["no", "false", "0"]
            });
            list.extend(work_auth_phrasings(path, yes));
        }
    }

    if path.starts_with("demographics.") && is_prefer_not_to_say(&value) {
        list.extend(PREFER_NOT_TO_SAY);
    }

    match path {
        "demographics.veteran_status" => {
            if let Some(yes) = polarity {
                list.extend(veteran_phrasings(yes));
            }
        }
        "demographics.disability_status" => {
            if let Some(yes) = polarity {
                list.extend(disability_phrasings(yes));
            }
        }
        "demographics.gender" => list.extend(family_of(GENDER_FAMILIES, &value).unwrap_or(&[])),
        "demographics.pronouns" => {
            list.extend(family_of(PRONOUN_FAMILIES, &value).unwrap_or(&[]))
        }
        "demographics.ethnicity" => {
            list.extend(family_of(ETHNICITY_FAMILIES, &value).unwrap_or(&[]))
        }
        "education.degree" => list.extend(degree_family(&value).unwrap_or(&[])),
        "address.country" => list.extend(family_of(COUNTRY_FAMILIES, &value).unwrap_or(&[])),
        _ => {}
    }

    let mut unique: Vec<String> = Vec::with_capacity(list.len());
    for candidate in list {
        if !unique.iter().any(|seen| seen == candidate) {
            unique.push(candidate.to_string());
        }
    }
    unique
}

/// Degree values are often free text ("B.S. in Computer Science"), so the
/// family is found by its members appearing as whole words.
fn degree_family(value: &str) -> Option<&'static [&'static str]> {
    if let Some(family) = family_of(DEGREE_FAMILIES, value) {
        return Some(family);
    }
    DEGREE_FAMILIES.iter().copied().find(|family| {
        family
            .iter()
            .filter(|member| member.len() > 2)
            .any(|member| perceiver_form::contains_phrase(value, member))
    })
}
