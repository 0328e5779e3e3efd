//! High-risk condition category matching for comorbidity strings.
//!
//! Matching rules:
//! - Multi-word keywords match as substrings ("heart failure")
//! - Short abbreviations (≤ 4 chars) match whole tokens only ("ckd", not "decadron")
//! - Longer keywords match a token prefix, or a token within Jaro-Winkler 0.93
//!   (tolerates "diabetis", "cirhosis")

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

/// Minimum Jaro-Winkler similarity for a misspelled token to match.
const FUZZY_THRESHOLD: f64 = 0.93;

/// Minimum keyword length for fuzzy matching.
const FUZZY_MIN_LEN: usize = 6;

/// High-risk condition category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConditionCategory {
    Cardiovascular,
    Diabetes,
    Renal,
    Respiratory,
    Malignancy,
    Cerebrovascular,
    Hepatic,
    Immunocompromise,
}

impl ConditionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionCategory::Cardiovascular => "cardiovascular",
            ConditionCategory::Diabetes => "diabetes",
            ConditionCategory::Renal => "renal",
            ConditionCategory::Respiratory => "respiratory",
            ConditionCategory::Malignancy => "malignancy",
            ConditionCategory::Cerebrovascular => "cerebrovascular",
            ConditionCategory::Hepatic => "hepatic",
            ConditionCategory::Immunocompromise => "immunocompromise",
        }
    }
}

/// Category, risk points, keywords.
pub struct CategoryRule {
    pub category: ConditionCategory,
    pub points: i32,
    pub keywords: &'static [&'static str],
}

pub static CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: ConditionCategory::Cardiovascular,
        points: 10,
        keywords: &[
            "heart failure", "chf", "coronary", "cad", "myocardial", "atrial fibrillation",
            "afib", "hypertension", "cardiomyopathy", "cardiac", "ischemic heart",
        ],
    },
    CategoryRule {
        category: ConditionCategory::Diabetes,
        points: 8,
        keywords: &["diabetes", "diabetic", "dm", "t1dm", "t2dm", "iddm", "niddm"],
    },
    CategoryRule {
        category: ConditionCategory::Renal,
        points: 10,
        keywords: &["kidney", "renal", "ckd", "esrd", "dialysis", "nephropathy"],
    },
    CategoryRule {
        category: ConditionCategory::Respiratory,
        points: 8,
        keywords: &[
            "copd", "asthma", "pulmonary", "emphysema", "bronchiectasis", "respiratory",
            "ild",
        ],
    },
    CategoryRule {
        category: ConditionCategory::Malignancy,
        points: 12,
        keywords: &[
            "cancer", "malignancy", "malignant", "tumor", "tumour", "carcinoma", "lymphoma",
            "leukemia", "leukaemia", "metastatic", "myeloma",
        ],
    },
    CategoryRule {
        category: ConditionCategory::Cerebrovascular,
        points: 10,
        keywords: &["stroke", "cva", "tia", "cerebrovascular", "transient ischemic"],
    },
    CategoryRule {
        category: ConditionCategory::Hepatic,
        points: 10,
        keywords: &["cirrhosis", "hepatic", "liver", "hepatitis"],
    },
    CategoryRule {
        category: ConditionCategory::Immunocompromise,
        points: 12,
        keywords: &[
            "immunocompromised", "immunosuppressed", "immunosuppression", "hiv", "aids",
            "transplant", "chemotherapy", "neutropenia", "neutropenic",
        ],
    },
];

/// Categories matched by a set of comorbidity strings, each at most once,
/// in table order.
pub fn match_categories(comorbidities: &[String]) -> Vec<&'static CategoryRule> {
    CATEGORY_RULES
        .iter()
        .filter(|rule| comorbidities.iter().any(|c| matches_rule(rule, c)))
        .collect()
}

fn matches_rule(rule: &CategoryRule, text: &str) -> bool {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    rule.keywords
        .iter()
        .any(|keyword| keyword_matches(keyword, &lower, &tokens))
}

fn keyword_matches(keyword: &str, text: &str, tokens: &[&str]) -> bool {
    if keyword.contains(' ') {
        return text.contains(keyword);
    }
    if keyword.len() <= 4 {
        return tokens.iter().any(|t| *t == keyword);
    }
    tokens.iter().any(|t| {
        t.starts_with(keyword)
            || (keyword.len() >= FUZZY_MIN_LEN && jaro_winkler(t, keyword) >= FUZZY_THRESHOLD)
    })
}
