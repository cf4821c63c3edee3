//! Expertise keyword index and persona catalog
//!
//! Each known expertise tag carries the keywords that signal it in a
//! question, plus the display data used to seat a virtual expert for it.

use super::member::{ExpertiseTag, PanelMember};
use crate::core::string::contains_word_prefix;
use std::collections::BTreeMap;

/// Static description of one area of expertise
#[derive(Debug, Clone, Copy)]
pub struct ExpertiseProfile {
    pub tag: &'static str,
    pub display_name: &'static str,
    pub role: &'static str,
    /// Lower-case keywords or stems, matched at word starts
    pub keywords: &'static [&'static str],
    /// What this expert pays attention to (fed into the persona)
    pub focus: &'static str,
}

const PROFILES: &[ExpertiseProfile] = &[
    ExpertiseProfile {
        tag: "clinical_medicine",
        display_name: "Dr. Elena Marsh",
        role: "Clinical Physician",
        keywords: &[
            "clinical", "patient", "diagnos", "treatment", "symptom", "disease", "therapy",
            "diabetes", "hospital", "medical",
        ],
        focus: "patient outcomes, standard of care and day-to-day clinical practicality",
    },
    ExpertiseProfile {
        tag: "pharmacology",
        display_name: "Dr. Ravi Iyer",
        role: "Clinical Pharmacologist",
        keywords: &[
            "drug", "medication", "dose", "dosage", "side effect", "adverse", "pharmac",
            "prescri",
        ],
        focus: "mechanisms of action, interactions, dosing and adverse-event profiles",
    },
    ExpertiseProfile {
        tag: "cardiology",
        display_name: "Dr. Sofia Brandt",
        role: "Cardiologist",
        keywords: &[
            "cardio", "heart", "cardiac", "blood pressure", "hypertension", "stroke",
            "arrhythmia", "cholesterol",
        ],
        focus: "cardiovascular risk, cardiac safety signals and long-term heart outcomes",
    },
    ExpertiseProfile {
        tag: "endocrinology",
        display_name: "Dr. Kenji Mori",
        role: "Endocrinologist",
        keywords: &[
            "diabetes", "insulin", "glucose", "thyroid", "hormone", "endocrin", "metabolic",
        ],
        focus: "metabolic control, hormonal pathways and glycaemic targets",
    },
    ExpertiseProfile {
        tag: "biostatistics",
        display_name: "Dr. Amara Okafor",
        role: "Biostatistician",
        keywords: &[
            "statistic", "trial", "cohort", "sample size", "p-value", "regression",
            "probabilit", "meta-analys",
        ],
        focus: "quality of evidence, effect sizes, bias and statistical power",
    },
    ExpertiseProfile {
        tag: "medical_ethics",
        display_name: "Prof. Hannah Lowe",
        role: "Medical Ethicist",
        keywords: &["consent", "autonomy", "end of life", "bioethic", "dignity", "equity"],
        focus: "patient autonomy, informed consent, justice and equitable access",
    },
    ExpertiseProfile {
        tag: "regulatory_affairs",
        display_name: "Marcus Hale",
        role: "Regulatory Affairs Specialist",
        keywords: &["fda", "ema", "regulat", "approval", "compliance", "label", "guideline"],
        focus: "approval pathways, labelling, compliance obligations and post-market duties",
    },
    ExpertiseProfile {
        tag: "software_engineering",
        display_name: "Priya Natarajan",
        role: "Principal Software Engineer",
        keywords: &[
            "software", "code", "api", "architecture", "microservice", "rust", "database",
            "refactor", "scalab", "library",
        ],
        focus: "maintainability, correctness, architecture trade-offs and delivery cost",
    },
    ExpertiseProfile {
        tag: "security",
        display_name: "Tomasz Wolski",
        role: "Security Architect",
        keywords: &[
            "security", "secure", "vulnerab", "attack", "encrypt", "authenticat", "breach",
            "malware",
        ],
        focus: "threat models, attack surface, data protection and secure defaults",
    },
    ExpertiseProfile {
        tag: "devops",
        display_name: "Lena Fischer",
        role: "Site Reliability Engineer",
        keywords: &[
            "deploy", "kubernetes", "docker", "ci/cd", "infrastructure", "monitoring", "cloud",
            "latency", "outage",
        ],
        focus: "operability, reliability, observability and incident cost",
    },
    ExpertiseProfile {
        tag: "data_science",
        display_name: "Dr. Mateo Ruiz",
        role: "Data Scientist",
        keywords: &[
            "data", "machine learning", "dataset", "analytics", "predict", "neural",
            "model training", "forecast",
        ],
        focus: "data quality, modelling assumptions and measurable validation",
    },
    ExpertiseProfile {
        tag: "ux_design",
        display_name: "Chloe Dubois",
        role: "UX Designer",
        keywords: &[
            "user experience", "usability", "interface", "accessibilit", "onboarding",
            "ux", "user research",
        ],
        focus: "user needs, usability, accessibility and adoption friction",
    },
    ExpertiseProfile {
        tag: "business_strategy",
        display_name: "Jonathan Reyes",
        role: "Strategy Consultant",
        keywords: &[
            "strateg", "market", "competit", "growth", "business", "startup", "expansion",
            "acquisition",
        ],
        focus: "competitive position, long-term value creation and strategic fit",
    },
    ExpertiseProfile {
        tag: "finance",
        display_name: "Grace Whitfield",
        role: "Chief Financial Officer",
        keywords: &[
            "cost", "revenue", "profit", "invest", "budget", "financ", "pricing", "valuation",
            "roi",
        ],
        focus: "cash flow, return on investment, downside exposure and funding",
    },
    ExpertiseProfile {
        tag: "marketing",
        display_name: "Nadia Karim",
        role: "Marketing Director",
        keywords: &["brand", "marketing", "customer", "campaign", "advertis", "segment"],
        focus: "customer perception, positioning and go-to-market execution",
    },
    ExpertiseProfile {
        tag: "economics",
        display_name: "Prof. David Lindqvist",
        role: "Economist",
        keywords: &[
            "econom", "inflation", "gdp", "labor", "labour", "tax", "trade", "interest rate",
            "recession",
        ],
        focus: "incentives, second-order effects and macroeconomic context",
    },
    ExpertiseProfile {
        tag: "operations",
        display_name: "Oliver Grant",
        role: "Operations Executive",
        keywords: &[
            "supply chain", "logistic", "operation", "process", "efficien", "manufactur",
            "inventory",
        ],
        focus: "execution capacity, process efficiency and operational risk",
    },
    ExpertiseProfile {
        tag: "legal",
        display_name: "Isabel Moreau",
        role: "Legal Counsel",
        keywords: &[
            "law", "legal", "contract", "liabil", "lawsuit", "court", "intellectual property",
            "patent", "gdpr",
        ],
        focus: "legal exposure, contractual obligations and regulatory liability",
    },
    ExpertiseProfile {
        tag: "public_policy",
        display_name: "Samuel Adeyemi",
        role: "Public Policy Analyst",
        keywords: &[
            "policy", "government", "legislat", "public", "regulation", "welfare", "election",
        ],
        focus: "public interest, implementation feasibility and political constraints",
    },
    ExpertiseProfile {
        tag: "sociology",
        display_name: "Dr. Mei Chen",
        role: "Sociologist",
        keywords: &["social", "communit", "inequalit", "cultur", "demograph", "society"],
        focus: "effects on communities, inequality and social behaviour",
    },
    ExpertiseProfile {
        tag: "ethics",
        display_name: "Prof. Alan Brooks",
        role: "Ethicist",
        keywords: &["ethic", "moral", "fair", "bias", "responsib", "harm"],
        focus: "fairness, harms and benefits, and who bears the consequences",
    },
    ExpertiseProfile {
        tag: "research_methods",
        display_name: "Dr. Ingrid Holm",
        role: "Research Methodologist",
        keywords: &[
            "research", "experiment", "hypothes", "study", "methodolog", "evidence",
            "literature",
        ],
        focus: "study design, strength of evidence and what remains unknown",
    },
    ExpertiseProfile {
        tag: "risk_management",
        display_name: "Victor Osei",
        role: "Risk Manager",
        keywords: &["risk", "hazard", "mitigat", "contingen", "uncertain", "exposure"],
        focus: "likelihood and impact of failure modes, and mitigation options",
    },
    ExpertiseProfile {
        tag: "environmental_science",
        display_name: "Dr. Freya Nilsen",
        role: "Environmental Scientist",
        keywords: &[
            "climate", "environment", "emission", "carbon", "sustainab", "pollution", "energy",
        ],
        focus: "environmental impact, sustainability and long-horizon effects",
    },
];

/// All known expertise profiles, in catalog order
pub fn profiles() -> &'static [ExpertiseProfile] {
    PROFILES
}

/// Look up the profile for a tag
pub fn profile(tag: &ExpertiseTag) -> Option<&'static ExpertiseProfile> {
    PROFILES.iter().find(|p| p.tag == tag.as_str())
}

/// Detect expertise signals in a question.
///
/// For each known tag the lower-cased question is scanned for the tag's
/// keywords; the score is `hits / keywords.len()`. Only tags with at least
/// one hit appear in the returned map.
pub fn detect_expertise(question: &str) -> BTreeMap<ExpertiseTag, f64> {
    let haystack = question.to_lowercase();
    PROFILES
        .iter()
        .filter_map(|profile| {
            let hits = profile
                .keywords
                .iter()
                .filter(|kw| contains_word_prefix(&haystack, kw))
                .count();
            (hits > 0).then(|| {
                (
                    ExpertiseTag::new(profile.tag),
                    hits as f64 / profile.keywords.len() as f64,
                )
            })
        })
        .collect()
}

/// Build a virtual panelist for the given expertise tag.
///
/// Unknown tags get a generic specialist persona named after the tag.
pub fn persona_for(tag: &ExpertiseTag) -> PanelMember {
    match profile(tag) {
        Some(p) => PanelMember::new(
            format!("{}-expert", p.tag),
            p.display_name,
            p.role,
            persona_text(p.display_name, p.role, p.focus),
        )
        .with_expertise(p.tag),
        None => {
            let label = tag.as_str().replace('_', " ");
            let role = format!("{} specialist", label);
            PanelMember::new(
                format!("{}-expert", tag),
                format!("The {} expert", label),
                role.clone(),
                persona_text(&role, &role, &format!("questions of {}", label)),
            )
            .with_expertise(tag.clone())
        }
    }
}

fn persona_text(name: &str, role: &str, focus: &str) -> String {
    format!(
        "You are {name}, a {role} serving on a panel of experts. \
         You reason from your specialty and pay particular attention to {focus}. \
         State your position plainly, say what evidence it rests on, and be candid \
         about uncertainty and about points where you disagree with other panelists."
    )
}
