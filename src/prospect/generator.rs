use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tracing::debug;

use super::ProspectInput;

const ROLE_CLASSES: &[(&str, &[&str])] = &[
    (
        "technical",
        &["CTO", "VP Engineering", "Head of Data", "Director of Analytics", "Chief Data Officer"],
    ),
    (
        "business",
        &["CEO", "COO", "VP Operations", "Director of Business Operations", "Head of Strategy"],
    ),
    (
        "executive",
        &["President", "Managing Director", "Partner", "General Manager", "EVP"],
    ),
];

const INDUSTRIES: &[&str] = &[
    "Technology",
    "Financial Services",
    "Retail",
    "E-commerce",
    "Logistics",
    "Manufacturing",
    "Consulting",
    "Healthcare",
    "Media",
    "Telecommunications",
    "Automotive",
    "Insurance",
];

const GEOGRAPHIES: &[(&str, &[&str])] = &[
    ("US", &["United States", "New York", "San Francisco", "Chicago", "Boston", "Austin"]),
    ("EU", &["London", "Berlin", "Paris", "Amsterdam", "Stockholm", "Dublin"]),
    ("APAC", &["Singapore", "Sydney", "Tokyo", "Hong Kong", "Bangalore"]),
];

const SELLING_INTENTS: &[&str] = &[
    "CRM data analytics and customer segmentation",
    "Supply chain optimization and visibility",
    "Financial reporting and FP&A automation",
    "E-commerce inventory and sales analytics",
    "Marketing attribution and ROI tracking",
    "Customer data platform consolidation",
    "Operational efficiency and cost reduction",
    "Multi-source data integration and reporting",
    "Product analytics and user behavior tracking",
    "Sales pipeline analytics and forecasting",
    "Real-time business intelligence dashboards",
    "Data warehouse modernization",
    "Compliance and regulatory reporting automation",
    "Predictive maintenance and IoT analytics",
    "HR analytics and workforce planning",
];

const FIRST_NAMES: &[&str] = &[
    "Sarah", "Michael", "Jennifer", "David", "Emily", "James", "Jessica", "Robert", "Lisa",
    "William", "Amanda", "Christopher", "Michelle", "Daniel", "Melissa", "Matthew", "Stephanie",
    "Andrew",
];

const LAST_NAMES: &[&str] = &[
    "Johnson", "Smith", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Anderson", "Taylor", "Thomas", "Moore", "Jackson", "Martin", "Lee", "Thompson",
];

const COMPANY_PREFIXES: &[&str] = &["Global", "Advanced", "Premier", "Summit", "Apex", "Vertex"];
const COMPANY_SUFFIXES: &[&str] =
    &["Group", "Solutions", "Corporation", "Technologies", "Enterprises", "Systems"];

/// Synthetic prospect generator for improvement-cycle testing.
///
/// Spreads prospects evenly across role classes and randomizes industry,
/// geography and selling intent per prospect, so no single failure pattern
/// dominates a suite by construction. Company names are unique within a
/// batch. A fixed seed makes a batch reproducible.
pub struct ProspectGenerator {
    rng: StdRng,
}

impl ProspectGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn generate(&mut self, count: usize) -> Vec<ProspectInput> {
        let mut templates: Vec<&str> = Vec::with_capacity(count);

        // Even split across role classes, remainder filled at random.
        let per_class = count / ROLE_CLASSES.len();
        for (_, roles) in ROLE_CLASSES {
            for _ in 0..per_class {
                templates.push(roles[self.rng.gen_range(0..roles.len())]);
            }
        }
        while templates.len() < count {
            let (_, roles) = ROLE_CLASSES[self.rng.gen_range(0..ROLE_CLASSES.len())];
            templates.push(roles[self.rng.gen_range(0..roles.len())]);
        }
        templates.shuffle(&mut self.rng);

        let mut used_companies = HashSet::new();
        let prospects: Vec<ProspectInput> = templates
            .into_iter()
            .map(|role| self.synthesize(role, &mut used_companies))
            .collect();

        debug!(
            count = prospects.len(),
            companies = used_companies.len(),
            "Generated synthetic prospects"
        );
        prospects
    }

    fn synthesize(&mut self, role: &str, used_companies: &mut HashSet<String>) -> ProspectInput {
        let industry = INDUSTRIES[self.rng.gen_range(0..INDUSTRIES.len())];
        let (_, locations) = GEOGRAPHIES[self.rng.gen_range(0..GEOGRAPHIES.len())];
        let country = locations[self.rng.gen_range(0..locations.len())];

        let base = format!(
            "{} {} {}",
            COMPANY_PREFIXES[self.rng.gen_range(0..COMPANY_PREFIXES.len())],
            industry,
            COMPANY_SUFFIXES[self.rng.gen_range(0..COMPANY_SUFFIXES.len())],
        );
        let mut company = base.clone();
        let mut counter = 1;
        while used_companies.contains(&company) {
            counter += 1;
            company = format!("{} {}", base, counter);
        }
        used_companies.insert(company.clone());

        ProspectInput {
            first_name: FIRST_NAMES[self.rng.gen_range(0..FIRST_NAMES.len())].to_string(),
            last_name: LAST_NAMES[self.rng.gen_range(0..LAST_NAMES.len())].to_string(),
            title: role.to_string(),
            company,
            country: country.to_string(),
            selling_intent: SELLING_INTENTS[self.rng.gen_range(0..SELLING_INTENTS.len())]
                .to_string(),
            ..ProspectInput::default()
        }
    }
}
