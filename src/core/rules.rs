// danger rules - what we look for and what we say back

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    CoSymptom,
    IndoorUse,
    WetConditions,
    Refueling,
    Backfeed,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::CoSymptom => "co-symptom",
            Category::IndoorUse => "indoor-use",
            Category::WetConditions => "wet-conditions",
            Category::Refueling => "refueling",
            Category::Backfeed => "backfeed",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Critical rules always sort ahead of high ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DangerRule {
    pub category: Category,
    pub severity: Severity,
    pub terms: Vec<String>,
    pub response: String,
}

impl DangerRule {
    pub fn new(category: Category, severity: Severity, terms: &[&str], response: &str) -> Self {
        Self {
            category,
            severity,
            terms: terms.iter().map(|t| t.to_lowercase()).collect(),
            response: response.to_string(),
        }
    }
}

/// An ordered, validated rule table. Earlier rules win.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<DangerRule>,
}

// on-disk shape: a list of [[rule]] tables
#[derive(Deserialize)]
struct RuleFile {
    rule: Vec<DangerRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<DangerRule>) -> Result<Self, Error> {
        if rules.is_empty() {
            return Err(Error::Rules("no rules defined".to_string()));
        }

        let mut rules = rules;
        for rule in &mut rules {
            if rule.terms.is_empty() {
                return Err(Error::Rules(format!("{} has no trigger terms", rule.category)));
            }
            if rule.terms.iter().any(|t| t.trim().is_empty()) {
                return Err(Error::Rules(format!("{} has a blank trigger term", rule.category)));
            }
            if rule.response.trim().is_empty() {
                return Err(Error::Rules(format!("{} has no response", rule.category)));
            }
            // matching is done on lowercased text
            for term in &mut rule.terms {
                *term = term.to_lowercase();
            }
        }

        // declared order is the priority order, so it has to respect severity
        if let Some(pair) = rules.windows(2).find(|w| w[0].severity > w[1].severity) {
            return Err(Error::Rules(format!(
                "{} ({:?}) is declared before {} ({:?})",
                pair[0].category, pair[0].severity, pair[1].category, pair[1].severity
            )));
        }

        Ok(Self { rules })
    }

    pub fn from_toml(text: &str) -> Result<Self, Error> {
        let file: RuleFile = toml::from_str(text).map_err(|e| Error::Rules(e.to_string()))?;
        Self::new(file.rule)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Rules(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn rules(&self) -> &[DangerRule] {
        &self.rules
    }

    pub fn get(&self, category: Category) -> Option<&DangerRule> {
        self.rules.iter().find(|r| r.category == category)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }
}

fn builtin_rules() -> Vec<DangerRule> {
    vec![
        DangerRule::new(
            Category::CoSymptom,
            Severity::Critical,
            &[
                "dizzy",
                "dizziness",
                "nausea",
                "nauseous",
                "headache",
                "lightheaded",
                "faint",
                "vomit",
                "throwing up",
                "co alarm",
                "carbon monoxide alarm",
                "alarm going off",
            ],
            "I need to address a life-threatening situation immediately. These can be \
             symptoms of carbon monoxide poisoning. Get everyone out into fresh air NOW \
             and call 911. Do not go back inside, and do not restart the generator, until \
             emergency responders say it is safe. For non-emergency questions, Poison \
             Control is at 1-800-222-1222.",
        ),
        DangerRule::new(
            Category::IndoorUse,
            Severity::High,
            &[
                "garage",
                "basement",
                "in the shed",
                "in my shed",
                "in a shed",
                "carport",
                "porch",
                "indoors",
                "inside the house",
                "inside my house",
                "inside the garage",
                "running inside",
                "run it inside",
                "in my room",
                "in the house",
                "crawl space",
            ],
            "TURN OFF the generator and MOVE IT OUTSIDE now. Generators must never run in \
             garages, basements, sheds, porches or any enclosed or partly enclosed space, \
             even with doors and windows open. Place it at least 20 feet from doors, \
             windows and vents, with the exhaust pointed away from the building. Carbon \
             monoxide from an indoor generator can kill in minutes. Call 911 if anyone \
             feels sick.",
        ),
        DangerRule::new(
            Category::WetConditions,
            Severity::High,
            &[
                "it's raining",
                "it is raining",
                "in the rain",
                "rainy",
                "rainstorm",
                "flooding",
                "flooded",
                "standing water",
                "wet",
            ],
            "Do not touch or run the generator while it or you are wet. Shut it off only \
             if you can do so from a dry spot with dry hands. Operate it on a dry surface \
             under an open canopy, never enclosed, and keep every cord out of water. Wet \
             generators can electrocute you.",
        ),
        DangerRule::new(
            Category::Refueling,
            Severity::High,
            &[
                "refuel",
                "refill",
                "adding gas",
                "add gas",
                "while running",
                "while it's running",
                "hot generator",
            ],
            "Never add fuel to a running or hot generator. Turn it off and let it cool \
             for at least 10 to 30 minutes (check your manual), then refuel outdoors away \
             from any flame or spark. Gasoline on a hot engine can ignite instantly.",
        ),
        DangerRule::new(
            Category::Backfeed,
            Severity::High,
            &[
                "wall outlet",
                "backfeed",
                "back feed",
                "plug into the house",
                "plug it into the house",
                "dryer outlet",
                "suicide cord",
            ],
            "Do not plug the generator into a wall outlet. Backfeeding sends power into \
             the utility lines and can electrocute line workers or start a fire. Plug \
             appliances directly into the generator with grounded outdoor-rated cords, or \
             have a licensed electrician install a transfer switch.",
        ),
    ]
}
