// 🏷️ Business-Type Rules - priority tiers as data
// Every client resolves to exactly one business-type label

use crate::normalize::{fold_accents, normalize_key, KeySet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// TIER DEFINITION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tier {
    /// Label assigned on match (MM, SN, TE, ...)
    pub label: String,

    /// Normalized client codes belonging to this tier
    pub members: KeySet,

    /// Priority (higher = checked first)
    #[serde(default)]
    pub priority: i32,
}

impl Tier {
    pub fn new(label: &str, members: KeySet, priority: i32) -> Self {
        Tier {
            label: label.to_string(),
            members,
            priority,
        }
    }

    /// `code` must already be normalized
    pub fn matches(&self, code: &str) -> bool {
        self.members.contains(code)
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

#[derive(Debug, Clone)]
pub struct BusinessTypeClassifier {
    tiers: Vec<Tier>,
    default_label: String,
}

impl BusinessTypeClassifier {
    pub fn new(default_label: &str) -> Self {
        BusinessTypeClassifier {
            tiers: Vec::new(),
            default_label: default_label.to_string(),
        }
    }

    pub fn from_tiers(mut tiers: Vec<Tier>, default_label: &str) -> Self {
        // stable: equal priorities keep declaration order
        tiers.sort_by(|a, b| b.priority.cmp(&a.priority));
        BusinessTypeClassifier {
            tiers,
            default_label: default_label.to_string(),
        }
    }

    pub fn add_tier(&mut self, tier: Tier) {
        self.tiers.push(tier);
        self.tiers.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Label of the first tier containing the client, else the default
    pub fn classify(&self, client_code: &str) -> &str {
        let code = normalize_key(client_code);
        self.tiers
            .iter()
            .find(|tier| tier.matches(&code))
            .map(|tier| tier.label.as_str())
            .unwrap_or(self.default_label.as_str())
    }

    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    pub fn default_label(&self) -> &str {
        &self.default_label
    }
}

// ============================================================================
// POLICIES
// ============================================================================

/// How a client's business type is decided (selected per company)
#[derive(Debug, Clone)]
pub enum ClassificationPolicy {
    PriorityTiers(BusinessTypeClassifier),
    /// Roster value, trimmed
    CopyField,
    /// Accent-folded roster value looked up in the typology catalogue
    TypologyLookup(BTreeMap<String, String>),
}

impl ClassificationPolicy {
    /// `roster_value` is the configured roster field for this client
    /// (unused by the tier policy)
    pub fn resolve(&self, client_code: &str, roster_value: &str) -> String {
        match self {
            ClassificationPolicy::PriorityTiers(classifier) => {
                classifier.classify(client_code).to_string()
            }
            ClassificationPolicy::CopyField => roster_value.trim().to_string(),
            ClassificationPolicy::TypologyLookup(typology) => {
                let folded = fold_accents(roster_value);
                typology.get(&folded).cloned().unwrap_or(folded)
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ClassificationPolicy::PriorityTiers(_) => "priority_tiers",
            ClassificationPolicy::CopyField => "copy_field",
            ClassificationPolicy::TypologyLookup(_) => "typology_lookup",
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
