//! Inventory records and resource matching
//!
//! Personnel, tools and parts are persisted in the hub store. Matching a
//! work package against them is a pure function so it can be tested
//! without a store.

use hubstore::{IndexValue, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Availability value that makes a technician assignable
pub const AVAILABLE: &str = "available";

/// A maintenance technician or engineer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personnel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    /// Licence ratings held (e.g. "B1", "B2")
    #[serde(default)]
    pub ratings: Vec<String>,
    #[serde(default)]
    pub specializations: Vec<String>,
    #[serde(default)]
    pub shift: String,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub updated_at: i64,
}

impl Record for Personnel {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "personnel"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("availability".to_string(), IndexValue::String(self.availability.clone()));
        fields.insert("role".to_string(), IndexValue::String(self.role.clone()));
        fields
    }
}

/// A tool or piece of ground equipment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
    /// Calibration due date, when the tool is calibrated
    #[serde(default)]
    pub calibration_due: Option<String>,
    #[serde(default)]
    pub updated_at: i64,
}

impl Record for ToolRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "tools"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), IndexValue::String(self.name.clone()));
        fields.insert("category".to_string(), IndexValue::String(self.category.clone()));
        fields
    }
}

/// A stocked spare part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub id: String,
    pub part_no: String,
    pub name: String,
    #[serde(default)]
    pub ata_chapter: Option<String>,
    #[serde(default)]
    pub stock_level: i64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub lead_time_days: Option<i64>,
    #[serde(default)]
    pub updated_at: i64,
}

impl Record for Part {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "parts"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("part_no".to_string(), IndexValue::String(self.part_no.clone()));
        fields.insert("name".to_string(), IndexValue::String(self.name.clone()));
        fields.insert("stock_level".to_string(), IndexValue::Int(self.stock_level));
        fields
    }
}

/// Snapshot of every inventory collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub personnel: Vec<Personnel>,
    #[serde(default)]
    pub tools: Vec<ToolRecord>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Inventory {
    /// Parse an inventory file (YAML, so JSON works too)
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// The sample inventory compiled into the binary
    pub fn sample() -> Result<Self, serde_yaml::Error> {
        Self::from_yaml(include_str!("../../data/inventory.yml"))
    }

    pub fn is_empty(&self) -> bool {
        self.personnel.is_empty() && self.tools.is_empty() && self.parts.is_empty()
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.personnel.len() + self.tools.len() + self.parts.len()
    }
}

/// Requirements of a work package and the inventory that covers them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePlanResult {
    pub required_ratings: Vec<String>,
    pub required_tools: Vec<String>,
    pub required_parts: Vec<String>,
    pub matched_personnel: Vec<Personnel>,
    pub matched_tools: Vec<ToolRecord>,
    pub matched_parts: Vec<Part>,
}

impl ResourcePlanResult {
    /// Match a work package (as loose JSON) against the inventory
    ///
    /// Requirements are the union over all steps, sorted. Personnel match
    /// when available and holding any required rating; tools match by
    /// name; parts match by name or part number.
    pub fn compute(work_package: &Value, inventory: &Inventory) -> Self {
        let required_ratings = collect_requirement(work_package, "required_ratings");
        let required_tools = collect_requirement(work_package, "required_tools");
        let required_parts = collect_requirement(work_package, "required_parts");
        debug!(
            ratings = required_ratings.len(),
            tools = required_tools.len(),
            parts = required_parts.len(),
            "ResourcePlanResult::compute: requirements collected"
        );

        let matched_personnel = inventory
            .personnel
            .iter()
            .filter(|p| p.availability == AVAILABLE && p.ratings.iter().any(|r| required_ratings.contains(r)))
            .cloned()
            .collect();

        let matched_tools = inventory
            .tools
            .iter()
            .filter(|t| required_tools.contains(&t.name))
            .cloned()
            .collect();

        let matched_parts = inventory
            .parts
            .iter()
            .filter(|p| required_parts.contains(&p.name) || required_parts.contains(&p.part_no))
            .cloned()
            .collect();

        Self {
            required_ratings: required_ratings.into_iter().collect(),
            required_tools: required_tools.into_iter().collect(),
            required_parts: required_parts.into_iter().collect(),
            matched_personnel,
            matched_tools,
            matched_parts,
        }
    }
}

/// Union of a string-list field over all steps
fn collect_requirement(work_package: &Value, field: &str) -> BTreeSet<String> {
    work_package["steps"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|step| step[field].as_array())
        .flatten()
        .filter_map(|v| v.as_str().map(String::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tech(id: &str, ratings: &[&str], availability: &str) -> Personnel {
        Personnel {
            id: id.to_string(),
            name: format!("Tech {}", id),
            role: "technician".to_string(),
            ratings: ratings.iter().map(|r| r.to_string()).collect(),
            specializations: vec![],
            shift: "day".to_string(),
            availability: availability.to_string(),
            updated_at: 0,
        }
    }

    fn tool(name: &str) -> ToolRecord {
        ToolRecord {
            id: format!("T-{}", name.len()),
            name: name.to_string(),
            category: "hand".to_string(),
            location: "hangar 1".to_string(),
            calibration_due: None,
            updated_at: 0,
        }
    }

    fn part(part_no: &str, name: &str) -> Part {
        Part {
            id: part_no.to_string(),
            part_no: part_no.to_string(),
            name: name.to_string(),
            ata_chapter: Some("27".to_string()),
            stock_level: 3,
            location: "store".to_string(),
            lead_time_days: Some(5),
            updated_at: 0,
        }
    }

    fn inventory() -> Inventory {
        Inventory {
            personnel: vec![tech("P1", &["B1"], "available"), tech("P2", &["B1"], "on_leave"), tech("P3", &["B2"], "available")],
            tools: vec![tool("Torque wrench"), tool("Borescope")],
            parts: vec![part("PN-100", "Actuator seal kit"), part("PN-200", "Hydraulic hose")],
        }
    }

    #[test]
    fn test_compute_matches_and_sorts() {
        let wp = json!({
            "steps": [
                {"id": "1", "required_ratings": ["B1"], "required_tools": ["Torque wrench"], "required_parts": ["PN-200"]},
                {"id": "2", "required_ratings": ["B1", "A"], "required_tools": [], "required_parts": ["Actuator seal kit"]}
            ]
        });

        let result = ResourcePlanResult::compute(&wp, &inventory());

        assert_eq!(result.required_ratings, vec!["A", "B1"]);
        assert_eq!(result.required_tools, vec!["Torque wrench"]);
        assert_eq!(result.required_parts, vec!["Actuator seal kit", "PN-200"]);
        assert_eq!(result.matched_personnel.len(), 1);
        assert_eq!(result.matched_personnel[0].id, "P1");
        assert_eq!(result.matched_tools.len(), 1);
        assert_eq!(result.matched_parts.len(), 2);
    }

    #[test]
    fn test_compute_without_steps_is_empty() {
        let result = ResourcePlanResult::compute(&json!({"component": "aileron"}), &inventory());
        assert_eq!(result, ResourcePlanResult::default());
    }

    #[test]
    fn test_sample_inventory_loads() {
        let inventory = Inventory::sample().unwrap();
        assert!(!inventory.personnel.is_empty());
        assert!(!inventory.tools.is_empty());
        assert!(!inventory.parts.is_empty());
    }

    #[test]
    fn test_indexed_fields() {
        let p = part("PN-100", "Actuator seal kit");
        assert_eq!(p.indexed_fields().get("stock_level"), Some(&IndexValue::Int(3)));
        assert_eq!(Part::collection_name(), "parts");
    }
}
