// Biomarker module
// Draggable biomarker readings, the fixed category set and static legend labels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Clinical measurement categories that can be dropped onto the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiomarkerCategory {
    Hba1c,
    Microalbumin,
    Glucose,
    Systolic,
    Diastolic,
}

impl BiomarkerCategory {
    /// All categories in week-cell display order.
    pub const ALL: [BiomarkerCategory; 5] = [
        BiomarkerCategory::Hba1c,
        BiomarkerCategory::Microalbumin,
        BiomarkerCategory::Glucose,
        BiomarkerCategory::Systolic,
        BiomarkerCategory::Diastolic,
    ];

    /// Wire label used on the drag transfer channel and in visit reasons.
    pub fn as_str(&self) -> &'static str {
        match self {
            BiomarkerCategory::Hba1c => "hba1c",
            BiomarkerCategory::Microalbumin => "microalbumin",
            BiomarkerCategory::Glucose => "glucose",
            BiomarkerCategory::Systolic => "systolic",
            BiomarkerCategory::Diastolic => "diastolic",
        }
    }

    /// Short label for the per-week summary cells.
    pub fn short_label(&self) -> &'static str {
        match self {
            BiomarkerCategory::Hba1c => "A1C",
            BiomarkerCategory::Microalbumin => "MB",
            BiomarkerCategory::Glucose => "G",
            BiomarkerCategory::Systolic => "Sys",
            BiomarkerCategory::Diastolic => "Dia",
        }
    }
}

impl fmt::Display for BiomarkerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BiomarkerCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BiomarkerCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("Unknown biomarker category: {}", s))
    }
}

/// A biomarker value carried by a single drag gesture. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BiomarkerPayload {
    pub value: f64,
    pub category: BiomarkerCategory,
}

impl BiomarkerPayload {
    /// Create a payload, rejecting values that cannot travel as JSON numbers.
    pub fn new(value: f64, category: BiomarkerCategory) -> Result<Self, String> {
        if !value.is_finite() {
            return Err("Biomarker value must be a finite number".to_string());
        }
        Ok(Self { value, category })
    }

    /// Text stored as the visit reason, e.g. `systolic value 120`.
    pub fn reason(&self) -> String {
        format!("{} value {}", self.category, format_value(self.value))
    }
}

/// Format a reading without a trailing `.0` for whole numbers.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Static legend swatches shown next to the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LegendTone {
    InRange,
    Caution,
    NotRecorded,
}

impl LegendTone {
    pub const ALL: [LegendTone; 3] = [LegendTone::InRange, LegendTone::Caution, LegendTone::NotRecorded];

    pub fn label(&self) -> &'static str {
        match self {
            LegendTone::InRange => "In-range",
            LegendTone::Caution => "Caution",
            LegendTone::NotRecorded => "Not recorded",
        }
    }
}

/// A draggable chip in the biomarker palette.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaletteChip {
    pub label: String,
    pub title: String,
    pub payload: BiomarkerPayload,
    pub tone: LegendTone,
}

/// The chips offered by default: two blood pressure readings and one A1C reading.
pub fn default_palette() -> Vec<PaletteChip> {
    vec![
        PaletteChip {
            label: "<90".to_string(),
            title: "< 90".to_string(),
            payload: BiomarkerPayload {
                value: 90.0,
                category: BiomarkerCategory::Systolic,
            },
            tone: LegendTone::Caution,
        },
        PaletteChip {
            label: "<120".to_string(),
            title: "< 120".to_string(),
            payload: BiomarkerPayload {
                value: 120.0,
                category: BiomarkerCategory::Systolic,
            },
            tone: LegendTone::InRange,
        },
        PaletteChip {
            label: "3.0".to_string(),
            title: "A1C 3.0".to_string(),
            payload: BiomarkerPayload {
                value: 3.0,
                category: BiomarkerCategory::Hba1c,
            },
            tone: LegendTone::Caution,
        },
    ]
}

/// Display band for an A1C percentage in the results list.
///
/// These are badge labels only; the engine does not interpret readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum A1cLevel {
    Normal,
    PreDiabetes,
    High,
}

impl A1cLevel {
    pub fn for_value(value: f64) -> Self {
        if value < 5.7 {
            A1cLevel::Normal
        } else if value < 6.5 {
            A1cLevel::PreDiabetes
        } else {
            A1cLevel::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            A1cLevel::Normal => "Normal",
            A1cLevel::PreDiabetes => "Pre-diabetes",
            A1cLevel::High => "High",
        }
    }
}
