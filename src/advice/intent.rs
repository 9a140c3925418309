use crate::estimation::Category;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedActivity {
    pub activity_label: &'static str,
    pub category: Category,
    pub carbon_kg: f64,
}

struct IntentRule {
    keywords: &'static [&'static str],
    activity: DetectedActivity,
}

// Checked in order; the first rule with a matching keyword wins.
const INTENT_RULES: [IntentRule; 7] = [
    IntentRule {
        keywords: &["driving", "car"],
        activity: DetectedActivity {
            activity_label: "driving",
            category: Category::Transportation,
            carbon_kg: 15.0,
        },
    },
    IntentRule {
        keywords: &["flight", "flying"],
        activity: DetectedActivity {
            activity_label: "flying",
            category: Category::Transportation,
            carbon_kg: 200.0,
        },
    },
    IntentRule {
        keywords: &["bus", "train"],
        activity: DetectedActivity {
            activity_label: "public transport",
            category: Category::Transportation,
            carbon_kg: 3.0,
        },
    },
    IntentRule {
        keywords: &["beef", "meat"],
        activity: DetectedActivity {
            activity_label: "eating meat",
            category: Category::Food,
            carbon_kg: 12.0,
        },
    },
    IntentRule {
        keywords: &["vegetarian", "plant-based"],
        activity: DetectedActivity {
            activity_label: "plant-based meal",
            category: Category::Food,
            carbon_kg: 2.0,
        },
    },
    IntentRule {
        keywords: &["electricity", "energy"],
        activity: DetectedActivity {
            activity_label: "home energy use",
            category: Category::Energy,
            carbon_kg: 25.0,
        },
    },
    IntentRule {
        keywords: &["recycling"],
        activity: DetectedActivity {
            activity_label: "recycling",
            category: Category::Waste,
            carbon_kg: 1.0,
        },
    },
];

/// Maps a chat message to a representative activity by keyword.
pub fn detect_activity(message: &str) -> Option<DetectedActivity> {
    let lowered = message.to_lowercase();
    INTENT_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|rule| rule.activity)
}
