use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical alert categories used for topic routing.
///
/// The variant order below is the categorization precedence order: the
/// keyword rules in `RULES` are evaluated top to bottom and the first match
/// wins. Keyword sets overlap (e.g. "cold" vs other terms), so reordering
/// changes observable output; treat any reorder as a behavior change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Earthquake,
    Tsunami,
    Landslide,
    Avalanche,
    WeatherCyclone,
    RainfallFloods,
    ThunderstormLightning,
    Hailstorm,
    CloudBurst,
    FrostColdWave,
    Drought,
    PreFire,
    PestAttack,
    HeatWave,
    DustStorm,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Earthquake => "earthquake",
            Category::Tsunami => "tsunami",
            Category::Landslide => "landslide",
            Category::Avalanche => "avalanche",
            Category::WeatherCyclone => "weather_cyclone",
            Category::RainfallFloods => "rainfall_floods",
            Category::ThunderstormLightning => "thunderstorm_lightning",
            Category::Hailstorm => "hailstorm",
            Category::CloudBurst => "cloud_burst",
            Category::FrostColdWave => "frost_cold_wave",
            Category::Drought => "drought",
            Category::PreFire => "pre_fire",
            Category::PestAttack => "pest_attack",
            Category::HeatWave => "heat_wave",
            Category::DustStorm => "dust_storm",
            Category::Other => "other",
        }
    }

}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Rule {
    category: Category,
    /// English keywords, matched against the disaster type label.
    type_keywords: &'static [&'static str],
    /// Hindi keywords, matched against the free-text warning message.
    message_keywords: &'static [&'static str],
}

static RULES: &[Rule] = &[
    Rule {
        category: Category::Earthquake,
        type_keywords: &["earthquake"],
        message_keywords: &["भूकंप"],
    },
    Rule {
        category: Category::Tsunami,
        type_keywords: &["tsunami"],
        message_keywords: &["सुनामी"],
    },
    Rule {
        category: Category::Landslide,
        type_keywords: &["landslide", "land slide"],
        message_keywords: &["भूस्खलन"],
    },
    Rule {
        category: Category::Avalanche,
        type_keywords: &["avalanche"],
        message_keywords: &["हिमस्खलन"],
    },
    Rule {
        category: Category::WeatherCyclone,
        type_keywords: &["cyclone", "cyclonic"],
        message_keywords: &["चक्रवात"],
    },
    Rule {
        category: Category::RainfallFloods,
        type_keywords: &["rainfall", "rain", "flood", "heavy rain", "extremely heavy rain"],
        message_keywords: &["बाढ़", "बारिश", "वर्षा"],
    },
    Rule {
        category: Category::ThunderstormLightning,
        type_keywords: &["thunderstorm", "thunder storm", "lightning", "thunder"],
        message_keywords: &["आंधी", "तड़ित", "बिजली", "गरज"],
    },
    Rule {
        category: Category::Hailstorm,
        type_keywords: &["hail"],
        message_keywords: &["ओला", "ओलावृष्टि"],
    },
    Rule {
        category: Category::CloudBurst,
        type_keywords: &["cloudburst", "cloud burst"],
        message_keywords: &["बादल फटना"],
    },
    Rule {
        category: Category::FrostColdWave,
        type_keywords: &["frost", "cold wave", "coldwave", "cold", "freeze"],
        message_keywords: &["शीत लहर", "पाला", "ठंड"],
    },
    Rule {
        category: Category::Drought,
        type_keywords: &["drought"],
        message_keywords: &["सूखा"],
    },
    Rule {
        category: Category::PreFire,
        // The upstream feed labels forest-fire advisories inconsistently,
        // including an English phrase inside the Hindi message text.
        type_keywords: &["pre fire", "pre-fire", "fire", "forest fire"],
        message_keywords: &["जंगल में आग", "आग", "forest fire"],
    },
    Rule {
        category: Category::PestAttack,
        type_keywords: &["pest"],
        message_keywords: &["कीट"],
    },
    Rule {
        category: Category::HeatWave,
        type_keywords: &["heat", "hot"],
        message_keywords: &["गर्मी की लहर"],
    },
    Rule {
        category: Category::DustStorm,
        type_keywords: &["dust"],
        message_keywords: &["धूल"],
    },
];

/// Classify a disaster type label plus warning message into a category.
///
/// Pure and total: no I/O, never fails, always returns a variant. An empty
/// disaster type short-circuits to `Other` regardless of message content.
pub fn categorize(disaster_type: &str, warning_message: &str) -> Category {
    if disaster_type.trim().is_empty() {
        return Category::Other;
    }

    let type_lower = disaster_type.to_lowercase();
    let message_lower = warning_message.to_lowercase();

    for rule in RULES {
        let type_hit = rule.type_keywords.iter().any(|k| type_lower.contains(k));
        let message_hit = !message_lower.is_empty()
            && rule.message_keywords.iter().any(|k| message_lower.contains(k));
        if type_hit || message_hit {
            return rule.category;
        }
    }

    Category::Other
}

/// Alert categories a sensor class is interested in.
///
/// `None` means no filter: the `all` class and any class we do not
/// recognize receive every category. Unknown device types must never be
/// silently excluded from alerting.
pub fn interest_for_class(sensor_class: &str) -> Option<&'static [Category]> {
    match sensor_class {
        "rainfall" => Some(&[Category::RainfallFloods, Category::CloudBurst]),
        "temperature" => Some(&[Category::FrostColdWave, Category::HeatWave]),
        "wind" => Some(&[Category::WeatherCyclone, Category::ThunderstormLightning]),
        "seismic" => Some(&[Category::Earthquake, Category::Tsunami]),
        "soil" => Some(&[Category::Landslide, Category::Avalanche]),
        "humidity" => Some(&[Category::Drought]),
        "fire" => Some(&[Category::PreFire]),
        "agriculture" => Some(&[Category::PestAttack]),
        "all" => None,
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_disaster_type_is_other() {
        assert_eq!(categorize("", "भूकंप detected near the coast"), Category::Other);
        assert_eq!(categorize("   ", "heavy rain"), Category::Other);
    }

    #[test]
    fn earthquake_wins_over_rainfall() {
        // Both keyword sets hit; precedence decides.
        assert_eq!(
            categorize("Earthquake and Heavy Rainfall", "flooding expected"),
            Category::Earthquake
        );
    }

    #[test]
    fn hindi_message_keyword_triggers() {
        assert_eq!(
            categorize("Advisory", "निचले इलाकों में बाढ़ की चेतावनी"),
            Category::RainfallFloods
        );
    }

    #[test]
    fn case_insensitive_type_match() {
        assert_eq!(categorize("CYCLONIC Storm", ""), Category::WeatherCyclone);
        assert_eq!(categorize("cloud burst", ""), Category::CloudBurst);
        assert_eq!(categorize("Cold Wave", ""), Category::FrostColdWave);
    }

    #[test]
    fn unmatched_type_is_other() {
        assert_eq!(categorize("Volcano", "ash plume"), Category::Other);
    }

    #[test]
    fn categorize_is_total_over_odd_input() {
        // Totality probe: nothing here should panic.
        for dt in ["", "🌪", "Heat", "pre-fire", "DUST storm", "\u{0}"] {
            for msg in ["", "ओलावृष्टि", "Magnitude: x", "\u{0}"] {
                let _ = categorize(dt, msg);
            }
        }
    }

    #[test]
    fn tags_serialize_to_their_snake_case_names() {
        assert_eq!(
            serde_json::to_value(Category::RainfallFloods).unwrap(),
            serde_json::json!("rainfall_floods")
        );
        assert_eq!(
            serde_json::to_value(Category::Other).unwrap(),
            serde_json::json!("other")
        );
    }

    #[test]
    fn interest_map_known_classes() {
        assert_eq!(
            interest_for_class("rainfall"),
            Some(&[Category::RainfallFloods, Category::CloudBurst][..])
        );
        assert_eq!(
            interest_for_class("seismic"),
            Some(&[Category::Earthquake, Category::Tsunami][..])
        );
    }

    #[test]
    fn wildcard_and_unknown_classes_have_no_filter() {
        assert_eq!(interest_for_class("all"), None);
        assert_eq!(interest_for_class("unknown-device"), None);
    }
}
