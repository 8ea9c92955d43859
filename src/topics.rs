use crate::models::category::Category;

const FALLBACK_SEGMENT: &str = "unknown";

/// Topic for bulk category publication, e.g. `alerts/rainfall_floods`.
pub fn category_topic(category: Category) -> String {
    format!("alerts/{}", category.as_str())
}

/// Topic for per-sensor match publication, e.g. `rainfall/20001_0000_62963_01`.
/// Total: blank segments fall back to `unknown` so the result is never
/// empty or malformed.
pub fn sensor_topic(sensor_class: &str, sensor_id: &str) -> String {
    format!(
        "{}/{}",
        non_empty(sensor_class),
        non_empty(sensor_id)
    )
}

/// The sensor class is the first segment of the subscription topic the
/// telemetry arrived on (`rainfall/status` → `rainfall`).
pub fn class_from_topic(topic: &str) -> &str {
    let class = topic.split('/').next().unwrap_or(topic);
    if class.is_empty() {
        FALLBACK_SEGMENT
    } else {
        class
    }
}

fn non_empty(segment: &str) -> &str {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        FALLBACK_SEGMENT
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_topics() {
        assert_eq!(category_topic(Category::RainfallFloods), "alerts/rainfall_floods");
        assert_eq!(category_topic(Category::Other), "alerts/other");
    }

    #[test]
    fn sensor_topics() {
        assert_eq!(sensor_topic("rainfall", "20001_0000_62963_01"), "rainfall/20001_0000_62963_01");
    }

    #[test]
    fn sensor_topic_never_returns_empty_segments() {
        assert_eq!(sensor_topic("", "s-1"), "unknown/s-1");
        assert_eq!(sensor_topic("rainfall", "  "), "rainfall/unknown");
    }

    #[test]
    fn class_from_topic_takes_first_segment() {
        assert_eq!(class_from_topic("rainfall/status"), "rainfall");
        assert_eq!(class_from_topic("seismic"), "seismic");
        assert_eq!(class_from_topic("/status"), "unknown");
    }
}
