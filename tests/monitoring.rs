// ABOUTME: Checks the shipped Prometheus scrape and alert configuration.
// ABOUTME: Parses the YAML and asserts the scrape targets and alert thresholds.

use std::path::PathBuf;

use serde_yaml::Value;

fn load(name: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("monitoring")
        .join(name);
    let content = std::fs::read_to_string(&path).unwrap();
    serde_yaml::from_str(&content).unwrap()
}

fn rule<'a>(rules: &'a [Value], alert: &str) -> &'a Value {
    rules
        .iter()
        .find(|r| r["alert"].as_str() == Some(alert))
        .unwrap_or_else(|| panic!("missing alert {alert}"))
}

#[test]
fn scrapes_service_and_cache() {
    let config = load("prometheus.yml");
    let targets: Vec<&str> = config["scrape_configs"]
        .as_sequence()
        .unwrap()
        .iter()
        .flat_map(|job| job["static_configs"].as_sequence().unwrap())
        .flat_map(|sc| sc["targets"].as_sequence().unwrap())
        .filter_map(Value::as_str)
        .collect();
    assert!(targets.iter().any(|t| t.ends_with(":9090")));
    assert!(targets.iter().any(|t| t.ends_with(":6379")));
}

#[test]
fn alert_thresholds() {
    let config = load("alert_rules.yml");
    let rules = config["groups"][0]["rules"].as_sequence().unwrap();

    let cases = [
        ("HighMemoryUsage", "> 1610612736", "5m"),
        ("HighCpuUsage", "> 80", "5m"),
        ("ServiceDown", "== 0", "1m"),
        ("HighErrorRate", "> 0.1", "5m"),
        ("ApiQuotaNearLimit", "> 0.8", "5m"),
        ("LowDiskSpace", "< 1073741824", "5m"),
    ];
    for (alert, threshold, duration) in cases {
        let r = rule(rules, alert);
        assert!(
            r["expr"].as_str().unwrap().contains(threshold),
            "{alert} expr should contain {threshold}"
        );
        assert_eq!(r["for"].as_str(), Some(duration), "{alert}");
    }
}
