use nu_ansi_term::Color::{Blue, Cyan, Green};
use tracing::{info, warn};
use webfeat_manifest::WebFeaturesData;

use crate::{cli::ReportArgs, utils::Colored};

pub fn report(data: &WebFeaturesData, args: &ReportArgs) {
    if let Some(feature) = &args.feature {
        report_feature(data, feature);
    }

    if let Some(test) = &args.test {
        report_test(data, test);
    }

    if args.feature.is_none() && args.test.is_none() {
        info!(
            features = data.len(),
            tests = data.test_count(),
            "Loaded {} features covering {} feature/test pairs",
            Colored(Blue, data.len()),
            Colored(Blue, data.test_count())
        );
    }
}

fn report_feature(data: &WebFeaturesData, feature: &str) {
    let Some(tests) = data.get(feature) else {
        warn!("Feature {} not found in manifest", feature);
        return;
    };

    let mut tests: Vec<&str> = tests.iter().map(String::as_str).collect();
    tests.sort_unstable();

    for test in &tests {
        info!(feature, test, "{}", Colored(Green, test));
    }
    info!(
        feature,
        count = tests.len(),
        "{} has {} tests",
        Colored(Cyan, feature),
        tests.len()
    );
}

fn report_test(data: &WebFeaturesData, test: &str) {
    let features = data.features_for_test(test);
    if features.is_empty() {
        warn!("No features list {}", test);
        return;
    }

    for feature in features {
        info!(test, feature, "{}", Colored(Cyan, feature));
    }
}
