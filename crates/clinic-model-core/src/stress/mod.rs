pub mod scenarios;

pub use scenarios::{
    analyze_stress, run_stress_scenarios, StressResult, StressScenario, StressSummary,
    StressTestOutput,
};
