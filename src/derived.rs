//! Derived metrics computed from counters already in the record.

use crate::record::PropertyRecord;
use crate::rule::FunctionRule;
use serde::{Deserialize, Serialize};

/// What to do with ratios that fall outside [0, 1].
///
/// A failure counter larger than the attempt counter makes `1 - f/a`
/// negative. `Unclamped` keeps that value as computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioPolicy {
    #[default]
    Unclamped,
    Clamped,
}

impl RatioPolicy {
    fn apply(self, ratio: f64) -> f64 {
        match self {
            RatioPolicy::Unclamped => ratio,
            RatioPolicy::Clamped => ratio.clamp(0.0, 1.0),
        }
    }
}

/// Success ratio of a mechanism given its attempt and failure counts.
///
/// A mechanism never attempted counts as fully successful (`1.0`).
pub fn success_ratio(attempts: f64, failures: f64, policy: RatioPolicy) -> f64 {
    if attempts <= 0.0 {
        return 1.0;
    }
    policy.apply(1.0 - failures / attempts)
}

/// Success ratios for several failure kinds sharing one attempts counter.
#[derive(Debug, Clone)]
pub struct SuccessRatios {
    name: String,
    attempts: String,
    /// (failure counter key, ratio output key)
    kinds: Vec<(String, String)>,
    policy: RatioPolicy,
}

impl SuccessRatios {
    pub fn new(name: impl Into<String>, attempts: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attempts: attempts.into(),
            kinds: Vec::new(),
            policy: RatioPolicy::default(),
        }
    }

    /// Add a failure kind: ratio `output` is derived from counter `failures`.
    pub fn kind(mut self, failures: impl Into<String>, output: impl Into<String>) -> Self {
        self.kinds.push((failures.into(), output.into()));
        self
    }

    pub fn policy(mut self, policy: RatioPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Turn into a function rule declaring every counter it reads and ratio it writes.
    pub fn into_rule(self) -> FunctionRule {
        let reads: Vec<String> = std::iter::once(self.attempts.clone())
            .chain(self.kinds.iter().map(|(failures, _)| failures.clone()))
            .collect();
        let writes: Vec<String> = self.kinds.iter().map(|(_, out)| out.clone()).collect();
        let name = self.name.clone();

        FunctionRule::new(name, move |_, record| self.compute(record))
            .reads(reads)
            .writes(writes)
    }

    fn compute(&self, record: &mut PropertyRecord) {
        let attempts = record.float_or(&self.attempts, 0.0);
        for (failures, output) in &self.kinds {
            let failed = record.float_or(failures, 0.0);
            let ratio = success_ratio(attempts, failed, self.policy);
            if !(0.0..=1.0).contains(&ratio) {
                tracing::debug!(
                    attribute = %output,
                    attempts,
                    failed,
                    ratio,
                    "success ratio outside [0, 1]"
                );
            }
            record.insert(output.clone(), ratio);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::PropertyValue;

    #[yare::parameterized(
        never_attempted     = { 0.0,  0.0, RatioPolicy::Unclamped, 1.0 },
        never_attempted_bad = { 0.0,  5.0, RatioPolicy::Unclamped, 1.0 },
        all_succeeded       = { 4.0,  0.0, RatioPolicy::Unclamped, 1.0 },
        all_failed          = { 4.0,  4.0, RatioPolicy::Unclamped, 0.0 },
        half                = { 4.0,  2.0, RatioPolicy::Unclamped, 0.5 },
        overflow_unclamped  = { 2.0,  3.0, RatioPolicy::Unclamped, -0.5 },
        overflow_clamped    = { 2.0,  3.0, RatioPolicy::Clamped,   0.0 },
    )]
    fn ratio(attempts: f64, failures: f64, policy: RatioPolicy, expected: f64) {
        assert_eq!(success_ratio(attempts, failures, policy), expected);
    }

    fn rule(policy: RatioPolicy) -> FunctionRule {
        SuccessRatios::new("ratios", "attempts")
            .kind("fail_a", "ratio_a")
            .kind("fail_b", "ratio_b")
            .policy(policy)
            .into_rule()
    }

    #[test]
    fn absent_counters_yield_one() {
        let mut r = PropertyRecord::new();
        rule(RatioPolicy::Unclamped).apply("", &mut r);
        assert_eq!(r.get("ratio_a"), Some(&PropertyValue::Float(1.0)));
        assert_eq!(r.get("ratio_b"), Some(&PropertyValue::Float(1.0)));
    }

    #[test]
    fn reads_integer_counters() {
        let mut r = PropertyRecord::new();
        r.insert("attempts", 10i64);
        r.insert("fail_a", 3i64);
        rule(RatioPolicy::Unclamped).apply("", &mut r);
        assert!((r.float_or("ratio_a", f64::NAN) - 0.7).abs() < 1e-12);
        assert_eq!(r.float_or("ratio_b", f64::NAN), 1.0);
    }

    #[test]
    fn clamped_policy_bounds_ratio() {
        let mut r = PropertyRecord::new();
        r.insert("attempts", 1i64);
        r.insert("fail_a", 3i64);
        rule(RatioPolicy::Clamped).apply("", &mut r);
        assert_eq!(r.float_or("ratio_a", f64::NAN), 0.0);

        let mut r2 = PropertyRecord::new();
        r2.insert("attempts", 1i64);
        r2.insert("fail_a", 3i64);
        rule(RatioPolicy::Unclamped).apply("", &mut r2);
        assert_eq!(r2.float_or("ratio_a", f64::NAN), -2.0);
    }

    #[test]
    fn declares_reads_and_writes() {
        let r = crate::rule::Rule::Function(rule(RatioPolicy::Unclamped));
        assert_eq!(r.reads(), ["attempts", "fail_a", "fail_b"].map(String::from));
        assert_eq!(r.writes(), ["ratio_a", "ratio_b"].map(String::from));
    }
}
