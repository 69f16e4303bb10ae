//! Symmetry statistics: bliss usage, applied symmetries, merging for symmetries.

use crate::derived::{RatioPolicy, SuccessRatios};
use crate::error::ParserError;
use crate::parser::Parser;
use crate::record::ExtractionFailure;
use crate::rule::FunctionRule;
use crate::scan::{find_last_matching_line, first_sentinel, Sentinel};
use crate::value::ValueType;
use regex::Regex;
use std::sync::LazyLock;

const APPLIED_SYMMETRIES_PREFIX: &str = "Number of applied symmetries: ";

static APPLIED_SYMMETRIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Number of applied symmetries: (\d+)").unwrap());

const BLISS_MEMORY_OUT: &str = "Bliss memory out";
const BLISS_TIMEOUT: &str = "Bliss timeout";
const NOT_PURE_FALLBACK: &str = "not pure fallback strategy anymore";

const ATTEMPTS: &str = "merging_for_symmetries_attempts";
const FAIL_SHRINKING: &str = "merging_for_symmetries_fail_shrinking";
const FAIL_PRUNING: &str = "merging_for_symmetries_fail_pruning";
const FAIL_ANY: &str = "merging_for_symmetries_fail_any";

/// Registry for the symmetry log lines.
pub fn symmetries(policy: RatioPolicy) -> Result<Parser, ParserError> {
    let mut p = Parser::new();
    p.add_pattern(
        "bliss_time_average",
        r"Average bliss time: (.+)",
        false,
        ValueType::Float,
    )?
    .add_pattern(
        "bliss_time_median",
        r"Median bliss time: (.+)",
        false,
        ValueType::Float,
    )?
    .add_pattern(
        "bliss_total_calls",
        r"Total bliss calls: (\d+)",
        false,
        ValueType::Int,
    )?
    .add_pattern(
        ATTEMPTS,
        r"Number of attempts to merge for symmetries: (\d+)",
        false,
        ValueType::Int,
    )?
    .add_pattern(
        FAIL_SHRINKING,
        r"Number of times non-perfect shrinking interfered merging for symmetries: (\d+)",
        false,
        ValueType::Int,
    )?
    .add_pattern(
        FAIL_PRUNING,
        r"Number of times pruning interfered merging for symmetries: (\d+)",
        false,
        ValueType::Int,
    )?
    .add_pattern(
        FAIL_ANY,
        r"Number of times merging for symmetries failed for any reason: (\d+)",
        false,
        ValueType::Int,
    )?;

    // Printed once per iteration; only the final count matters. Kept as text.
    p.add_function(
        FunctionRule::new("number_of_applied_symmetries", |text, record| {
            let key = "number_of_applied_symmetries";
            let Some(line) =
                find_last_matching_line(text, |l| l.starts_with(APPLIED_SYMMETRIES_PREFIX))
            else {
                record.insert(key, "0");
                return;
            };
            match APPLIED_SYMMETRIES.captures(line).and_then(|c| c.get(1)) {
                Some(count) => {
                    record.insert(key, count.as_str());
                }
                None => {
                    tracing::warn!(attribute = key, line, "malformed applied symmetries line");
                    record.record_failure(ExtractionFailure::Coercion {
                        attribute: key.to_string(),
                        raw: line.to_string(),
                        expected: ValueType::Int,
                    });
                }
            }
        })
        .writes(["number_of_applied_symmetries"]),
    );

    // One shared scan: the first line mentioning either limit settles both flags.
    p.add_function(
        FunctionRule::new("bliss_limits", |text, record| {
            let hit = first_sentinel(
                text,
                &[
                    Sentinel::Contains(BLISS_MEMORY_OUT),
                    Sentinel::Contains(BLISS_TIMEOUT),
                ],
            );
            record.insert("bliss_memory_out", hit == Some(0));
            record.insert("bliss_timeout", hit == Some(1));
        })
        .writes(["bliss_memory_out", "bliss_timeout"]),
    );

    // Defaults to true; only explicit evidence flips it.
    p.add_function(
        FunctionRule::new("fallback_only", |text, record| {
            let left_fallback =
                first_sentinel(text, &[Sentinel::Contains(NOT_PURE_FALLBACK)]).is_some();
            record.insert("fallback_only", !left_fallback);
        })
        .writes(["fallback_only"]),
    );

    p.add_function(
        SuccessRatios::new("merging_for_symmetries_success_ratios", ATTEMPTS)
            .kind(FAIL_SHRINKING, "merging_for_symmetries_success_ratio_shrinking")
            .kind(FAIL_PRUNING, "merging_for_symmetries_success_ratio_pruning")
            .kind(FAIL_ANY, "merging_for_symmetries_success_ratio_any")
            .policy(policy)
            .into_rule(),
    );

    Ok(p)
}
