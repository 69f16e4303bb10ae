//! Merge strategy statistics: shrinking quality, tiebreaking, merge order.

use crate::error::ParserError;
use crate::parser::Parser;
use crate::rule::FunctionRule;
use crate::scan::{find_all_captures, first_sentinel, Sentinel};
use crate::value::ValueType;
use regex::Regex;
use std::sync::LazyLock;

static COURSE_IMPERFECT_SHRINKING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Course of miss qualified states shrinking: \[(.*)\]").unwrap()
});
static COURSE_LABEL_REDUCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Course of label reduction: \[(.*)\]").unwrap());
static INIT_H_IMPROVEMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Init h value improvements: \[(.*)\]").unwrap());
static MERGE_ORDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Merge order: \[(.*)\]").unwrap());
static COURSE_PRUNING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Relative pruning per iteration: \[(.*)\]").unwrap());

const ONE_SCC: &str = "Only one single SCC";
const LINEAR_ORDER: &str = "Linear merge order";
const NON_LINEAR_ORDER: &str = "Non-linear merge order";

/// Rule that stores every bracketed payload of `pattern` as a raw list.
///
/// The key is always written; a log without the pattern yields an empty list.
fn course(key: &'static str, pattern: &'static LazyLock<Regex>) -> FunctionRule {
    FunctionRule::new(key, move |text, record| {
        record.insert(key, find_all_captures(text, pattern));
    })
    .writes([key])
}

/// Registry for the merge strategy log lines.
pub fn merge_strategies() -> Result<Parser, ParserError> {
    let mut p = Parser::new();
    p.add_pattern(
        "ms_avg_imperfect_shrinking",
        r"Average imperfect shrinking: (.+)",
        false,
        ValueType::Float,
    )?
    .add_pattern(
        "ms_not_exact_iteration",
        r"not perfect anymore in iteration (\d+)",
        false,
        ValueType::Int,
    )?
    .add_pattern(
        "ms_avg_pruning",
        r"Average relative pruning: (.+)",
        false,
        ValueType::Float,
    )?
    .add_pattern(
        "ms_tiebreaking_iterations",
        r"Iterations with merge tiebreaking: (\d+)",
        false,
        ValueType::Int,
    )?
    .add_pattern(
        "ms_tiebreaking_total",
        r"Total tiebreaking merge candidates: (\d+)",
        false,
        ValueType::Int,
    )?
    .add_pattern(
        "ms_max_int_abs_size",
        r"Maximum intermediate abstraction size: (\d+)",
        false,
        ValueType::Int,
    )?;

    p.add_function(course(
        "ms_course_imperfect_shrinking",
        &COURSE_IMPERFECT_SHRINKING,
    ))
    .add_function(course("ms_course_label_reduction", &COURSE_LABEL_REDUCTION))
    .add_function(course("ms_init_h_improvements", &INIT_H_IMPROVEMENTS));

    p.add_function(
        FunctionRule::new("ms_one_scc", |text, record| {
            let one_scc = first_sentinel(text, &[Sentinel::Exact(ONE_SCC)]).is_some();
            record.insert("ms_one_scc", one_scc);
        })
        .writes(["ms_one_scc"]),
    );

    // Tri-state: whichever order line comes first decides; neither leaves it unset.
    p.add_function(
        FunctionRule::new("ms_linear_order", |text, record| {
            let sentinels = [
                Sentinel::Exact(LINEAR_ORDER),
                Sentinel::Exact(NON_LINEAR_ORDER),
            ];
            if let Some(idx) = first_sentinel(text, &sentinels) {
                record.insert("ms_linear_order", idx == 0);
            }
        })
        .writes(["ms_linear_order"]),
    );

    p.add_function(course("ms_merge_order", &MERGE_ORDER))
        .add_function(course("ms_course_pruning", &COURSE_PRUNING));

    Ok(p)
}
