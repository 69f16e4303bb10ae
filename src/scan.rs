//! Line-scanning helpers shared by function rules.
//!
//! Function rules compose these instead of hand-unrolling break-on-first-match
//! loops, so each multi-occurrence policy lives in exactly one place.

use regex::Regex;

/// How a sentinel line is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel<'a> {
    /// The whole line equals the text.
    Exact(&'a str),
    /// The line contains the text anywhere.
    Contains(&'a str),
}

impl Sentinel<'_> {
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Sentinel::Exact(s) => line == *s,
            Sentinel::Contains(s) => line.contains(s),
        }
    }
}

/// First line, in document order, satisfying `predicate`.
pub fn find_first_matching_line<'t, F>(text: &'t str, predicate: F) -> Option<&'t str>
where
    F: Fn(&str) -> bool,
{
    text.lines().find(|line| predicate(line))
}

/// Last line, in document order, satisfying `predicate` (found by scanning backward).
pub fn find_last_matching_line<'t, F>(text: &'t str, predicate: F) -> Option<&'t str>
where
    F: Fn(&str) -> bool,
{
    text.lines().rev().find(|line| predicate(line))
}

/// Scan forward and return the index of the first sentinel any line matches.
///
/// Scanning stops at the first line matching any of `sentinels`; when one line
/// matches several, the earliest sentinel in the slice wins.
pub fn first_sentinel(text: &str, sentinels: &[Sentinel<'_>]) -> Option<usize> {
    let line = find_first_matching_line(text, |l| sentinels.iter().any(|s| s.matches(l)))?;
    sentinels.iter().position(|s| s.matches(line))
}

/// Capture group 1 of every non-overlapping match, in document order, as raw text.
pub fn find_all_captures(text: &str, pattern: &Regex) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "start\nvalue: 1\nmiddle\nvalue: 2\nend";

    #[test]
    fn first_and_last_matching_line() {
        let is_value = |l: &str| l.starts_with("value: ");
        assert_eq!(find_first_matching_line(LOG, is_value), Some("value: 1"));
        assert_eq!(find_last_matching_line(LOG, is_value), Some("value: 2"));
        assert_eq!(find_first_matching_line(LOG, |l| l == "absent"), None);
        assert_eq!(find_last_matching_line("", is_value), None);
    }

    #[test]
    fn lines_handle_crlf() {
        let text = "a\r\nOnly one single SCC\r\nb";
        assert_eq!(
            first_sentinel(text, &[Sentinel::Exact("Only one single SCC")]),
            Some(0)
        );
    }

    #[test]
    fn exact_sentinel_requires_whole_line() {
        let text = "prefix Only one single SCC";
        assert_eq!(first_sentinel(text, &[Sentinel::Exact("Only one single SCC")]), None);
        assert_eq!(
            first_sentinel(text, &[Sentinel::Contains("Only one single SCC")]),
            Some(0)
        );
    }

    #[test]
    fn first_sentinel_stops_at_earliest_line() {
        let text = "x\nNon-linear merge order\nLinear merge order\n";
        let sentinels = [
            Sentinel::Exact("Linear merge order"),
            Sentinel::Exact("Non-linear merge order"),
        ];
        assert_eq!(first_sentinel(text, &sentinels), Some(1));
    }

    #[test]
    fn earlier_sentinel_wins_on_shared_line() {
        let text = "Bliss timeout after Bliss memory out
";
        let sentinels = [
            Sentinel::Contains("Bliss memory out"),
            Sentinel::Contains("Bliss timeout"),
        ];
        assert_eq!(first_sentinel(text, &sentinels), Some(0));
        assert_eq!(first_sentinel("", &sentinels), None);
    }

    #[test]
    fn all_captures_in_document_order() {
        let re = Regex::new(r"Course: \[(.*)\]").unwrap();
        let text = "Course: [a, b]\nnoise\nCourse: []\nCourse: [c]";
        assert_eq!(find_all_captures(text, &re), vec!["a, b", "", "c"]);
        assert!(find_all_captures("nothing here", &re).is_empty());
    }
}
