use regex::Regex;
use std::num::ParseIntError;
use std::sync::OnceLock;

fn flat_re() -> &'static Regex {
    static FLAT_RE: OnceLock<Regex> = OnceLock::new();
    FLAT_RE.get_or_init(|| {
        Regex::new(r"^(dag|vertex|task|attempt)((?:_[0-9]+)+)$").expect("valid flat id regex")
    })
}

fn nested_re() -> &'static Regex {
    static NESTED_RE: OnceLock<Regex> = OnceLock::new();
    NESTED_RE.get_or_init(|| {
        // Greedy parent: the last `_<kind>_<n>` segment is the child.
        Regex::new(r"^(.+)_(vertex|task|attempt)_([0-9]+)$").expect("valid nested id regex")
    })
}

/// Split `<kind>_<n>_<n>...` into its numbers.
///
/// `None` when `s` is not in flat form for `kind`; `Some(Err)` when it is but
/// a component overflows.
pub(super) fn split_flat(s: &str, kind: &str) -> Option<Result<Vec<u64>, ParseIntError>> {
    let caps = flat_re().captures(s)?;
    if &caps[1] != kind {
        return None;
    }
    Some(
        caps[2]
            .split('_')
            .filter(|p| !p.is_empty())
            .map(str::parse::<u64>)
            .collect(),
    )
}

/// Split `<parent>_<kind>_<n>` into the parent text and the sequence number.
pub(super) fn split_nested<'a>(s: &'a str, kind: &str) -> Option<(&'a str, u64)> {
    let caps = nested_re().captures(s)?;
    if &caps[2] != kind {
        return None;
    }
    let parent = caps.get(1)?.as_str();
    let seq = caps[3].parse().ok()?;
    Some((parent, seq))
}
