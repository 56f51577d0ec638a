//! Name-collision policy for attaching subtrees.

use std::collections::HashSet;

/// What to do when an attached subtree brings a name already used in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingPolicy {
    /// Rename the incoming module to the first free `base`, `base_1`, `base_2`, ...
    #[default]
    Rename,
    /// Fail with a duplicate-name error.
    Reject,
}

/// First name in `base`, `base_1`, `base_2`, ... that is not in `taken`.
///
/// The result depends only on `base` and `taken`.
pub fn unique_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut suffix = 1usize;
    loop {
        let candidate = format!("{}_{}", base, suffix);
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
