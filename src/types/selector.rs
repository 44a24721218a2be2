// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::collections::BTreeMap;
use std::fmt;

/// Exact-match label requirements, all of which must hold (AND semantics)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSelector(BTreeMap<String, String>);

impl LabelSelector {
    pub fn new(requirements: BTreeMap<String, String>) -> Self {
        Self(requirements)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Renders as a kube `labelSelector` query, e.g. `app=grafana,tier=web`
impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}={}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSelector {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_sorted_and_comma_separated() {
        let selector: LabelSelector = [("tier", "web"), ("app", "grafana")].into_iter().collect();
        assert_eq!(selector.to_string(), "app=grafana,tier=web");
    }

    #[test]
    fn test_empty_selector() {
        let selector = LabelSelector::default();
        assert!(selector.is_empty());
        assert_eq!(selector.to_string(), "");
    }
}
