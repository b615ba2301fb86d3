use std::collections::BTreeMap;

/// Monotonic event counters for one dashboard component.
///
/// Sorted storage keeps snapshots stable for logs and assertions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Counters {
    counts: BTreeMap<&'static str, u64>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn incr(&mut self, name: &'static str) {
        *self.counts.entry(name).or_insert(0) += 1;
    }

    /// `(name, count)` pairs in name order.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        self.counts.iter().map(|(k, v)| (*k, *v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Counters;

    #[test]
    fn counters_accumulate_and_sort() {
        let mut c = Counters::new();
        c.incr("b");
        c.incr("a");
        c.incr("b");
        assert_eq!(c.get("b"), 2);
        assert_eq!(c.get("missing"), 0);
        assert_eq!(c.snapshot(), vec![("a", 1), ("b", 2)]);
    }
}
