use serde::Serialize;

/// Records recovered from a line-oriented tool output, plus the number of
/// non-blank lines that could not be parsed and were dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Parsed<T> {
    pub records: T,
    pub skipped: usize,
}

impl<T> Parsed<T> {
    pub fn new(records: T, skipped: usize) -> Self {
        Self { records, skipped }
    }

    pub fn into_records(self) -> T {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_outlive_the_skip_count() {
        let parsed = Parsed::new(vec!["a", "b"], 3);
        assert_eq!(parsed.skipped, 3);
        assert_eq!(parsed.into_records(), vec!["a", "b"]);
    }
}
