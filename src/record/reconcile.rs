//! Column reconciliation for rows collected from pages with differing fields.

use super::{Record, RecordSet, Scalar};

impl RecordSet {
    /// Builds a set from rows whose key sets may differ.
    ///
    /// The schema is the union of all column names in first-seen order
    /// (record order, then field order within a record). Each record is
    /// padded with [`Scalar::Missing`] for the columns it lacks and its
    /// fields are reordered to the schema. Record order is preserved.
    #[must_use]
    pub fn reconcile(rows: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &rows {
            for column in record.columns() {
                if !columns.iter().any(|c| c == column) {
                    columns.push(column.to_string());
                }
            }
        }

        let records = rows
            .into_iter()
            .map(|mut record| {
                for column in &columns {
                    if !record.contains(column) {
                        record.insert(column, Scalar::Missing);
                    }
                }
                record.align_to(&columns);
                record
            })
            .collect();

        Self { columns, records }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rec(pairs: &[(&str, i64)]) -> Record {
        pairs.iter().fold(Record::new(), |r, (k, v)| {
            r.with(k, Scalar::Integer(*v))
        })
    }

    #[test]
    fn test_reconcile_pads_disjoint_columns() {
        let page_one = vec![rec(&[("a", 1), ("b", 2)])];
        let page_two = vec![rec(&[("b", 3), ("c", 4)])];
        let rows: Vec<Record> = page_one.into_iter().chain(page_two).collect();

        let set = RecordSet::reconcile(rows);
        assert_eq!(set.columns(), &["a", "b", "c"]);
        for record in &set {
            let cols: Vec<_> = record.columns().collect();
            assert_eq!(cols, vec!["a", "b", "c"]);
        }
        assert_eq!(set.records()[0].get("c"), Some(&Scalar::Missing));
        assert_eq!(set.records()[1].get("a"), Some(&Scalar::Missing));
        assert_eq!(set.records()[1].get("b"), Some(&Scalar::Integer(3)));
    }

    #[test]
    fn test_reconcile_uses_first_seen_order() {
        let rows = vec![rec(&[("z", 1)]), rec(&[("a", 2), ("z", 3)])];
        let set = RecordSet::reconcile(rows);
        assert_eq!(set.columns(), &["z", "a"]);
        let cols: Vec<_> = set.records()[1].columns().collect();
        assert_eq!(cols, vec!["z", "a"]);
    }

    #[test]
    fn test_reconcile_empty_input() {
        let set = RecordSet::reconcile(Vec::new());
        assert!(set.is_empty());
        assert!(set.columns().is_empty());
    }

    #[test]
    fn test_reconciled_set_accepts_push_with_same_schema() {
        let mut set = RecordSet::reconcile(vec![rec(&[("a", 1)])]);
        set.push(rec(&[("a", 5)])).unwrap();
        assert_eq!(set.len(), 2);
    }
}
