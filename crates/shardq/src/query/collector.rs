use crate::{
    error::Error,
    query::expr::{OrderDirection, Projection, SortOrder},
    row::Row,
    value::{Value, canonical_cmp},
};
use std::cmp::Ordering;

///
/// ExitCollector
///
/// Central record of the operations that are only correctness-preserving
/// when applied to the merged result set: global projection (possibly
/// average-rewritten), the sort sequence, row offset, and row limit.
/// Owned by one federated handle, shared with its sub-queries, applied
/// exactly once per execution.
///

#[derive(Debug, Default)]
pub struct ExitCollector {
    projection: Option<Projection>,
    orders: Vec<SortOrder>,
    first_result: Option<u32>,
    max_results: Option<u32>,
}

impl ExitCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            projection: None,
            orders: Vec::new(),
            first_result: None,
            max_results: None,
        }
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = Some(projection);
    }

    pub fn add_order(&mut self, order: SortOrder) {
        self.orders.push(order);
    }

    pub const fn set_first_result(&mut self, offset: u32) {
        self.first_result = Some(offset);
    }

    pub const fn set_max_results(&mut self, limit: u32) {
        self.max_results = Some(limit);
    }

    #[must_use]
    pub const fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    #[must_use]
    pub fn orders(&self) -> &[SortOrder] {
        &self.orders
    }

    /// Apply the recorded operations to the merged row set, in fixed
    /// order: projection, then ordering, then offset, then limit.
    pub fn apply(&self, rows: Vec<Row>) -> Result<Vec<Row>, Error> {
        let rows = self.apply_projection(rows)?;
        let rows = self.apply_order(rows);

        Ok(self.apply_window(rows))
    }

    fn apply_projection(&self, rows: Vec<Row>) -> Result<Vec<Row>, Error> {
        let Some(projection) = &self.projection else {
            return Ok(rows);
        };

        match projection {
            Projection::Field(field) => Ok(project_field(rows, field)),
            Projection::RowCount => Ok(vec![row_count(&rows)]),
            Projection::Sum(field) => Ok(vec![sum_field(&rows, field)?]),
            Projection::Average(field) => Ok(vec![weighted_average(&rows, field)?]),
            Projection::List(items) => project_list(rows, items),
        }
    }

    fn apply_order(&self, mut rows: Vec<Row>) -> Vec<Row> {
        if self.orders.is_empty() {
            return rows;
        }

        rows.sort_by(|a, b| {
            for order in &self.orders {
                let left = a.get(&order.field).unwrap_or(&Value::Null);
                let right = b.get(&order.field).unwrap_or(&Value::Null);

                let cmp = match order.direction {
                    OrderDirection::Asc => canonical_cmp(left, right),
                    OrderDirection::Desc => canonical_cmp(right, left),
                };
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }

            Ordering::Equal
        });

        rows
    }

    fn apply_window(&self, rows: Vec<Row>) -> Vec<Row> {
        let offset = self
            .first_result
            .map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX));
        let iter = rows.into_iter().skip(offset);

        match self.max_results {
            Some(limit) => iter
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect(),
            None => iter.collect(),
        }
    }
}

fn project_field(rows: Vec<Row>, field: &str) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            let value = row.get(field).cloned().unwrap_or(Value::Null);

            Row::new().col(field, value)
        })
        .collect()
}

fn row_count(rows: &[Row]) -> Row {
    let count = i64::try_from(rows.len()).unwrap_or(i64::MAX);

    Row::new().col("row_count", count)
}

fn sum_field(rows: &[Row], field: &str) -> Result<Row, Error> {
    let mut int_sum = 0_i64;
    let mut float_sum = 0_f64;
    let mut any_float = false;
    let mut any = false;

    for row in rows {
        match row.get(field) {
            None | Some(Value::Null) => {}
            Some(Value::Int(v)) => {
                any = true;
                int_sum = int_sum.saturating_add(*v);
                float_sum += *v as f64;
            }
            Some(Value::Float(v)) => {
                any = true;
                any_float = true;
                float_sum += v;
            }
            Some(other) => {
                return Err(Error::invariant(format!(
                    "sum({field}) over non-numeric cell: {other:?}"
                )));
            }
        }
    }

    let value = if !any {
        Value::Null
    } else if any_float {
        Value::Float(float_sum)
    } else {
        Value::Int(int_sum)
    };

    Ok(Row::new().col(format!("sum({field})"), value))
}

/// Recombine per-shard (average, row-count) pairs into one global average:
/// `sum(avg_i * count_i) / sum(count_i)`. An average of per-shard averages
/// would weight shards equally regardless of their row counts.
fn weighted_average(rows: &[Row], field: &str) -> Result<Row, Error> {
    let mut weighted_sum = 0_f64;
    let mut total_count = 0_i64;

    for row in rows {
        let (avg, count) = match (row.at(0), row.at(1)) {
            (Some(avg), Some(count)) => (avg, count),
            _ => {
                return Err(Error::invariant(format!(
                    "avg({field}) expects per-shard (average, row-count) pairs, got {row:?}"
                )));
            }
        };

        let Some(count) = count.as_i64() else {
            return Err(Error::invariant(format!(
                "avg({field}) row count is not an integer: {count:?}"
            )));
        };
        if count < 0 {
            return Err(Error::invariant(format!(
                "avg({field}) row count is negative: {count}"
            )));
        }
        if count == 0 {
            continue;
        }

        let Some(avg) = avg.as_f64() else {
            return Err(Error::invariant(format!(
                "avg({field}) average cell is not numeric: {avg:?}"
            )));
        };

        weighted_sum += avg * count as f64;
        total_count = total_count.saturating_add(count);
    }

    let value = if total_count == 0 {
        Value::Null
    } else {
        Value::Float(weighted_sum / total_count as f64)
    };

    Ok(Row::new().col(format!("avg({field})"), value))
}

fn project_list(rows: Vec<Row>, items: &[Projection]) -> Result<Vec<Row>, Error> {
    let mut fields = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Projection::Field(field) => fields.push(field.as_str()),
            Projection::RowCount
            | Projection::Sum(_)
            | Projection::Average(_)
            | Projection::List(_) => {
                return Err(Error::Unsupported(
                    "aggregate projection inside projection list",
                ));
            }
        }
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            fields
                .iter()
                .map(|field| {
                    let value = row.get(field).cloned().unwrap_or(Value::Null);

                    ((*field).to_string(), value)
                })
                .collect()
        })
        .collect())
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: i64, age: i64) -> Row {
        Row::new().col("id", id).col("age", age)
    }

    #[test]
    fn pipeline_applies_order_then_offset_then_limit() {
        let mut collector = ExitCollector::new();
        collector.add_order(SortOrder::asc("id"));
        collector.set_first_result(1);
        collector.set_max_results(2);

        let rows = vec![entity(4, 40), entity(1, 10), entity(3, 30), entity(2, 20)];
        let out = collector.apply(rows).unwrap();

        // sorted [1,2,3,4], offset 1, limit 2
        assert_eq!(out, vec![entity(2, 20), entity(3, 30)]);
    }

    #[test]
    fn descending_order_uses_canonical_comparison() {
        let mut collector = ExitCollector::new();
        collector.add_order(SortOrder::desc("age"));

        let out = collector
            .apply(vec![entity(1, 10), entity(2, 30), entity(3, 20)])
            .unwrap();

        assert_eq!(out, vec![entity(2, 30), entity(3, 20), entity(1, 10)]);
    }

    #[test]
    fn secondary_sort_key_breaks_ties() {
        let mut collector = ExitCollector::new();
        collector.add_order(SortOrder::asc("age"));
        collector.add_order(SortOrder::desc("id"));

        let out = collector
            .apply(vec![entity(1, 10), entity(2, 10), entity(3, 5)])
            .unwrap();

        assert_eq!(out, vec![entity(3, 5), entity(2, 10), entity(1, 10)]);
    }

    #[test]
    fn weighted_average_is_not_average_of_averages() {
        let mut collector = ExitCollector::new();
        collector.set_projection(Projection::Average("age".to_string()));

        // shard A: avg 2.0 over 1 row; shard B: avg 10.0 over 3 rows
        let merged = vec![
            Row::new().col("avg(age)", 2.0).col("row_count", 1_i64),
            Row::new().col("avg(age)", 10.0).col("row_count", 3_i64),
        ];
        let out = collector.apply(merged).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].single(), Some(&Value::Float(8.0)));
    }

    #[test]
    fn average_skips_empty_shards() {
        let mut collector = ExitCollector::new();
        collector.set_projection(Projection::Average("age".to_string()));

        let merged = vec![
            Row::new().col("avg(age)", Value::Null).col("row_count", 0_i64),
            Row::new().col("avg(age)", 5.0).col("row_count", 2_i64),
        ];
        let out = collector.apply(merged).unwrap();

        assert_eq!(out[0].single(), Some(&Value::Float(5.0)));
    }

    #[test]
    fn average_over_zero_rows_is_null() {
        let mut collector = ExitCollector::new();
        collector.set_projection(Projection::Average("age".to_string()));

        let merged = vec![
            Row::new().col("avg(age)", Value::Null).col("row_count", 0_i64),
        ];
        let out = collector.apply(merged).unwrap();

        assert_eq!(out[0].single(), Some(&Value::Null));
    }

    #[test]
    fn malformed_average_pair_is_an_invariant_violation() {
        let mut collector = ExitCollector::new();
        collector.set_projection(Projection::Average("age".to_string()));

        let err = collector
            .apply(vec![Row::new().col("avg(age)", 5.0)])
            .unwrap_err();

        assert!(matches!(err, Error::Invariant(_)));
    }

    #[test]
    fn row_count_counts_merged_rows() {
        let mut collector = ExitCollector::new();
        collector.set_projection(Projection::RowCount);

        let out = collector
            .apply(vec![entity(1, 10), entity(2, 20), entity(3, 30)])
            .unwrap();

        assert_eq!(out, vec![Row::new().col("row_count", 3_i64)]);
    }

    #[test]
    fn sum_stays_integral_until_a_float_appears() {
        let mut collector = ExitCollector::new();
        collector.set_projection(Projection::Sum("age".to_string()));

        let out = collector.apply(vec![entity(1, 10), entity(2, 20)]).unwrap();
        assert_eq!(out[0].single(), Some(&Value::Int(30)));

        let mut collector = ExitCollector::new();
        collector.set_projection(Projection::Sum("age".to_string()));
        let out = collector
            .apply(vec![entity(1, 10), Row::new().col("age", 0.5)])
            .unwrap();
        assert_eq!(out[0].single(), Some(&Value::Float(10.5)));
    }

    #[test]
    fn field_projection_extracts_named_column() {
        let mut collector = ExitCollector::new();
        collector.set_projection(Projection::Field("id".to_string()));

        let out = collector.apply(vec![entity(1, 10), entity(2, 20)]).unwrap();

        assert_eq!(
            out,
            vec![Row::new().col("id", 1_i64), Row::new().col("id", 2_i64)]
        );
    }

    #[test]
    fn aggregate_inside_projection_list_is_unsupported() {
        let mut collector = ExitCollector::new();
        collector.set_projection(Projection::List(vec![
            Projection::Field("id".to_string()),
            Projection::RowCount,
        ]));

        let err = collector.apply(vec![entity(1, 10)]).unwrap_err();

        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn field_list_projection_extracts_columns_in_order() {
        let mut collector = ExitCollector::new();
        collector.set_projection(Projection::List(vec![
            Projection::Field("age".to_string()),
            Projection::Field("id".to_string()),
        ]));

        let out = collector.apply(vec![entity(1, 10)]).unwrap();

        assert_eq!(out, vec![Row::new().col("age", 10_i64).col("id", 1_i64)]);
    }

    #[test]
    fn window_without_orders_still_applies() {
        let mut collector = ExitCollector::new();
        collector.set_max_results(1);

        let out = collector.apply(vec![entity(1, 10), entity(2, 20)]).unwrap();

        assert_eq!(out, vec![entity(1, 10)]);
    }
}
