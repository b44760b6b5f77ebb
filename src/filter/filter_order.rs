use std::cmp::Ordering;

use super::types::{FilterOrderInfo, SortDirection};
use crate::database::value::{compare_values, Record};

pub struct FilterOrder;

impl FilterOrder {
    /// `ORDER BY` clause, or an empty string for no ordering. Nulls sort
    /// last in both directions.
    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("{} {} NULLS LAST", i.column.ordering_expr(), i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    /// Comparator equivalent to the rendered `ORDER BY`
    pub fn compare(infos: &[FilterOrderInfo], a: &Record, b: &Record) -> Ordering {
        for info in infos {
            let left = a.get(info.column.name).filter(|v| !v.is_null());
            let right = b.get(info.column.name).filter(|v| !v.is_null());
            let ord = match (left, right) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(l), Some(r)) => {
                    let ord = compare_values(l, r).unwrap_or(Ordering::Equal);
                    match info.sort {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                }
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}
