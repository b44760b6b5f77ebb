//! Table catalog: the allow-list of tables and columns that may appear in SQL.
//!
//! Table and column names cannot be bound as parameters, so every identifier
//! that reaches a statement is resolved here first. Callers name tables through
//! [`TableId`] and columns through plain strings that must belong to the table.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use super::error::StoreError;

/// SQL type of a catalog column. Drives parameter casts and value coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Numeric,
    Date,
    Timestamp,
}

impl ColumnKind {
    /// Postgres type used to cast bound parameters for this column
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnKind::Text => "text",
            ColumnKind::Integer => "bigint",
            ColumnKind::Numeric => "numeric",
            ColumnKind::Date => "date",
            ColumnKind::Timestamp => "timestamp",
        }
    }

    /// Normalize a caller-supplied value into the shape this column stores.
    ///
    /// Query strings deliver everything as text, so numeric kinds accept
    /// numeric strings. Decimal strings stay text and are cast by the
    /// `::numeric` parameter, keeping every digit. Dates must be ISO `YYYY-MM-DD`; timestamps accept
    /// RFC 3339, `YYYY-MM-DD[T ]HH:MM:SS[.f]` or a bare date. `null` passes
    /// through untouched.
    pub fn coerce(&self, column: &str, value: &Value) -> Result<Value, StoreError> {
        let invalid = |reason: &str| StoreError::InvalidValue {
            column: column.to_string(),
            reason: reason.to_string(),
        };

        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (_, Value::Array(_)) | (_, Value::Object(_)) => Err(invalid("expected a scalar value")),

            (ColumnKind::Text, Value::String(s)) => Ok(Value::String(s.clone())),
            (ColumnKind::Text, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (ColumnKind::Text, Value::Bool(b)) => Ok(Value::String(b.to_string())),

            (ColumnKind::Integer, Value::Number(n)) => n
                .as_i64()
                .map(Value::from)
                .ok_or_else(|| invalid("expected an integer")),
            (ColumnKind::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| invalid("expected an integer")),

            (ColumnKind::Numeric, Value::Number(n)) => Ok(Value::Number(n.clone())),
            (ColumnKind::Numeric, Value::String(s)) => {
                let s = s.trim();
                if is_decimal(s) {
                    Ok(Value::String(s.to_string()))
                } else {
                    Err(invalid("expected a number"))
                }
            }

            (ColumnKind::Date, Value::String(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .map_err(|_| invalid("expected a date formatted YYYY-MM-DD")),

            (ColumnKind::Timestamp, Value::String(s)) => {
                let s = s.trim();
                let parsed = DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.naive_utc())
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                    .or_else(|_| {
                        NaiveDate::parse_from_str(s, "%Y-%m-%d")
                            .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
                    });
                parsed
                    .map(|dt| Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
                    .map_err(|_| invalid("expected an ISO 8601 timestamp"))
            }

            _ => Err(invalid(&format!("unsupported value for {} column", self.sql_type()))),
        }
    }
}

/// Plain decimal literal: optional sign, digits with an optional fraction and
/// an optional exponent of at most four digits. Rejects `NaN` and `Infinity`.
fn is_decimal(s: &str) -> bool {
    let is_sign = |c: char| c == '+' || c == '-';
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());

    let body = s.strip_prefix(is_sign).unwrap_or(s);
    let (mantissa, exponent) = match body.split_once(|c: char| c == 'e' || c == 'E') {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (body, None),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let exponent_ok = exponent.map_or(true, |e| {
        let e = e.strip_prefix(is_sign).unwrap_or(e);
        (1..=4).contains(&e.len()) && digits(e)
    });

    !(int.is_empty() && frac.is_empty()) && digits(int) && digits(frac) && exponent_ok
}

/// One column of a catalog table
#[derive(Debug, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl ColumnDef {
    const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }

    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.name)
    }

    /// Column expression used for ordering and cursor comparison. Text keys
    /// compare bytewise so the database agrees with in-process ordering.
    pub fn ordering_expr(&self) -> String {
        match self.kind {
            ColumnKind::Text => format!("{} COLLATE \"C\"", self.quoted()),
            _ => self.quoted(),
        }
    }
}

/// Everything the pagination engine and the record helpers need to know
/// about a table.
#[derive(Debug)]
pub struct TableDescriptor {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    /// Default projection for listings and lookups
    pub selected_columns: &'static [&'static str],
    pub id_column: &'static str,
    pub order_column: &'static str,
    /// Tie-breaker for composite pagination when `order_column` repeats
    pub secondary_order_column: Option<&'static str>,
}

impl TableDescriptor {
    /// Resolve a column name against the allow-list
    pub fn column(&self, name: &str) -> Result<&'static ColumnDef, StoreError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| StoreError::UnknownColumn {
                table: self.name,
                column: name.to_string(),
            })
    }

    pub fn columns_named(&self, names: &[&str]) -> Result<Vec<&'static ColumnDef>, StoreError> {
        names.iter().map(|n| self.column(n)).collect()
    }

    pub fn selected(&self) -> Vec<&'static ColumnDef> {
        self.selected_columns
            .iter()
            .filter_map(|n| self.columns.iter().find(|c| c.name == *n))
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }
}

/// Closed set of tables the API may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableId {
    Mines,
    Equipment,
    EffectiveCapacity,
    ProductionConstraints,
    ProductionPlans,
    Weather,
    Roads,
    Shipping,
    Users,
}

impl TableId {
    #[cfg(test)]
    pub const ALL: [TableId; 9] = [
        TableId::Mines,
        TableId::Equipment,
        TableId::EffectiveCapacity,
        TableId::ProductionConstraints,
        TableId::ProductionPlans,
        TableId::Weather,
        TableId::Roads,
        TableId::Shipping,
        TableId::Users,
    ];

    pub fn descriptor(&self) -> &'static TableDescriptor {
        match self {
            TableId::Mines => &MINES,
            TableId::Equipment => &EQUIPMENT,
            TableId::EffectiveCapacity => &EFFECTIVE_CAPACITY,
            TableId::ProductionConstraints => &PRODUCTION_CONSTRAINTS,
            TableId::ProductionPlans => &PRODUCTION_PLANS,
            TableId::Weather => &WEATHER,
            TableId::Roads => &ROADS,
            TableId::Shipping => &SHIPPING,
            TableId::Users => &USERS,
        }
    }

    pub fn table_name(&self) -> &'static str {
        self.descriptor().name
    }
}

use ColumnKind::{Date, Integer, Numeric, Text, Timestamp};

static MINES: TableDescriptor = TableDescriptor {
    name: "mine_master",
    columns: &[
        ColumnDef::new("mine_id", Text),
        ColumnDef::new("mine_name", Text),
        ColumnDef::new("location", Text),
        ColumnDef::new("region", Text),
        ColumnDef::new("start_date", Date),
        ColumnDef::new("status", Text),
        ColumnDef::new("remarks", Text),
    ],
    selected_columns: &["mine_id", "mine_name", "location", "region", "start_date", "status", "remarks"],
    id_column: "mine_id",
    order_column: "start_date",
    secondary_order_column: Some("mine_id"),
};

static EQUIPMENT: TableDescriptor = TableDescriptor {
    name: "equipment_inventory",
    columns: &[
        ColumnDef::new("equipment_id", Text),
        ColumnDef::new("mine_id", Text),
        ColumnDef::new("equipment_type", Text),
        ColumnDef::new("brand", Text),
        ColumnDef::new("model", Text),
        ColumnDef::new("base_capacity_ton", Numeric),
        ColumnDef::new("last_maintenance", Date),
        ColumnDef::new("operator_id", Text),
    ],
    selected_columns: &[
        "equipment_id", "mine_id", "equipment_type", "brand", "model",
        "base_capacity_ton", "last_maintenance", "operator_id",
    ],
    id_column: "equipment_id",
    order_column: "last_maintenance",
    secondary_order_column: Some("equipment_id"),
};

static EFFECTIVE_CAPACITY: TableDescriptor = TableDescriptor {
    name: "effective_capacity",
    columns: &[
        ColumnDef::new("effcap_id", Text),
        ColumnDef::new("mine_id", Text),
        ColumnDef::new("equipment_id", Text),
        ColumnDef::new("week_start", Date),
        ColumnDef::new("distance_km", Numeric),
        ColumnDef::new("road_condition", Text),
        ColumnDef::new("weather_condition", Text),
        ColumnDef::new("availability_pct", Numeric),
        ColumnDef::new("effective_capacity_ton_day", Numeric),
        ColumnDef::new("remark", Text),
    ],
    selected_columns: &[
        "effcap_id", "mine_id", "equipment_id", "week_start", "distance_km",
        "road_condition", "weather_condition", "availability_pct",
        "effective_capacity_ton_day", "remark",
    ],
    id_column: "effcap_id",
    order_column: "week_start",
    secondary_order_column: Some("effcap_id"),
};

static PRODUCTION_CONSTRAINTS: TableDescriptor = TableDescriptor {
    name: "production_constraints",
    columns: &[
        ColumnDef::new("constraint_id", Text),
        ColumnDef::new("mine_id", Text),
        ColumnDef::new("equipment_id", Text),
        ColumnDef::new("week_start", Date),
        ColumnDef::new("constraint_type", Text),
        ColumnDef::new("capacity_value", Numeric),
        ColumnDef::new("unit", Text),
        ColumnDef::new("update_date", Date),
        ColumnDef::new("remarks", Text),
    ],
    selected_columns: &[
        "constraint_id", "mine_id", "equipment_id", "week_start", "constraint_type",
        "capacity_value", "unit", "update_date", "remarks",
    ],
    id_column: "constraint_id",
    order_column: "update_date",
    secondary_order_column: Some("constraint_id"),
};

static PRODUCTION_PLANS: TableDescriptor = TableDescriptor {
    name: "production_plan",
    columns: &[
        ColumnDef::new("plan_id", Text),
        ColumnDef::new("mine_id", Text),
        ColumnDef::new("week_start", Date),
        ColumnDef::new("planned_output_ton", Numeric),
        ColumnDef::new("actual_output_ton", Numeric),
        ColumnDef::new("target_variance_pct", Numeric),
        ColumnDef::new("status", Text),
        ColumnDef::new("updated_by", Text),
    ],
    selected_columns: &[
        "plan_id", "mine_id", "week_start", "planned_output_ton", "actual_output_ton",
        "target_variance_pct", "status", "updated_by",
    ],
    id_column: "plan_id",
    order_column: "week_start",
    secondary_order_column: Some("plan_id"),
};

static WEATHER: TableDescriptor = TableDescriptor {
    name: "weather_data",
    columns: &[
        ColumnDef::new("weather_id", Text),
        ColumnDef::new("mine_id", Text),
        ColumnDef::new("date", Date),
        ColumnDef::new("rainfall_mm", Numeric),
        ColumnDef::new("wind_speed_kmh", Numeric),
        ColumnDef::new("humidity_pct", Numeric),
        ColumnDef::new("remark", Text),
    ],
    selected_columns: &[
        "weather_id", "mine_id", "date", "rainfall_mm", "wind_speed_kmh", "humidity_pct", "remark",
    ],
    id_column: "weather_id",
    order_column: "date",
    secondary_order_column: Some("weather_id"),
};

static ROADS: TableDescriptor = TableDescriptor {
    name: "road_condition",
    columns: &[
        ColumnDef::new("road_id", Text),
        ColumnDef::new("mine_id", Text),
        ColumnDef::new("segment_name", Text),
        ColumnDef::new("condition_level", Text),
        ColumnDef::new("accessibility_pct", Numeric),
        ColumnDef::new("last_inspection", Date),
        ColumnDef::new("remark", Text),
    ],
    selected_columns: &[
        "road_id", "mine_id", "segment_name", "condition_level",
        "accessibility_pct", "last_inspection", "remark",
    ],
    id_column: "road_id",
    order_column: "last_inspection",
    secondary_order_column: Some("road_id"),
};

static SHIPPING: TableDescriptor = TableDescriptor {
    name: "shipping_schedule",
    columns: &[
        ColumnDef::new("shipment_id", Text),
        ColumnDef::new("mine_id", Text),
        ColumnDef::new("week_start", Date),
        ColumnDef::new("vessel_name", Text),
        ColumnDef::new("destination_port", Text),
        ColumnDef::new("coal_tonnage", Numeric),
        ColumnDef::new("etd", Date),
        ColumnDef::new("eta", Date),
        ColumnDef::new("status", Text),
    ],
    selected_columns: &[
        "shipment_id", "mine_id", "week_start", "vessel_name", "destination_port",
        "coal_tonnage", "etd", "eta", "status",
    ],
    id_column: "shipment_id",
    order_column: "week_start",
    secondary_order_column: Some("shipment_id"),
};

static USERS: TableDescriptor = TableDescriptor {
    name: "users",
    columns: &[
        ColumnDef::new("id", Integer),
        ColumnDef::new("nama", Text),
        ColumnDef::new("email", Text),
        ColumnDef::new("role", Text),
        ColumnDef::new("token", Text),
        ColumnDef::new("updated_at", Timestamp),
    ],
    selected_columns: &["id", "nama", "email", "role"],
    id_column: "id",
    order_column: "id",
    secondary_order_column: None,
};
