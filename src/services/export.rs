use crate::models::StoredQuery;
use crate::services::query_log::TIMESTAMP_FORMAT;
use std::fmt::Write;

/// Column order of the query export
pub const CSV_HEADER: [&str; 11] = [
    "id",
    "sqft_living",
    "bedrooms",
    "bathrooms",
    "lot",
    "floors",
    "age",
    "zipcode",
    "purpose",
    "predicted_price",
    "timestamp",
];

/// Render logged queries as CSV, header first, one line per query
pub fn queries_to_csv(queries: &[StoredQuery]) -> String {
    let mut out = String::with_capacity(64 * (queries.len() + 1));
    out.push_str(&CSV_HEADER.join(","));
    out.push('\n');

    for q in queries {
        // Writing into a String cannot fail
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{:.2},{}",
            q.id,
            q.sqft_living,
            q.bedrooms,
            q.bathrooms,
            q.sqft_lot,
            q.floors,
            q.house_age,
            escape_csv(&q.zipcode),
            q.purpose,
            q.predicted_price,
            q.timestamp.format(TIMESTAMP_FORMAT),
        );
    }

    out
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
