pub mod table;
pub mod json;

use serde::Serialize;

/// Print rows as JSON or through the given table renderer.
pub fn print<T: Serialize>(rows: &[T], json_output: bool, render_table: fn(&[T]) -> String) {
    if json_output {
        println!("{}", json::render(rows));
    } else {
        print!("{}", render_table(rows));
    }
}

/// Like `print`, but a single record renders as a JSON object rather than an array.
pub fn print_record<T: Serialize>(row: &T, json_output: bool, render_table: fn(&[T]) -> String) {
    if json_output {
        println!("{}", json::render(row));
    } else {
        print!("{}", render_table(std::slice::from_ref(row)));
    }
}

pub fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_render_in_utc() {
        assert_eq!(format_timestamp(86_400), "1970-01-02 00:00:00");
    }
}
