//! JSON output for records, query results and checkpoint listings.
//!
//! Serializes any report value for scripting and piping.

use serde::Serialize;

pub fn render<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::queries::CityCount;

    #[test]
    fn renders_arrays() {
        let rows = vec![CityCount { city: "Recife".into(), apartments: 2 }];
        let value: serde_json::Value = serde_json::from_str(&render(&rows)).unwrap();
        assert_eq!(value[0]["city"], "Recife");
        assert_eq!(value[0]["apartments"], 2);
    }
}
