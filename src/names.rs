use crate::types::GdpRecord;
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// Known divergences between the GDP dataset's country names and the
    /// Natural Earth `NAME` attribute. Anything not listed here already
    /// matches.
    static ref NAME_MAPPING: HashMap<&'static str, &'static str> = [
        ("Antigua and Barbuda", "Antigua and Barb."),
        ("Bosnia and Herzegovina", "Bosnia and Herz."),
        ("Cape Verde", "Cabo Verde"),
        ("Central African Republic", "Central African Rep."),
        ("Dominican Republic", "Dominican Rep."),
        ("DR Congo", "Dem. Rep. Congo"),
        ("East Timor", "Timor-Leste"),
        ("Equatorial Guinea", "Eq. Guinea"),
        ("Eswatini", "eSwatini"),
        ("Ivory Coast", "Côte d'Ivoire"),
        ("Marshall Islands", "Marshall Is."),
        ("Saint Kitts and Nevis", "St. Kitts and Nevis"),
        ("Saint Vincent and the Grenadines", "St. Vin. and Gren."),
        ("Sao Tome and Principe", "São Tomé and Principe"),
        ("Solomon Islands", "Solomon Is."),
        ("South Sudan", "S. Sudan"),
        ("United States", "United States of America"),
    ]
    .into_iter()
    .collect();
}

/// Translate a country name to the Natural Earth convention. Names without a
/// mapping pass through unchanged, so this is total; no mapped value is
/// itself a key, so it is also idempotent.
pub fn standardize(name: &str) -> String {
    match NAME_MAPPING.get(name) {
        Some(mapped) => (*mapped).to_string(),
        None => name.to_string(),
    }
}

/// Fill in the standardized-name join key on every record.
pub fn standardize_records(records: &mut [GdpRecord]) {
    for record in records {
        record.standardized = standardize(&record.country);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_names_translate() {
        assert_eq!(standardize("Cape Verde"), "Cabo Verde");
        assert_eq!(standardize("United States"), "United States of America");
        assert_eq!(standardize("Ivory Coast"), "Côte d'Ivoire");
    }

    #[test]
    fn unmapped_names_pass_through() {
        assert_eq!(standardize("France"), "France");
        assert_eq!(standardize("Unmapped Country"), "Unmapped Country");
    }

    #[test]
    fn second_application_is_identity() {
        for name in NAME_MAPPING.keys() {
            let once = standardize(name);
            assert_eq!(standardize(&once), once);
        }
    }

    #[test]
    fn fills_join_key_on_records() {
        let mut records = vec![GdpRecord {
            country: "South Sudan".to_string(),
            year: 2012,
            biggest_change: -50.3,
            standardized: String::new(),
        }];
        standardize_records(&mut records);
        assert_eq!(records[0].standardized, "S. Sudan");
    }
}
