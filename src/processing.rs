use crate::types::{ChangeCategory, GdpRecord, MergedRecord, ShapeTable};
use std::collections::HashMap;

/// Left-outer join of country geometries against GDP records on the
/// standardized name. Every geometry survives; countries without a record
/// carry no value and later render as "No data". Antarctica is dropped here
/// (not a GDP-relevant territory).
pub fn merge(world: ShapeTable, records: &[GdpRecord]) -> Vec<MergedRecord> {
    // One record per country: if the source ever hands back duplicates for a
    // name, the first one wins instead of whichever happened to arrive last.
    let mut by_name: HashMap<&str, &GdpRecord> = HashMap::new();
    for record in records {
        by_name.entry(record.standardized.as_str()).or_insert(record);
    }

    let merged: Vec<MergedRecord> = world
        .shapes
        .into_iter()
        .filter(|s| s.name != "Antarctica")
        .map(|shape| {
            let record = by_name.get(shape.name.as_str());
            MergedRecord {
                name: shape.name,
                geometry: shape.geometry,
                year: record.map(|r| r.year),
                biggest_change: record.map(|r| r.biggest_change),
                category: ChangeCategory::NoData,
            }
        })
        .collect();

    println!(
        "Merged {} geometries ({} with GDP data)",
        merged.len(),
        merged.iter().filter(|m| m.biggest_change.is_some()).count()
    );
    merged
}

/// Bucket a change value into the seven fixed left-closed intervals. Missing
/// and non-finite values go to "No data", never a numeric bucket.
pub fn classify(biggest_change: Option<f64>) -> ChangeCategory {
    match biggest_change {
        None => ChangeCategory::NoData,
        Some(v) if !v.is_finite() => ChangeCategory::NoData,
        Some(v) if v < -20.0 => ChangeCategory::DropOver20,
        Some(v) if v < -10.0 => ChangeCategory::Drop10To20,
        Some(v) if v < 0.0 => ChangeCategory::DropUnder10,
        Some(v) if v < 5.0 => ChangeCategory::Gain0To5,
        Some(v) if v < 10.0 => ChangeCategory::Gain5To10,
        Some(v) if v < 20.0 => ChangeCategory::Gain10To20,
        Some(_) => ChangeCategory::GainOver20,
    }
}

pub fn classify_all(merged: &mut [MergedRecord]) {
    for record in merged {
        record.category = classify(record.biggest_change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names;
    use crate::types::{Crs, NamedGeometry};
    use geo::{polygon, MultiPolygon};

    fn unit_square() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ]])
    }

    fn world(names: &[&str]) -> ShapeTable {
        ShapeTable {
            shapes: names
                .iter()
                .map(|n| NamedGeometry {
                    name: n.to_string(),
                    geometry: unit_square(),
                })
                .collect(),
            crs: Crs::from_wkt("GEOGCS[\"WGS 84\"]"),
        }
    }

    fn record(country: &str, year: i32, change: f64) -> GdpRecord {
        GdpRecord {
            country: country.to_string(),
            year,
            biggest_change: change,
            standardized: names::standardize(country),
        }
    }

    #[test]
    fn boundary_values_fall_in_the_interval_they_lower_bound() {
        assert_eq!(classify(Some(-20.0)), ChangeCategory::Drop10To20);
        assert_eq!(classify(Some(-10.0)), ChangeCategory::DropUnder10);
        assert_eq!(classify(Some(0.0)), ChangeCategory::Gain0To5);
        assert_eq!(classify(Some(5.0)), ChangeCategory::Gain5To10);
        assert_eq!(classify(Some(10.0)), ChangeCategory::Gain10To20);
        assert_eq!(classify(Some(20.0)), ChangeCategory::GainOver20);
    }

    #[test]
    fn open_ends_classify() {
        assert_eq!(classify(Some(-50.3)), ChangeCategory::DropOver20);
        assert_eq!(classify(Some(110.5)), ChangeCategory::GainOver20);
    }

    #[test]
    fn every_finite_value_gets_exactly_one_bucket() {
        for v in [
            -100.0, -20.0, -19.9, -10.0, -0.1, 0.0, 4.9, 5.0, 9.9, 10.0, 19.9, 20.0, 99.0,
        ] {
            assert_ne!(classify(Some(v)), ChangeCategory::NoData);
        }
    }

    #[test]
    fn missing_and_nan_are_no_data() {
        assert_eq!(classify(None), ChangeCategory::NoData);
        assert_eq!(classify(Some(f64::NAN)), ChangeCategory::NoData);
    }

    #[test]
    fn cape_verde_joins_under_standardized_name() {
        let world = world(&["Cabo Verde", "France"]);
        let records = vec![record("Cape Verde", 2015, 6.5)];

        let mut merged = merge(world, &records);
        classify_all(&mut merged);

        let cabo = merged.iter().find(|m| m.name == "Cabo Verde").unwrap();
        assert_eq!(cabo.biggest_change, Some(6.5));
        assert_eq!(cabo.year, Some(2015));
        assert_eq!(cabo.category, ChangeCategory::Gain5To10);
        assert_eq!(cabo.category.label(), "5-10");
    }

    #[test]
    fn duplicate_records_for_a_country_resolve_to_the_first() {
        // A sign-flipped tie coming back as two rows must not make the
        // rendered bucket depend on row order: the first row wins.
        let world = world(&["Cabo Verde"]);
        let records = vec![record("Cape Verde", 2015, 6.5), record("Cape Verde", 2020, -6.5)];

        let mut merged = merge(world, &records);
        classify_all(&mut merged);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].biggest_change, Some(6.5));
        assert_eq!(merged[0].category, ChangeCategory::Gain5To10);
    }

    #[test]
    fn unmatched_geometry_is_kept_as_no_data() {
        let world = world(&["Atlantis"]);
        let mut merged = merge(world, &[]);
        classify_all(&mut merged);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].biggest_change, None);
        assert_eq!(merged[0].category, ChangeCategory::NoData);
    }

    #[test]
    fn antarctica_is_dropped() {
        let world = world(&["Antarctica", "Chile"]);
        let merged = merge(world, &[]);
        assert!(merged.iter().all(|m| m.name != "Antarctica"));
        assert_eq!(merged.len(), 1);
    }
}
