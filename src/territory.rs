use crate::geometry::reproject;
use crate::types::{Crs, MergedRecord, ShapeTable};
use anyhow::{anyhow, Result};
use geo::{Area, BooleanOps, MultiPolygon};
use geo_buffer::buffer_multi_polygon_rounded;

/// Buffer margin used to close slivers along the Cyprus seam. Tunable; the
/// value is kept for output parity with the published map.
const GAP_CLOSE_MARGIN: f64 = 0.05;

/// Contiguous parts of Russia smaller than this (working-CRS area units) are
/// discarded after the Crimea subtraction.
const MIN_RUSSIA_PART_AREA: f64 = 0.10;

/// Re-node a geometry through the boolean-ops engine. Equivalent to a
/// zero-distance buffer: clears self-intersections left behind by
/// union/difference so they cannot crash a later operation.
fn repair(geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    geometry.union(geometry)
}

fn union_all(parts: &[MultiPolygon<f64>]) -> MultiPolygon<f64> {
    let mut iter = parts.iter();
    let first = iter
        .next()
        .cloned()
        .unwrap_or_else(|| MultiPolygon::new(Vec::new()));
    iter.fold(first, |acc, p| acc.union(p))
}

/// Display Cyprus as one unified shape: union in the disputed-areas
/// "N. Cyprus" geometry, then close the seam with an expand/shrink buffer
/// pass before replacing the stored geometry.
pub fn merge_cyprus(world: &mut ShapeTable, disputed: &ShapeTable) -> Result<()> {
    let north = disputed
        .find("N. Cyprus")
        .ok_or_else(|| anyhow!("'N. Cyprus' not found in disputed areas"))?;
    let north_geom = reproject(&north.geometry, &disputed.crs, &world.crs)?;

    let south = world
        .geometry_of("Cyprus")
        .ok_or_else(|| anyhow!("'Cyprus' not found in country layer"))?;

    let raw_union = repair(&south.union(&north_geom));
    let expanded = buffer_multi_polygon_rounded(&raw_union, GAP_CLOSE_MARGIN);
    let full_cyprus = buffer_multi_polygon_rounded(&expanded, -GAP_CLOSE_MARGIN);

    world.replace_geometry("Cyprus", repair(&full_cyprus));
    Ok(())
}

/// Union Somaliland into Somalia and drop Somaliland as a standalone entity.
pub fn merge_somalia(world: &mut ShapeTable, disputed: &ShapeTable) -> Result<()> {
    let somaliland = disputed
        .find("Somaliland")
        .ok_or_else(|| anyhow!("'Somaliland' not found in disputed areas"))?;
    let somaliland_geom = reproject(&somaliland.geometry, &disputed.crs, &world.crs)?;

    let somalia = world
        .geometry_of("Somalia")
        .ok_or_else(|| anyhow!("'Somalia' not found in country layer"))?;

    let full_somalia = repair(&somalia.union(&somaliland_geom));
    world.replace_geometry("Somalia", full_somalia);
    world.remove("Somaliland");
    Ok(())
}

/// Move Crimea from Russia to Ukraine on the merged records.
///
/// Runs after the GDP join so the join keys saw the original country
/// identities. The Crimea shape comes from the admin-1 layer (any feature
/// whose English name contains "crimea"), reprojected into the working CRS
/// and repaired before the boolean edits. Russia is then exploded and small
/// leftover fragments below the area threshold are dropped; Crimea is
/// unioned into Ukraine a second time after that filter, which is idempotent
/// and guards against ordering effects.
pub fn reassign_crimea(
    merged: &mut [MergedRecord],
    admin1: &ShapeTable,
    working_crs: &Crs,
) -> Result<()> {
    let parts: Vec<MultiPolygon<f64>> = admin1
        .shapes
        .iter()
        .filter(|s| s.name.to_lowercase().contains("crimea"))
        .map(|s| s.geometry.clone())
        .collect();
    if parts.is_empty() {
        return Err(anyhow!("No admin-1 feature matching 'Crimea'"));
    }

    let crimea_raw = union_all(&parts);
    let crimea = repair(&reproject(&crimea_raw, &admin1.crs, working_crs)?);

    let russia = find_mut(merged, "Russia")?;
    russia.geometry = repair(&russia.geometry.difference(&crimea));

    let ukraine = find_mut(merged, "Ukraine")?;
    ukraine.geometry = repair(&ukraine.geometry.union(&crimea));

    // Drop small disconnected fragments left along the subtraction edge.
    let russia = find_mut(merged, "Russia")?;
    let large_parts: Vec<_> = russia
        .geometry
        .0
        .iter()
        .filter(|part| part.unsigned_area() > MIN_RUSSIA_PART_AREA)
        .cloned()
        .collect();
    russia.geometry = repair(&MultiPolygon::new(large_parts));

    let ukraine = find_mut(merged, "Ukraine")?;
    ukraine.geometry = ukraine.geometry.union(&crimea);

    Ok(())
}

fn find_mut<'a>(merged: &'a mut [MergedRecord], name: &str) -> Result<&'a mut MergedRecord> {
    merged
        .iter_mut()
        .find(|m| m.name == name)
        .ok_or_else(|| anyhow!("'{}' not found in merged records", name))
}
