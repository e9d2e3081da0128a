use crate::types::{Crs, NamedGeometry, ShapeTable};
use anyhow::{anyhow, Context, Result};
use geo::MultiPolygon;
use shapefile::dbase::FieldValue;
use std::io::{Cursor, Read};
use std::time::Duration;
use tracing::info;
use zip::ZipArchive;

const COUNTRIES_URL: &str =
    "https://naturalearth.s3.amazonaws.com/10m_cultural/ne_10m_admin_0_countries.zip";
const DISPUTED_URL: &str =
    "https://naturalearth.s3.amazonaws.com/10m_cultural/ne_10m_admin_0_disputed_areas.zip";
const ADMIN1_URL: &str =
    "https://naturalearth.s3.amazonaws.com/10m_cultural/ne_10m_admin_1_states_provinces.zip";

/// Natural Earth admin-0 country boundaries.
pub fn fetch_countries() -> Result<ShapeTable> {
    fetch_table(COUNTRIES_URL, "NAME")
}

/// Natural Earth admin-0 disputed areas (N. Cyprus, Somaliland, ...).
pub fn fetch_disputed() -> Result<ShapeTable> {
    fetch_table(DISPUTED_URL, "NAME")
}

/// Natural Earth admin-1 states/provinces; named by the `name_en` attribute.
pub fn fetch_admin1() -> Result<ShapeTable> {
    fetch_table(ADMIN1_URL, "name_en")
}

/// Download a zipped shapefile archive and parse it into named multipolygons
/// plus the layer CRS from the `.prj` member. Network, zip, and shapefile
/// failures all propagate; there is no fallback source.
fn fetch_table(url: &str, name_field: &str) -> Result<ShapeTable> {
    println!("Fetching {url}...");

    // No request timeout anywhere in the pipeline; a stalled download stalls
    // the run.
    let client = reqwest::blocking::Client::builder()
        .timeout(None::<Duration>)
        .build()?;
    let body = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("Failed to download {url}"))?
        .bytes()?;

    let mut archive = ZipArchive::new(Cursor::new(body))
        .with_context(|| format!("Failed to open zip archive from {url}"))?;

    let shp = read_member(&mut archive, ".shp")?;
    let dbf = read_member(&mut archive, ".dbf")?;
    let prj = read_member(&mut archive, ".prj")?;
    let crs = Crs::from_wkt(&String::from_utf8_lossy(&prj));

    let shape_reader = shapefile::ShapeReader::new(Cursor::new(shp))
        .with_context(|| format!("Failed to read shapes from {url}"))?;
    let dbase_reader = shapefile::dbase::Reader::new(Cursor::new(dbf))
        .with_context(|| format!("Failed to read attribute table from {url}"))?;
    let mut reader = shapefile::Reader::new(shape_reader, dbase_reader);

    let mut shapes = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        let name = match record.get(name_field) {
            Some(FieldValue::Character(Some(s))) => s.clone(),
            Some(FieldValue::Character(None)) => continue, // unnamed feature
            Some(_) => return Err(anyhow!("Field '{}' must be a string", name_field)),
            None => return Err(anyhow!("Field '{}' not found in {}", name_field, url)),
        };

        let geometry = match shape {
            shapefile::Shape::Polygon(polygon) => {
                let mp: MultiPolygon<f64> = polygon
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?;
                mp
            }
            shapefile::Shape::PolygonM(polygon) => {
                let mp: MultiPolygon<f64> = polygon
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert polygonM: {:?}", e))?;
                mp
            }
            shapefile::Shape::PolygonZ(polygon) => {
                let mp: MultiPolygon<f64> = polygon
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert polygonZ: {:?}", e))?;
                mp
            }
            _ => continue, // skip non-polygon shapes
        };

        shapes.push(NamedGeometry { name, geometry });
    }

    info!(url, features = shapes.len(), "parsed boundary layer");
    println!("Loaded {} features from {url}", shapes.len());

    Ok(ShapeTable { shapes, crs })
}

fn read_member<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    extension: &str,
) -> Result<Vec<u8>> {
    let mut index = None;
    for i in 0..archive.len() {
        if archive.by_index(i)?.name().ends_with(extension) {
            index = Some(i);
            break;
        }
    }
    let index =
        index.ok_or_else(|| anyhow!("Archive has no {extension} member"))?;

    let mut file = archive.by_index(index)?;
    let mut buf = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Bring a geometry sourced from `from` into the working CRS.
///
/// All three Natural Earth layers ship in WGS84, so matching tags make this a
/// clone; a genuine mismatch is an error rather than a silent misalignment.
/// Boolean ops downstream require both operands in the same CRS.
pub fn reproject(
    geometry: &MultiPolygon<f64>,
    from: &Crs,
    to: &Crs,
) -> Result<MultiPolygon<f64>> {
    if from == to {
        Ok(geometry.clone())
    } else {
        Err(anyhow!(
            "CRS mismatch: cannot reproject from '{}' to '{}'",
            from.as_wkt(),
            to.as_wkt()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ]])
    }

    #[test]
    fn crs_comparison_ignores_whitespace_and_case() {
        let a = Crs::from_wkt("GEOGCS[\"WGS 84\", DATUM[\"WGS_1984\"]]");
        let b = Crs::from_wkt("geogcs[\"wgs 84\",datum[\"wgs_1984\"]]");
        assert_eq!(a, b);
    }

    #[test]
    fn reproject_is_identity_for_matching_crs() {
        let crs = Crs::from_wkt("GEOGCS[\"WGS 84\"]");
        let out = reproject(&square(), &crs, &crs).unwrap();
        assert_eq!(out, square());
    }

    #[test]
    fn reproject_rejects_mismatched_crs() {
        let from = Crs::from_wkt("GEOGCS[\"WGS 84\"]");
        let to = Crs::from_wkt("PROJCS[\"Web Mercator\"]");
        assert!(reproject(&square(), &from, &to).is_err());
    }
}
