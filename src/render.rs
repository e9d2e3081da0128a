use crate::types::{ChangeCategory, MergedRecord};
use anyhow::{Context, Result};
use geo::{Area, BoundingRect, Contains, Point, Polygon as GeoPolygon};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::FontStyle;
use std::cmp::Ordering;

const OUTPUT_PATH: &str = "gdp_change.png";

// 15 x 10 inches at 300 DPI.
const WIDTH: u32 = 4500;
const HEIGHT: u32 = 3000;
const FOOTER_HEIGHT: u32 = 660;

const TITLE: &str = "Biggest Annual Real GDP Change per Country (2000-2024)";

/// 7-class RdYlGn, used when any country's change is negative.
static DIVERGING: [RGBColor; 7] = [
    RGBColor(215, 48, 39),
    RGBColor(252, 141, 89),
    RGBColor(254, 224, 139),
    RGBColor(255, 255, 191),
    RGBColor(217, 239, 139),
    RGBColor(145, 207, 96),
    RGBColor(26, 152, 80),
];

/// 7-class YlGnBu, used when every change is non-negative.
static SEQUENTIAL: [RGBColor; 7] = [
    RGBColor(255, 255, 204),
    RGBColor(199, 233, 180),
    RGBColor(127, 205, 187),
    RGBColor(65, 182, 196),
    RGBColor(29, 145, 192),
    RGBColor(34, 94, 168),
    RGBColor(12, 44, 132),
];

const NO_DATA_FILL: RGBColor = RGBColor(211, 211, 211);
const EDGE_COLOR: RGBColor = RGBColor(128, 128, 128);

type MapArea<'a> = DrawingArea<BitMapBackend<'a>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Diverging scale if any joined value is negative, sequential otherwise.
pub fn palette_for(merged: &[MergedRecord]) -> &'static [RGBColor; 7] {
    let any_negative = merged
        .iter()
        .any(|m| m.biggest_change.map_or(false, |v| v < 0.0));
    if any_negative {
        &DIVERGING
    } else {
        &SEQUENTIAL
    }
}

/// Draw the classified records as a choropleth with a manual legend, two
/// annotation blocks, and a source box, then write the PNG. Any drawing
/// failure propagates.
pub fn render_map(merged: &[MergedRecord]) -> Result<()> {
    println!("Rendering {} countries to {OUTPUT_PATH}...", merged.len());

    let root = BitMapBackend::new(OUTPUT_PATH, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).context("Failed to fill background")?;

    let (map_area, footer) = root.split_vertically(HEIGHT - FOOTER_HEIGHT);

    let mut chart = ChartBuilder::on(&map_area)
        .caption(TITLE, ("sans-serif", 92))
        .margin(10)
        .build_cartesian_2d(-180.0f64..180.0, -90.0f64..90.0)?;
    let plotting = chart.plotting_area();

    let palette = palette_for(merged);
    draw_countries(plotting, merged, palette)?;
    draw_legend(plotting, palette)?;
    draw_annotations(&footer)?;

    root.present().context("Failed to write output image")?;
    println!("Wrote {OUTPUT_PATH}");
    Ok(())
}

fn draw_countries(
    plotting: &MapArea<'_>,
    merged: &[MergedRecord],
    palette: &[RGBColor; 7],
) -> Result<()> {
    // Largest areas first, so enclave countries (Lesotho, San Marino, ...)
    // paint over the country that surrounds them.
    let mut order: Vec<usize> = (0..merged.len()).collect();
    order.sort_by(|&a, &b| {
        merged[b]
            .geometry
            .unsigned_area()
            .partial_cmp(&merged[a].geometry.unsigned_area())
            .unwrap_or(Ordering::Equal)
    });

    for &i in &order {
        let record = &merged[i];
        let fill = match record.category.palette_index() {
            Some(idx) => palette[idx],
            None => NO_DATA_FILL,
        };

        for polygon in record.geometry.0.iter() {
            let (exterior, interiors) = polygon_rings(polygon);
            plotting.draw(&Polygon::new(exterior.clone(), fill.filled()))?;

            // Interior rings get painted back out in the background color.
            // Enclave countries are repainted by the draw order, but holes
            // left by the geometry edits have nothing drawn on top of them.
            for interior in &interiors {
                plotting.draw(&Polygon::new(interior.clone(), WHITE.filled()))?;
            }

            if record.category == ChangeCategory::NoData {
                hatch_polygon(plotting, polygon)?;
            }

            for ring in std::iter::once(&exterior).chain(interiors.iter()) {
                let mut outline = ring.clone();
                if let Some(&first) = outline.first() {
                    outline.push(first);
                }
                plotting.draw(&PathElement::new(outline, EDGE_COLOR.stroke_width(1)))?;
            }
        }
    }
    Ok(())
}

/// Exterior and interior rings of a polygon as drawable coordinate lists.
fn polygon_rings(polygon: &GeoPolygon<f64>) -> (Vec<(f64, f64)>, Vec<Vec<(f64, f64)>>) {
    let exterior = polygon.exterior().coords().map(|c| (c.x, c.y)).collect();
    let interiors = polygon
        .interiors()
        .iter()
        .map(|ring| ring.coords().map(|c| (c.x, c.y)).collect())
        .collect();
    (exterior, interiors)
}

/// Approximate matplotlib's "///" hatch: short diagonal ticks on a grid of
/// points that fall inside the polygon.
fn hatch_polygon(plotting: &MapArea<'_>, polygon: &GeoPolygon<f64>) -> Result<()> {
    const STEP: f64 = 1.5;
    const TICK: f64 = 0.5;

    let Some(bbox) = polygon.bounding_rect() else {
        return Ok(());
    };

    let mut y = bbox.min().y;
    while y <= bbox.max().y {
        let mut x = bbox.min().x;
        while x <= bbox.max().x {
            if polygon.contains(&Point::new(x, y)) {
                plotting.draw(&PathElement::new(
                    vec![(x - TICK, y - TICK), (x + TICK, y + TICK)],
                    EDGE_COLOR.stroke_width(1),
                ))?;
            }
            x += STEP;
        }
        y += STEP;
    }
    Ok(())
}

/// Manual legend, lower left: one swatch per bucket in reverse order, then
/// the hatched "No data" swatch.
fn draw_legend(plotting: &MapArea<'_>, palette: &[RGBColor; 7]) -> Result<()> {
    const X0: f64 = -176.0;
    const SWATCH_W: f64 = 7.0;
    const SWATCH_H: f64 = 4.6;
    const ROW: f64 = 6.8;

    let title_style: TextStyle = ("sans-serif", 56)
        .into_font()
        .style(FontStyle::Bold)
        .into();
    let label_style: TextStyle = ("sans-serif", 48).into_font().into();

    plotting.draw(&Text::new("Biggest Annual", (X0, 4.0), title_style.clone()))?;
    plotting.draw(&Text::new("GDP Change", (X0, -1.0), title_style))?;

    let mut y = -10.0;
    for bucket in ChangeCategory::BUCKETS.iter().rev() {
        let idx = bucket
            .palette_index()
            .expect("numeric bucket has a palette slot");
        draw_swatch(plotting, X0, y, SWATCH_W, SWATCH_H, palette[idx], false)?;
        plotting.draw(&Text::new(
            format!("{}%", bucket.label()),
            (X0 + SWATCH_W + 2.0, y - 0.6),
            label_style.clone(),
        ))?;
        y -= ROW;
    }

    draw_swatch(plotting, X0, y, SWATCH_W, SWATCH_H, NO_DATA_FILL, true)?;
    plotting.draw(&Text::new(
        "No data",
        (X0 + SWATCH_W + 2.0, y - 0.6),
        label_style,
    ))?;
    Ok(())
}

fn draw_swatch(
    plotting: &MapArea<'_>,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    fill: RGBColor,
    hatched: bool,
) -> Result<()> {
    plotting.draw(&Rectangle::new([(x, y), (x + w, y - h)], fill.filled()))?;
    if hatched {
        for i in 0..3 {
            let dx = w * (i as f64 + 0.5) / 3.0;
            plotting.draw(&PathElement::new(
                vec![(x + dx - h * 0.3, y - h), (x + dx + h * 0.3, y)],
                EDGE_COLOR.stroke_width(1),
            ))?;
        }
    }
    plotting.draw(&Rectangle::new(
        [(x, y), (x + w, y - h)],
        EDGE_COLOR.stroke_width(1),
    ))?;
    Ok(())
}

/// Fixed narrative blocks under the map plus the source citation box. The
/// figures are properties of the published 2000-2024 dataset, not derived
/// from the current query result.
fn draw_annotations(footer: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>) -> Result<()> {
    let heading: TextStyle = ("sans-serif", 48)
        .into_font()
        .style(FontStyle::Bold)
        .into();
    let body: TextStyle = ("sans-serif", 44).into_font().into();

    let left_lines: [(&str, bool); 10] = [
        ("Greatest leaps", true),
        ("Equatorial Guinea: 110,5%, 2000 (oil boom)", false),
        ("Libya: 86,8%, 2012 (post civil war rebound)", false),
        ("Guyana: 63,3%, 2022 (oil boom)", false),
        ("Steepest drops", true),
        ("South Sudan: -50,3%, 2012 (shutdown of oil wells)", false),
        ("Central African Republic: -36,4%, 2013 (coup and civil war)", false),
        ("Venezuela: -30%, 2020 (sanctions, oil collapse and COVID)", false),
        ("Moderation award", true),
        ("Norway: 4%, 2004", false),
    ];

    let mut y = 10;
    for (line, is_heading) in left_lines {
        let style = if is_heading { heading.clone() } else { body.clone() };
        footer.draw(&Text::new(line, (60, y), style))?;
        y += 62;
    }

    let right_lines = [
        "146 countries had a positive peak year; 46 had a negative one",
        "38 countries made their greatest leap in 2021 (post-COVID rebound)",
        "27 saw their sharpest drop in 2020, and 7 in 2009",
        "Guyana, Equatorial Guinea, Ethiopia, and China had the highest cumulative growth",
        "Three countries had a negative sum: South Sudan, Venezuela, and Yemen",
        "Europe's steepest drop occurred in Ukraine (2022, Russian invasion)",
    ];

    let mut y = 10;
    for line in right_lines {
        footer.draw(&Text::new(line, (2100, y), body.clone()))?;
        y += 74;
    }

    // Source box between the two blocks.
    let box_rect = [(1560, 470), (1860, 570)];
    footer.draw(&Rectangle::new(box_rect, NO_DATA_FILL.filled()))?;
    footer.draw(&Rectangle::new(box_rect, BLACK.stroke_width(2)))?;
    footer.draw(&Text::new("Source: IMF", (1598, 495), body))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::MultiPolygon;

    fn record(change: Option<f64>) -> MergedRecord {
        MergedRecord {
            name: "X".to_string(),
            geometry: MultiPolygon::new(Vec::new()),
            year: None,
            biggest_change: change,
            category: crate::processing::classify(change),
        }
    }

    #[test]
    fn negative_values_select_the_diverging_palette() {
        let merged = vec![record(Some(3.0)), record(Some(-12.5))];
        assert_eq!(palette_for(&merged) as *const _, &DIVERGING as *const _);
    }

    #[test]
    fn all_positive_selects_the_sequential_palette() {
        let merged = vec![record(Some(3.0)), record(Some(25.0)), record(None)];
        assert_eq!(palette_for(&merged) as *const _, &SEQUENTIAL as *const _);
    }

    #[test]
    fn interior_rings_are_kept_for_background_fill() {
        // A hole (e.g. one left by the Crimea difference) must come back as
        // its own ring so it is painted out, not swallowed by the fill.
        use geo::{polygon, LineString};

        let mut holed = polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ];
        holed.interiors_push(LineString::from(vec![
            (4.0, 4.0),
            (6.0, 4.0),
            (6.0, 6.0),
            (4.0, 6.0),
        ]));

        let (exterior, interiors) = polygon_rings(&holed);
        assert!(exterior.len() >= 4);
        assert_eq!(interiors.len(), 1);
        assert!(interiors[0].contains(&(4.0, 4.0)));
    }

    #[test]
    fn palette_index_covers_every_numeric_bucket() {
        for (i, bucket) in ChangeCategory::BUCKETS.iter().enumerate() {
            assert_eq!(bucket.palette_index(), Some(i));
        }
        assert_eq!(ChangeCategory::NoData.palette_index(), None);
    }
}
