pub mod db;
pub mod geometry;
pub mod names;
pub mod processing;
pub mod render;
pub mod territory;
pub mod types;

/// One-shot pipeline: GDP data out of MySQL, Natural Earth boundaries off
/// the network, territorial special cases resolved, values bucketed, one
/// annotated choropleth PNG written. Strictly sequential; the only handled
/// failure is the database connection, everything else propagates.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // 1. GDP data (fatal if the connection fails; nothing else can run).
    let mut records = db::load_gdp_records()?;
    names::standardize_records(&mut records);

    // 2. Boundary layers.
    let mut world = geometry::fetch_countries()?;
    let disputed = geometry::fetch_disputed()?;
    let admin1 = geometry::fetch_admin1()?;

    // 3. Pre-join territorial edits on the country table. These only touch
    //    geometry (and drop Somaliland), so the join keys stay intact.
    territory::merge_cyprus(&mut world, &disputed)?;
    territory::merge_somalia(&mut world, &disputed)?;

    // 4. Join, then the post-join Crimea reassignment (Russia/Ukraine must
    //    have been joined under their original identities first).
    let working_crs = world.crs.clone();
    let mut merged = processing::merge(world, &records);
    territory::reassign_crimea(&mut merged, &admin1, &working_crs)?;

    // 5. Classify and render.
    processing::classify_all(&mut merged);
    render::render_map(&merged)?;

    Ok(())
}
