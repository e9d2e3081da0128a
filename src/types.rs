use geo::MultiPolygon;

/// One row from the GDP query: the single largest year-over-year real GDP
/// change per country in the 2000-2024 window.
#[derive(Debug, Clone)]
pub struct GdpRecord {
    pub country: String,
    pub year: i32,
    /// Percent change.
    pub biggest_change: f64,
    /// Country name translated to the Natural Earth convention; this is the
    /// join key, filled in by `names::standardize_records`.
    pub standardized: String,
}

/// Coordinate reference system tag, taken verbatim from a shapefile's `.prj`
/// WKT. Comparison ignores whitespace and case.
#[derive(Debug, Clone)]
pub struct Crs(String);

impl Crs {
    pub fn from_wkt(wkt: &str) -> Self {
        Crs(wkt.trim().to_string())
    }

    pub fn as_wkt(&self) -> &str {
        &self.0
    }

    fn normalized(&self) -> String {
        self.0
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase()
    }
}

impl PartialEq for Crs {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

/// A named polygon feature from one of the boundary datasets.
#[derive(Debug, Clone)]
pub struct NamedGeometry {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

/// In-memory shapefile layer: named polygons plus the layer's CRS.
#[derive(Debug, Clone)]
pub struct ShapeTable {
    pub shapes: Vec<NamedGeometry>,
    pub crs: Crs,
}

impl ShapeTable {
    pub fn find(&self, name: &str) -> Option<&NamedGeometry> {
        self.shapes.iter().find(|s| s.name == name)
    }

    pub fn geometry_of(&self, name: &str) -> Option<&MultiPolygon<f64>> {
        self.find(name).map(|s| &s.geometry)
    }

    pub fn replace_geometry(&mut self, name: &str, geometry: MultiPolygon<f64>) -> bool {
        match self.shapes.iter_mut().find(|s| s.name == name) {
            Some(shape) => {
                shape.geometry = geometry;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.shapes.retain(|s| s.name != name);
    }
}

/// Country geometry left-joined with zero-or-one GDP record.
#[derive(Debug, Clone)]
pub struct MergedRecord {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    pub year: Option<i32>,
    pub biggest_change: Option<f64>,
    pub category: ChangeCategory,
}

/// The seven fixed, left-closed GDP change buckets, plus "No data" for
/// geometries without a joined record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCategory {
    DropOver20,
    Drop10To20,
    DropUnder10,
    Gain0To5,
    Gain5To10,
    Gain10To20,
    GainOver20,
    NoData,
}

impl ChangeCategory {
    /// The numeric buckets in ascending order; excludes `NoData`.
    pub const BUCKETS: [ChangeCategory; 7] = [
        ChangeCategory::DropOver20,
        ChangeCategory::Drop10To20,
        ChangeCategory::DropUnder10,
        ChangeCategory::Gain0To5,
        ChangeCategory::Gain5To10,
        ChangeCategory::Gain10To20,
        ChangeCategory::GainOver20,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ChangeCategory::DropOver20 => "<-20",
            ChangeCategory::Drop10To20 => "-20-(-10)",
            ChangeCategory::DropUnder10 => "-10-0",
            ChangeCategory::Gain0To5 => "0-5",
            ChangeCategory::Gain5To10 => "5-10",
            ChangeCategory::Gain10To20 => "10-20",
            ChangeCategory::GainOver20 => ">20",
            ChangeCategory::NoData => "No data",
        }
    }

    /// Index into the 7-entry color palette. `None` for `NoData`.
    pub fn palette_index(&self) -> Option<usize> {
        Self::BUCKETS.iter().position(|b| b == self)
    }
}
