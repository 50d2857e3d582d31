/// How two business sectors relate for partnership purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorRelation {
    /// Same sector: direct competitors
    Same,
    /// Different sectors that commonly refer customers to each other
    Complementary,
    /// Different sectors with no known link
    Unrelated,
}

impl SectorRelation {
    /// Contribution to compatibility (0-1)
    pub const fn factor(self) -> f64 {
        match self {
            SectorRelation::Complementary => 1.0,
            SectorRelation::Unrelated => 0.5,
            SectorRelation::Same => 0.2,
        }
    }
}

/// Pairs of sectors that complement each other. Order within a pair is
/// irrelevant.
const COMPLEMENTARY_SECTORS: &[(&str, &str)] = &[
    ("restaurant", "retail"),
    ("restaurant", "hospitality"),
    ("restaurant", "tourism"),
    ("restaurant", "events"),
    ("cafe", "bakery"),
    ("cafe", "retail"),
    ("retail", "ecommerce"),
    ("retail", "fashion"),
    ("hospitality", "tourism"),
    ("health", "fitness"),
    ("health", "pharmacy"),
    ("fitness", "nutrition"),
    ("beauty", "fashion"),
    ("beauty", "wellness"),
    ("wellness", "fitness"),
    ("real estate", "construction"),
    ("real estate", "insurance"),
    ("real estate", "legal"),
    ("construction", "home services"),
    ("legal", "accounting"),
    ("accounting", "finance"),
    ("automotive", "insurance"),
    ("education", "technology"),
    ("technology", "marketing"),
    ("events", "photography"),
];

/// Lowercase, trim and collapse separators so "Real_Estate" and
/// "real estate" compare equal
pub fn normalize_sector(sector: &str) -> String {
    sector
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Symmetric relation between two sectors
pub fn sector_relation(a: &str, b: &str) -> SectorRelation {
    let a = normalize_sector(a);
    let b = normalize_sector(b);

    if a == b {
        return SectorRelation::Same;
    }

    let complementary = COMPLEMENTARY_SECTORS
        .iter()
        .any(|(x, y)| (*x == a && *y == b) || (*x == b && *y == a));

    if complementary {
        SectorRelation::Complementary
    } else {
        SectorRelation::Unrelated
    }
}
