/// TMDB genre ids keyed by the lowercase name users type, in menu order.
pub const GENRES: &[(&str, u32)] = &[
    ("action", 28),
    ("adventure", 12),
    ("animation", 16),
    ("comedy", 35),
    ("crime", 80),
    ("documentary", 99),
    ("drama", 18),
    ("family", 10751),
    ("fantasy", 14),
    ("history", 36),
    ("horror", 27),
    ("music", 10402),
    ("mystery", 9648),
    ("romance", 10749),
    ("sci-fi", 878),
    ("thriller", 53),
    ("war", 10752),
    ("western", 37),
];

/// Original-language codes for a regional label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionCodes {
    Single(&'static str),
    Group(&'static [&'static str]),
}

impl RegionCodes {
    pub fn codes(self) -> Vec<&'static str> {
        match self {
            RegionCodes::Single(code) => vec![code],
            RegionCodes::Group(codes) => codes.to_vec(),
        }
    }
}

pub const REGIONS: &[(&str, RegionCodes)] = &[
    ("punjabi", RegionCodes::Single("pa")),
    // Telugu, Tamil, Malayalam, Kannada
    ("south", RegionCodes::Group(&["te", "ta", "ml", "kn"])),
    ("tamil", RegionCodes::Single("ta")),
    ("telugu", RegionCodes::Single("te")),
    ("malayalam", RegionCodes::Single("ml")),
    ("kannada", RegionCodes::Single("kn")),
    ("bengali", RegionCodes::Single("bn")),
    ("marathi", RegionCodes::Single("mr")),
];

pub fn genre_id(name: &str) -> Option<u32> {
    let lower = name.trim().to_lowercase();
    GENRES
        .iter()
        .find(|(key, _)| *key == lower)
        .map(|(_, id)| *id)
}

/// First genre (in map order) whose name appears anywhere in `text`.
pub fn genre_mentioned_in(text: &str) -> Option<&'static str> {
    GENRES
        .iter()
        .map(|(key, _)| *key)
        .find(|key| text.contains(key))
}

pub fn region_codes(label: &str) -> Option<RegionCodes> {
    let lower = label.trim().to_lowercase();
    REGIONS
        .iter()
        .find(|(key, _)| *key == lower)
        .map(|(_, codes)| *codes)
}

pub fn region_mentioned_in(text: &str) -> Option<&'static str> {
    REGIONS
        .iter()
        .map(|(key, _)| *key)
        .find(|key| text.contains(key))
}
