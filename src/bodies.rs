//! Body-name classification
//!
//! Aspect feeds name bodies inconsistently (`Medium_Coeli`, `MC`, `Midheaven`,
//! `Imum Coeli`...). Names are folded to lowercase snake_case before lookup.

const LUMINARIES: &[&str] = &["sun", "moon"];
const PERSONAL: &[&str] = &["sun", "moon", "mercury", "venus", "mars"];
const OUTER: &[&str] = &["jupiter", "saturn", "uranus", "neptune", "pluto"];
const ANGLES: &[&str] = &[
    "ascendant",
    "asc",
    "descendant",
    "dsc",
    "dc",
    "medium_coeli",
    "midheaven",
    "mc",
    "imum_coeli",
    "ic",
];
const POINTS: &[&str] = &[
    "chiron",
    "mean_node",
    "true_node",
    "north_node",
    "south_node",
    "mean_south_node",
    "true_south_node",
    "mean_lilith",
    "true_lilith",
    "vertex",
    "fortune",
];

/// Fold a body name to its lookup key
pub fn canonical_body_key(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

fn in_set(set: &[&str], name: &str) -> bool {
    let key = canonical_body_key(name);
    set.contains(&key.as_str())
}

pub fn is_moon(name: &str) -> bool {
    canonical_body_key(name) == "moon"
}

pub fn is_luminary(name: &str) -> bool {
    in_set(LUMINARIES, name)
}

pub fn is_personal(name: &str) -> bool {
    in_set(PERSONAL, name)
}

pub fn is_outer(name: &str) -> bool {
    in_set(OUTER, name)
}

pub fn is_angle(name: &str) -> bool {
    in_set(ANGLES, name)
}

/// Nodes, Lilith, Chiron and other calculated points (not angles)
pub fn is_calculated_point(name: &str) -> bool {
    in_set(POINTS, name)
}

/// Anything that is not a physical body: calculated points and angles
pub fn is_point(name: &str) -> bool {
    is_calculated_point(name) || is_angle(name)
}
