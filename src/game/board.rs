//! Board squares
//!
//! The board is a fixed ring of 16 campus locations. Square 0 is Start and has
//! no physical location.

use serde::Serialize;

/// A (latitude, longitude) pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// One position on the board
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Square {
    pub id: usize,
    pub name: &'static str,
    /// Tile colour token
    pub color: &'static str,
    /// None for Start
    pub location: Option<Coordinates>,
    /// Overrides the configured gate threshold for this square
    pub leniency: Option<f64>,
}

impl Square {
    const fn start() -> Self {
        Self {
            id: START_SQUARE,
            name: "Start",
            color: "#3c3e4c",
            location: None,
            leniency: None,
        }
    }

    const fn at(id: usize, name: &'static str, color: &'static str, lat: f64, lon: f64) -> Self {
        Self {
            id,
            name,
            color,
            location: Some(Coordinates::new(lat, lon)),
            leniency: None,
        }
    }

    /// Start is exempt from location gating
    pub fn is_start(&self) -> bool {
        self.id == START_SQUARE
    }
}

pub const START_SQUARE: usize = 0;

/// Number of squares on the board
pub const SQUARE_COUNT: usize = 16;

// East Park and Peter Chalk still share the Forum's coordinates.
pub static SQUARES: [Square; SQUARE_COUNT] = [
    Square::start(),
    Square::at(1, "Birks Grange", "#7f95d1", 50.73655640077589, -3.5426938147256894),
    Square::at(2, "East Park", "#558564", 50.7352025, -3.5331998),
    Square::at(3, "Peter Chalk", "#7f2982", 50.7352025, -3.5331998),
    Square::at(4, "Forum", "#ea526f", 50.7352025, -3.5331998),
    Square::at(5, "Great Hall", "#558564", 50.7354678, -3.5346157),
    Square::at(6, "Reed Hall", "#7f95d1", 50.7288, -3.5060),
    Square::at(7, "Harrison", "#e98a15", 50.7288, -3.5060),
    Square::at(8, "Innovation Centre", "#7f2982", 50.7383339, -3.5307875),
    Square::at(9, "INTO Building", "#ea526f", 50.7288, -3.5060),
    Square::at(10, "Streatham Court", "#558564", 50.7288, -3.5060),
    Square::at(11, "Hatherly", "#7f95d1", 50.734187, -3.533157),
    Square::at(12, "Old Library", "#e98a15", 50.7333275, -3.5343472),
    Square::at(13, "Queens", "#7f2982", 50.7342858, -3.5344508),
    Square::at(14, "Amory", "#ea526f", 50.7364241, -3.5316993),
    Square::at(15, "Business School", "#558564", 50.7288, -3.5060),
];

/// Look up a square by id
pub fn square(id: usize) -> Option<&'static Square> {
    SQUARES.get(id)
}

/// Square at an avatar position, which is always a valid index
pub fn square_at(position: usize) -> &'static Square {
    &SQUARES[position % SQUARE_COUNT]
}

/// Move forward `steps` squares, wrapping past the last square
pub fn advance(position: usize, steps: u8) -> usize {
    (position + steps as usize) % SQUARE_COUNT
}

/// Clamp a persisted square id onto the board
pub fn normalize_position(raw: i64) -> usize {
    raw.rem_euclid(SQUARE_COUNT as i64) as usize
}
