pub mod animation;
pub mod board;
pub mod constants;
pub mod deck;
pub mod driver;
pub mod gate;
pub mod spinner;
pub mod turn;
