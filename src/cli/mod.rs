pub mod analysis;
pub mod list;
pub mod sectors;
pub mod setup;
pub mod ui;
