// folium-common: shared types and utilities for the Folium workspace

pub mod link;
pub mod patch;
pub mod types;
