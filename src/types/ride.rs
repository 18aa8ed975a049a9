use serde::{Deserialize, Serialize};

use crate::types::activity::{EnrichedTrackPoint, Summary};
use crate::types::photo::Photo;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    pub id: String,
    pub date: String,
    pub name: String,
    pub route: Vec<EnrichedTrackPoint>,
    pub photos: Vec<Photo>,
    pub summary: Summary,
}

/// Top-level payload read by the front-end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RidesDocument {
    pub rides: Vec<Ride>,
}
