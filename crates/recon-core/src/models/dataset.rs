//! Dataset model (spec §3). Ephemeral: fetched once per run, never mutated.

use super::ids::DatasetId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dataset {
    pub accession_id: DatasetId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}
