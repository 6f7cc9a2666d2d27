use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::BoardId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Board {
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: BoardId::new(),
            name,
            is_archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn archive(&mut self) {
        self.is_archived = true;
        self.updated_at = Utc::now();
    }

    pub fn is_active(&self) -> bool {
        !self.is_archived
    }
}
