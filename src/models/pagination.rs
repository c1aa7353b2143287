use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationCursor {
    pub offset: u32,
    pub limit: NonZeroU32,
    pub datetime: Option<DateTime<Utc>>,
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: default_limit(),
            datetime: None,
        }
    }
}

fn default_limit() -> NonZeroU32 {
    NonZeroU32::new(DEFAULT_LIMIT).unwrap_or(NonZeroU32::MIN)
}

impl PaginationCursor {
    /// Builds a cursor from optional parts; a missing or zero limit falls back to the default.
    pub fn from_parts(
        offset: Option<u32>,
        limit: Option<u32>,
        datetime: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: limit.and_then(NonZeroU32::new).unwrap_or_else(default_limit),
            datetime,
        }
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_datetime(mut self, datetime: DateTime<Utc>) -> Self {
        self.datetime = Some(datetime);
        self
    }

    pub fn next(self) -> Self {
        Self {
            offset: self.offset.saturating_add(self.limit.get()),
            ..self
        }
    }

    /// Slices an in-memory list the way the server applies offset/limit.
    pub fn window<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit.get() as usize)
            .collect()
    }
}
