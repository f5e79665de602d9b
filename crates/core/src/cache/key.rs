//! Request cache key.

use std::fmt;

use crate::dates::{DateRange, format_date};

/// Identity of one availability request: property, room type and date window.
///
/// Two requests with equal keys are interchangeable for caching, whatever
/// part of the widget issued them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub property_id: String,
    pub room_type_id: String,
    pub range: DateRange,
}

impl CacheKey {
    pub fn new(property_id: impl Into<String>, room_type_id: impl Into<String>, range: DateRange) -> Self {
        Self { property_id: property_id.into(), room_type_id: room_type_id.into(), range }
    }

    /// `startDate` query value.
    pub fn start_param(&self) -> String {
        format_date(self.range.start())
    }

    /// `endDate` query value.
    pub fn end_param(&self) -> String {
        format_date(self.range.end())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}_{}", self.property_id, self.room_type_id, self.start_param(), self.end_param())
    }
}
