//! Domain model for the timetable ingestion pipeline.
//!
//! The types here fall into three groups:
//!
//! - [`time`]: minute-resolution wall-clock times (`"HH:MM"`) and ranges.
//! - [`slot`]: the ephemeral shapes produced by parsing — raw cell tokens
//!   and [`ParsedSlotEntry`], the unit that flows through the pipeline.
//! - [`entities`]: the durable reference entities (section, subject, room,
//!   faculty) and the persisted schedule entry, each keyed by a natural
//!   human-meaningful code.

pub mod entities;
pub mod slot;
pub mod time;

pub use entities::{
    EntityId, EntryStatus, Faculty, Room, RoomKind, ScheduleEntry, Section, Subject,
};
pub use slot::{CellRef, ClassType, ParsedSlotEntry, RawCellToken, Weekday};
pub use time::{TimeOfDay, TimeRange};
