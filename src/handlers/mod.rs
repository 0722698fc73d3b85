pub mod group;
pub mod note;
pub mod poll;
pub mod timetable;
pub mod vote;
