pub mod calculator;
pub mod commands;
pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod tasks;
pub mod timetable;
pub mod voting;
