#![forbid(unsafe_code)]

//! Core: geometry primitives and canonical input events shared by the flyout
//! menu engine and its hosts.

pub mod event;
pub mod geometry;

pub use geometry::{Point, Rect, Sides, Size};
