//! Queries per table. Every function takes a pooled connection so callers can
//! run several of them on one checkout.

pub mod assignments;
pub mod groups;
pub mod hostels;
pub mod partners;
pub mod persons;
pub mod rooms;
