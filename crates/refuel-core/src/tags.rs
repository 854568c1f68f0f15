//! Names of tagged waypoints.
//!
//! Tags are the schedule-independent handles other components use to find
//! a point on a path: `"<airplane>_<suffix>"`.

pub const FIRST_POINT: &str = "first_point";
pub const TAKEOFF_POINT: &str = "takeoff_point";
pub const ASCENDED_POINT: &str = "ascended_point";
pub const DESCENT_POINT: &str = "descent_point";
pub const LANDING_POINT: &str = "landing_point";
pub const LANDED_POINT: &str = "landed_point";
pub const ARC_START_POINT: &str = "arc_start_point";
pub const ARC_END_POINT: &str = "arc_end_point";
pub const DESCENT_TO_AIRLINER_POINT: &str = "descent_to_airliner_point";
pub const DOCKING_POINT: &str = "on_airliner_docking_point";
pub const UNDOCKING_POINT: &str = "on_airliner_undocking_point";
pub const ASCENDED_FROM_AIRLINER_POINT: &str = "ascended_from_airliner_point";
pub const LOWERING_POINT: &str = "lowering_point";
pub const LOWERED_POINT: &str = "lowered_point";

pub fn tag(airplane: &str, suffix: &str) -> String {
    format!("{airplane}_{suffix}")
}

pub fn docking_point(uav: &str) -> String {
    tag(uav, DOCKING_POINT)
}

pub fn undocking_point(uav: &str) -> String {
    tag(uav, UNDOCKING_POINT)
}

pub fn curve_start_point(airplane: &str, airport: &str) -> String {
    format!("{airplane}_curve_over_{airport}_start_point")
}

pub fn curve_end_point(airplane: &str, airport: &str) -> String {
    format!("{airplane}_curve_over_{airport}_end_point")
}
