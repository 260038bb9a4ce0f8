//! End-to-end scenarios against the synchronous session API.

use turn_navigator::{
    geo_utils, CameraMode, GpsPoint, LocationFix, Maneuver, NavigationCommand, NavigationConfig,
    NavigationSession, RequestPurpose, Route, RouteSet, SessionState, Step,
};

const LNG: f64 = -0.1278;
const START_LAT: f64 = 51.5;
// ~10 m of latitude
const SPACING: f64 = 0.00009;

/// North-bound polyline of `segments` ~10 m segments starting at vertex `first`.
fn polyline(first: usize, segments: usize) -> Vec<GpsPoint> {
    (first..=first + segments).map(vertex).collect()
}

fn vertex(g: usize) -> GpsPoint {
    GpsPoint::new(START_LAT + g as f64 * SPACING, LNG)
}

/// Steps of ~500, ~300 and ~200 m.
fn three_step_route() -> Route {
    Route::from_steps(vec![
        Step::from_geometry(polyline(0, 50), 60.0, Maneuver::new("depart", "Head north")),
        Step::from_geometry(polyline(50, 30), 40.0, Maneuver::new("continue", "Continue onto High St")),
        Step::from_geometry(polyline(80, 20), 25.0, Maneuver::new("continue", "Continue to destination")),
    ])
    .unwrap()
}

fn single_step_route(offset_deg: f64) -> Route {
    let geometry: Vec<GpsPoint> = (0..=30)
        .map(|g| GpsPoint::new(START_LAT + g as f64 * SPACING, LNG + offset_deg))
        .collect();
    Route::from_steps(vec![Step::from_geometry(geometry, 40.0, Maneuver::new("depart", "Alternative"))]).unwrap()
}

fn start_session(alternates: Vec<Route>) -> NavigationSession {
    let mut session = NavigationSession::new(NavigationConfig::default());
    session.on_location(LocationFix::new(START_LAT, LNG, 0), 0);

    let route = three_step_route();
    let destination = route.end_point().unwrap();
    let request = session.begin_start(destination, None, 0).unwrap();
    session
        .apply_route_response(&request, Some(RouteSet::new(route, alternates)), 0)
        .unwrap();
    session.confirm_start(0).unwrap();
    session.drain_commands();
    session
}

fn reroute_requests(commands: &[NavigationCommand]) -> usize {
    commands
        .iter()
        .filter(|c| {
            matches!(c, NavigationCommand::RequestRoute { request } if request.purpose == RequestPurpose::Reroute)
        })
        .count()
}

#[test]
fn scenario_walk_three_steps_to_arrival() {
    let mut session = start_session(vec![]);
    let route = three_step_route();

    let mut advanced_at = Vec::new();
    let mut arrived_at = None;
    let mut previous_index = 0;

    for g in 1..=100 {
        let now = g as u64 * 1000;
        let point = vertex(g);
        session.on_location(LocationFix::new(point.latitude, point.longitude, now), now);
        session.advance(now);

        let progress = *session.progress().state();
        if progress.current_step_index != previous_index {
            advanced_at.push((g, progress.current_step_index));
            previous_index = progress.current_step_index;
        }
        let step = route.step(progress.current_step_index).unwrap();
        assert!(progress.distance_along_step >= 0.0);
        assert!(progress.distance_along_step <= step.distance());

        if session.state() == SessionState::Arrived {
            arrived_at = Some(g);
            break;
        }
    }

    // Advances exactly when less than 15 m remain (one ~10 m vertex before the end)
    assert_eq!(advanced_at, vec![(49, 1), (79, 2)]);
    // Arrival when within 20 m of the final coordinate
    assert_eq!(arrived_at, Some(99));
    assert!(session.snapshot(99_000).has_arrived);

    session.advance(99_000 + 2_999);
    assert_eq!(session.state(), SessionState::Arrived);
    session.advance(99_000 + 3_000);
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn scenario_off_route_issues_one_reroute_per_window() {
    let mut session = start_session(vec![]);
    let on_route = vertex(10);
    let offset = geo_utils::meters_to_degrees(50.0, on_route.latitude);
    let off = |t: u64| LocationFix::new(on_route.latitude, on_route.longitude + offset, t);

    session.on_location(off(500), 500);
    assert!(session.snapshot(500).is_off_route);

    let mut requests = reroute_requests(&session.drain_commands());
    for t in (1_000..=3_500).step_by(500) {
        session.on_location(off(t), t);
        session.advance(t);
        requests += reroute_requests(&session.drain_commands());
    }
    assert_eq!(requests, 1);
    assert!(session.off_route().is_rerouting());
}

#[test]
fn scenario_failed_reroute_retries_after_window() {
    let mut session = start_session(vec![]);
    let on_route = vertex(10);
    let offset = geo_utils::meters_to_degrees(50.0, on_route.latitude);
    session.on_location(LocationFix::new(on_route.latitude, on_route.longitude + offset, 0), 0);

    let request = session
        .drain_commands()
        .into_iter()
        .find_map(|c| match c {
            NavigationCommand::RequestRoute { request } => Some(request),
            _ => None,
        })
        .unwrap();
    assert_eq!(session.apply_route_response(&request, None, 100), Ok(false));

    let mut issued = Vec::new();
    for t in (1_000..=7_000).step_by(1_000) {
        session.advance(t);
        if reroute_requests(&session.drain_commands()) > 0 {
            issued.push(t);
            assert!(session.snapshot(t).is_rerouting);
            break;
        }
    }
    assert_eq!(issued, vec![4_000]);
}

#[test]
fn scenario_camera_yields_to_pan_for_eight_seconds() {
    let mut session = start_session(vec![]);

    session.report_user_interaction(0);
    assert_eq!(session.snapshot(0).camera_mode, CameraMode::UserControlled);

    session.advance(7_999);
    assert_eq!(session.camera().mode(), CameraMode::UserControlled);
    assert!(session.snapshot(7_999).is_user_controlling_camera);

    session.advance(8_001);
    assert_eq!(session.camera().mode(), CameraMode::AutoFollow);
    let recentered = session
        .drain_commands()
        .iter()
        .any(|c| matches!(c, NavigationCommand::MoveCamera { .. }));
    assert!(recentered);
}

#[test]
fn scenario_switch_to_alternative_rotates_routes() {
    let alt0 = single_step_route(0.0002);
    let alt1 = single_step_route(0.0004);
    let mut session = start_session(vec![alt0.clone(), alt1.clone()]);

    for g in 1..=61 {
        let point = vertex(g);
        session.on_location(LocationFix::new(point.latitude, point.longitude, g as u64 * 100), g as u64 * 100);
    }
    assert_eq!(session.progress().state().current_step_index, 1);

    let generation = session.generation();
    session.switch_to_alternative(0).unwrap();

    assert_eq!(session.route(), Some(&alt0));
    assert_eq!(session.alternates(), &[three_step_route(), alt1][..]);
    assert_eq!(session.progress().state().current_step_index, 0);
    assert_eq!(session.progress().state().distance_along_step, 0.0);
    assert!(session.generation() > generation);
}

#[test]
fn stop_cancels_all_timers() {
    let mut session = start_session(vec![]);
    session.report_user_interaction(100);
    assert!(session.next_timer_deadline().is_some());

    session.stop();
    assert_eq!(session.next_timer_deadline(), None);
    session.advance(60_000);
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.drain_commands().is_empty());
}
