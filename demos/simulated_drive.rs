//! Drive a simulated trip through the async navigator with in-process providers.
//!
//! The traveler follows the route, drifts off it for a few fixes, gets
//! rerouted, and arrives. Time runs on tokio's paused clock, so the whole
//! trip completes instantly.
//!
//! Run with: cargo run --example simulated_drive

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use turn_navigator::{
    format_distance, format_duration, geo_utils, CameraPose, CameraSurface, DirectionsProvider,
    GpsPoint, LocationFix, Maneuver, MapMatchingProvider, NavigationConfig, Navigator,
    ProviderFuture, Route, RouteRequest, RouteSet, SnapRequest, Step,
};

const LNG: f64 = -0.1278;

/// Straight north-bound route from `from` to `to` latitude, split into two steps.
fn straight_route(from: f64, to: f64) -> Route {
    let mid = (from + to) / 2.0;
    let polyline = |a: f64, b: f64| -> Vec<GpsPoint> {
        let n = ((b - a) / 0.0001).round() as usize;
        (0..=n).map(|i| GpsPoint::new(a + i as f64 * 0.0001, LNG)).collect()
    };
    Route::from_steps(vec![
        Step::from_geometry(polyline(from, mid), 60.0, Maneuver::new("depart", "Head north")),
        Step::from_geometry(polyline(mid, to), 60.0, Maneuver::new("continue", "Continue straight")),
    ])
    .expect("route has geometry")
}

struct SimulatedDirections {
    calls: AtomicUsize,
}

impl DirectionsProvider for SimulatedDirections {
    fn get_route<'a>(&'a self, request: &'a RouteRequest) -> ProviderFuture<'a, Option<RouteSet>> {
        Box::pin(async move {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(300)).await;
            println!("  directions #{} ({:?}, {})", n, request.purpose, request.profile);
            let route = straight_route(request.origin.latitude, request.destination.latitude);
            Ok(Some(RouteSet::new(route, vec![])))
        })
    }
}

struct EchoMatcher;

impl MapMatchingProvider for EchoMatcher {
    fn snap<'a>(&'a self, request: &'a SnapRequest) -> ProviderFuture<'a, Option<GpsPoint>> {
        Box::pin(async move {
            Ok(request
                .fixes
                .last()
                .map(|f| GpsPoint::new(f.latitude, LNG)))
        })
    }
}

struct PrintingCamera;

impl CameraSurface for PrintingCamera {
    fn apply_pose(&self, pose: &CameraPose) {
        println!(
            "  camera -> {:.5},{:.5} bearing {:.0} zoom {}",
            pose.center.latitude, pose.center.longitude, pose.bearing, pose.zoom
        );
    }

    fn center(&self) -> Option<GpsPoint> {
        None
    }

    fn viewport_height(&self) -> Option<f64> {
        Some(900.0)
    }
}

#[tokio::main(flavor = "current_thread", start_paused = true)]
async fn main() {
    let navigator = Navigator::new(
        NavigationConfig::default(),
        SimulatedDirections { calls: AtomicUsize::new(0) },
        EchoMatcher,
        PrintingCamera,
    )
    .expect("default config is valid");

    let start = 51.5074;
    let destination = GpsPoint::new(51.5110, LNG);

    navigator.push_location(LocationFix::new(start, LNG, 0)).await;
    if let Err(e) = navigator.start_navigation(destination, None).await {
        eprintln!("Could not start: {}", e);
        return;
    }
    let preview = navigator.snapshot().await;
    println!(
        "Preview: {} / {}",
        format_distance(preview.total_distance),
        format_duration(preview.total_duration)
    );

    navigator.confirm_start().await.expect("previewing");

    // ~11 m per second northbound, drifting 60 m east between fixes 12 and 15
    for second in 1..=40u64 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let lat = start + second as f64 * 0.0001;
        let lng = if (12..=15).contains(&second) {
            LNG + geo_utils::meters_to_degrees(60.0, lat)
        } else {
            LNG
        };
        navigator
            .push_location(LocationFix::new(lat, lng, second * 1000).with_speed(11.1))
            .await;

        let s = navigator.snapshot().await;
        println!(
            "t={:>2}s {:?} step {}/{} \"{}\" in {} | {} left{}{}",
            second,
            s.state,
            s.current_step_index + 1,
            s.total_steps,
            s.current_instruction,
            format_distance(s.distance_to_next_maneuver),
            format_distance(s.remaining_distance),
            if s.is_off_route { " | OFF ROUTE" } else { "" },
            if s.is_rerouting { " | rerouting" } else { "" },
        );

        if s.has_arrived {
            break;
        }
    }

    tokio::time::sleep(Duration::from_secs(4)).await;
    println!("Final state: {:?}", navigator.snapshot().await.state);
}
