//! Parse a Directions response and print the turn list with display strings.
//!
//! Run with: cargo run --example route_preview

use turn_navigator::{format_distance, format_duration, RouteSet};

const RESPONSE: &str = r#"{
    "code": "Ok",
    "routes": [
        {
            "distance": 1420.0,
            "duration": 245.0,
            "geometry": { "coordinates": [[-0.1278, 51.5074], [-0.1278, 51.5110], [-0.1340, 51.5110], [-0.1340, 51.5155]] },
            "legs": [{
                "summary": "Whitehall, Charing Cross Rd",
                "steps": [
                    {
                        "distance": 400.0, "duration": 70.0, "name": "Whitehall",
                        "geometry": { "coordinates": [[-0.1278, 51.5074], [-0.1278, 51.5110]] },
                        "maneuver": { "type": "depart", "instruction": "Head north on Whitehall", "location": [-0.1278, 51.5074] }
                    },
                    {
                        "distance": 430.0, "duration": 80.0, "name": "Strand",
                        "geometry": { "coordinates": [[-0.1278, 51.5110], [-0.1340, 51.5110]] },
                        "maneuver": { "type": "turn", "modifier": "left", "instruction": "Turn left onto Strand", "location": [-0.1278, 51.5110] }
                    },
                    {
                        "distance": 590.0, "duration": 95.0, "name": "Charing Cross Rd",
                        "geometry": { "coordinates": [[-0.1340, 51.5110], [-0.1340, 51.5155]] },
                        "maneuver": { "type": "turn", "modifier": "right", "instruction": "Turn right onto Charing Cross Rd", "location": [-0.1340, 51.5110] }
                    },
                    {
                        "distance": 0.0, "duration": 0.0, "name": "",
                        "geometry": { "coordinates": [[-0.1340, 51.5155], [-0.1340, 51.5155]] },
                        "maneuver": { "type": "arrive", "instruction": "You have arrived", "location": [-0.1340, 51.5155] }
                    }
                ]
            }]
        }
    ]
}"#;

fn main() {
    let Some(routes) = RouteSet::from_directions_json(RESPONSE.as_bytes()) else {
        eprintln!("No usable route in response");
        return;
    };

    let route = &routes.primary;
    println!("Route Preview\n");
    println!(
        "{} / {} / {} steps ({} alternatives)\n",
        format_distance(route.distance()),
        format_duration(route.duration()),
        route.step_count(),
        routes.alternates.len()
    );

    for (i, step) in route.steps().enumerate() {
        let maneuver = step.maneuver();
        println!(
            "{:>2}. {:<36} {:>8}  [{}{}]",
            i + 1,
            maneuver.instruction(),
            format_distance(step.distance()),
            maneuver.kind(),
            maneuver.modifier().map(|m| format!(" {}", m)).unwrap_or_default()
        );
    }

    if let Some(bounds) = routes.overview_bounds() {
        let center = bounds.center();
        println!("\nOverview centered on {:.4},{:.4}", center.latitude, center.longitude);
    }
}
