mod common;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use polar_axis_sim::celestial::CelestialCoordinate;
use polar_axis_sim::mount::AxisMisalignment;
use polar_axis_sim::mount_errors::MountError;
use polar_axis_sim::simulation::{simulate, simulate_batch, SimulationParams};
use polar_axis_sim::time::parse_utc;

use crate::common::{assert_sky_close, wrap_pi};

#[test]
fn reference_scenario() {
    let result = simulate(&SimulationParams::default()).unwrap();

    // the mount axis sits one degree above and one degree east of the pole
    assert_relative_eq!(result.axis.direction.altitude(), 41.0, epsilon = 1e-9);
    assert_relative_eq!(result.axis.direction.azimuth(), 1.0, epsilon = 1e-9);

    for angle in result.step_angles().unwrap() {
        assert_abs_diff_eq!(angle.to_degrees(), 30.0, epsilon = 1e-6);
    }

    let [c1, c2, c3] = result.celestial_coordinates();
    for c in [c1, c2, c3] {
        assert!((0.0..360.0).contains(&c.ra_deg()));
        assert!((-90.0..=90.0).contains(&c.dec_deg()));
    }

    // alt 20°, az 70° seen from latitude 40° at LAST ≈ 6.66 h
    assert_abs_diff_eq!(c1.ra_deg(), 186.38, epsilon = 0.1);
    assert_abs_diff_eq!(c1.dec_deg(), 27.78, epsilon = 0.1);

    for (a, b) in [(c1, c2), (c2, c3)] {
        let separation = a.separation(&b).to_degrees();
        assert!(separation > 20.0 && separation < 33.0, "{separation}");
    }
    assert!(c1.separation(&c3).to_degrees() > 40.0);
}

#[test]
fn aligned_axis_keeps_declination() {
    let step = 25.0_f64;
    let params = SimulationParams::builder()
        .misalignment(0.0, 0.0)
        .step(step)
        .refraction(false)
        .build()
        .unwrap();
    let result = simulate(&params).unwrap();

    let [a1, a2, a3] = result.points.map(|p| p.apparent);
    assert_abs_diff_eq!(a1.declination, a2.declination, epsilon = 1e-9);
    assert_abs_diff_eq!(a2.declination, a3.declination, epsilon = 1e-9);

    // the sky turns westward: the hour angle grows, the right ascension decreases
    for (from, to) in [(a1, a2), (a2, a3)] {
        assert_abs_diff_eq!(
            wrap_pi(to.hour_angle - from.hour_angle),
            step.to_radians(),
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            wrap_pi(from.right_ascension - to.right_ascension),
            step.to_radians(),
            epsilon = 1e-9
        );
    }
}

#[test]
fn j2000_close_to_place_of_date() {
    let result = simulate(&SimulationParams::default()).unwrap();
    for point in result.points.iter() {
        let of_date = CelestialCoordinate::new(
            point.apparent.right_ascension,
            point.apparent.declination,
        )
        .unwrap();
        // nutation and annual aberration only, a few tens of arcseconds
        assert_sky_close(&point.icrs, &of_date, 72.0);
    }
}

#[test]
fn refraction_lowers_first_point() {
    let with = simulate(&SimulationParams::default()).unwrap();
    let without = simulate(&SimulationParams {
        refraction: false,
        ..SimulationParams::default()
    })
    .unwrap();

    let shift = with.points[0]
        .icrs
        .separation(&without.points[0].icrs)
        .to_degrees()
        * 3600.0;
    assert!(shift > 120.0 && shift < 200.0, "{shift}");

    for (a, b) in with.points.iter().zip(without.points.iter()) {
        assert_eq!(a.observed, b.observed);
        assert!(a.icrs != b.icrs);
    }
}

#[test]
fn zero_step_repeats_the_first_point() {
    let params = SimulationParams::builder().step(0.0).build().unwrap();
    let result = simulate(&params).unwrap();

    let [c1, c2, c3] = result.celestial_coordinates();
    assert_sky_close(&c1, &c2, 1e-6);
    assert_sky_close(&c1, &c3, 1e-6);
    for angle in result.step_angles().unwrap() {
        assert_abs_diff_eq!(angle, 0.0, epsilon = 1e-12);
    }
}

#[test]
fn negative_step_turns_backward() {
    let forward = simulate(&SimulationParams::default()).unwrap();
    let backward = simulate(&SimulationParams {
        step: -30.0,
        ..SimulationParams::default()
    })
    .unwrap();

    for angle in backward.step_angles().unwrap() {
        assert_abs_diff_eq!(angle.to_degrees(), -30.0, epsilon = 1e-6);
    }
    // same starting pointing, mirrored trajectory
    assert_eq!(forward.points[0], backward.points[0]);
    assert!(forward.points[1].icrs.separation(&backward.points[1].icrs) > 0.1);
}

#[test]
fn simulation_is_deterministic() {
    let params = SimulationParams::builder()
        .latitude(-31.25)
        .longitude(149.07)
        .height(1165.0)
        .misalignment(-0.4, 0.75)
        .step(15.0)
        .initial_point(55.0, 200.0)
        .epoch(parse_utc("2024-03-20T03:06:00").unwrap())
        .dut1(-0.25)
        .build()
        .unwrap();

    assert_eq!(simulate(&params).unwrap(), simulate(&params).unwrap());
}

#[test]
fn batch_preserves_order() {
    let scenarios: Vec<SimulationParams> = [10.0, 20.0, 30.0, 40.0, 50.0]
        .into_iter()
        .map(|step| SimulationParams {
            step,
            ..SimulationParams::default()
        })
        .chain(std::iter::once(SimulationParams {
            latitude: 95.0,
            ..SimulationParams::default()
        }))
        .collect();

    let results = simulate_batch(&scenarios);
    assert_eq!(results.len(), scenarios.len());

    for (params, result) in scenarios.iter().zip(results.iter()).take(5) {
        assert_eq!(result, &simulate(params));
        let angles = result.as_ref().unwrap().step_angles().unwrap();
        assert_abs_diff_eq!(angles[0].to_degrees(), params.step, epsilon = 1e-6);
    }
    assert_eq!(results[5], Err(MountError::InvalidLatitude(95.0)));
}

#[test]
fn invalid_inputs_are_rejected() {
    let params = SimulationParams {
        initial_altitude: f64::INFINITY,
        ..SimulationParams::default()
    };
    assert_eq!(
        simulate(&params),
        Err(MountError::NonFiniteValue("altitude"))
    );

    let params = SimulationParams {
        humidity: -0.1,
        ..SimulationParams::default()
    };
    assert_eq!(simulate(&params), Err(MountError::InvalidHumidity(-0.1)));

    let params = SimulationParams {
        misalignment: AxisMisalignment {
            azimuth: 1.0,
            altitude: f64::NAN,
        },
        ..SimulationParams::default()
    };
    assert_eq!(
        simulate(&params),
        Err(MountError::NonFiniteValue("misalignment altitude"))
    );
}

/// Astropy (IERS ΔUT1 = 0.3554 s) positions of the reference scenario.
#[test]
fn reference_scenario_matches_astropy() {
    let params = SimulationParams::builder().dut1(0.3554).build().unwrap();
    let result = simulate(&params).unwrap();

    let expected = [
        (186.4193401, 27.75369312),
        (156.6798968, 27.40124463),
        (127.00972423, 27.34989335),
    ];
    for (actual, (ra, dec)) in result.celestial_coordinates().iter().zip(expected) {
        let expected = CelestialCoordinate::from_degrees(ra, dec).unwrap();
        assert_sky_close(actual, &expected, 1.0);
    }
}

#[test]
fn refraction_stays_bounded_near_horizon() {
    for altitude in [-10.0, -1.0, 0.0, 0.5, 2.0, 5.0] {
        let with = simulate(&SimulationParams {
            initial_altitude: altitude,
            ..SimulationParams::default()
        })
        .unwrap();
        let without = simulate(&SimulationParams {
            initial_altitude: altitude,
            refraction: false,
            ..SimulationParams::default()
        })
        .unwrap();

        let shift = with.points[0]
            .icrs
            .separation(&without.points[0].icrs)
            .to_degrees()
            * 3600.0;
        assert!(shift > 500.0 && shift < 700.0, "alt {altitude}°: {shift}″");
    }
}
