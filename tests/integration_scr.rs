//! Integration tests for the SCR engine, power-angle relations and session.

mod common;

use common::{assert_close, reference_line, reference_system, small_transformer};
use scr_calc::ScrError;
use scr_calc::config::ScenarioConfig;
use scr_calc::model::{Rl, System};
use scr_calc::power_angle::{
    DropLimits, OperatingRequest, current_drop_limit, current_drop_limit_exact, delta_from_p,
    operating_point, p_max, p_of_delta,
};
use scr_calc::scr::{compute_scr, solve_line_rl_for_target_scr};
use scr_calc::session::{LineInputs, OperatingInputs, ScrInputs, Session};
use scr_calc::sweep::sweep;

#[test]
fn reference_scenario_scr() {
    let sys = reference_system();
    let res = compute_scr(&sys, reference_line(), Rl::default()).expect("valid scenario");

    let x = 2.0 * std::f64::consts::PI * 60.0 * 7.5e-5;
    assert_close(res.zth, x, 1e-12, "Zth");
    assert_close(res.s_sc, 380.0 * 380.0 / x, 1e-12, "S_sc");
    assert!((res.scr - 20.43).abs() < 0.01, "SCR = {}", res.scr);
    // Equal-voltage source: current ratio equals SCR.
    assert_close(res.i_ratio, res.scr, 1e-12, "I_ratio");
}

#[test]
fn target_solve_round_trips_across_targets_and_ratios() {
    let sys = reference_system();
    let tr = small_transformer();
    for target in [1.5, 3.0, 5.0, 10.0] {
        for rho in [0.0, 10.0, 100.0, 400.0] {
            let line = solve_line_rl_for_target_scr(&sys, target, rho, tr)
                .unwrap_or_else(|e| panic!("target {target}, rho {rho}: {e}"));
            assert!(line.r >= 0.0 && line.l >= 0.0);
            assert_close(line.r, rho * line.l, 1e-12, "R = rho·L");

            let res = compute_scr(&sys, line, tr).expect("solved line is valid");
            assert_close(res.scr, target, 1e-9, "achieved SCR");
        }
    }
}

#[test]
fn scr_decreases_as_line_inductance_grows() {
    let sys = reference_system();
    let scrs: Vec<f64> = [1e-5, 5e-5, 1e-4, 5e-4, 1e-3]
        .iter()
        .map(|&l| {
            compute_scr(&sys, Rl::new(0.001, l), small_transformer())
                .expect("valid line")
                .scr
        })
        .collect();
    assert!(scrs.windows(2).all(|w| w[1] < w[0]), "SCRs: {scrs:?}");
}

#[test]
fn infeasible_targets_are_reported() {
    let sys = reference_system();
    let resistive = Rl::new(1.0, 0.0);
    assert!(matches!(
        solve_line_rl_for_target_scr(&sys, 3.0, 0.0, resistive),
        Err(ScrError::NoRealSolution { .. })
    ));
    let inductive = Rl::new(0.0, 1e-3);
    assert!(matches!(
        solve_line_rl_for_target_scr(&sys, 3.0, 0.0, inductive),
        Err(ScrError::NoPositiveSolution { .. })
    ));
}

#[test]
fn power_angle_inversion_on_rising_branch() {
    let (v_ll, r, x): (f64, f64, f64) = (380.0, 0.01, 0.03);
    let theta = x.atan2(r);
    for k in 1..10 {
        let delta = theta * k as f64 / 10.0;
        let p = p_of_delta(v_ll, r, x, delta);
        let back = delta_from_p(v_ll, r, x, p).expect("P within range");
        assert_close(back, delta, 1e-9, "δ round trip");
    }
    assert!(delta_from_p(v_ll, r, x, p_max(v_ll, r, x) * 1.01).is_err());
}

#[test]
fn scanned_current_limit_tracks_closed_form() {
    let v_ph = 380.0 / 3.0_f64.sqrt();
    let z = 0.05;
    for target in [100.0, 500.0, 1500.0] {
        let scan = current_drop_limit(v_ph, z, target).expect("reachable");
        let exact = current_drop_limit_exact(v_ph, z, target).expect("reachable");
        let spacing = 89.9_f64.to_radians() / 1999.0;
        assert!(scan >= exact - 1e-12 && scan - exact <= spacing + 1e-12);
    }
}

#[test]
fn operating_point_with_limits_on_reference_grid() {
    let sys = reference_system();
    let x = sys.omega() * 7.5e-5;
    let op = operating_point(
        &sys,
        0.0,
        x,
        OperatingRequest::Power(100_000.0),
        DropLimits {
            i_max: Some(400.0),
            v_drop_pct: Some(10.0),
        },
    )
    .expect("within P_max");

    assert_close(op.p, 100_000.0, 1e-9, "P");
    assert!(op.delta > 0.0 && op.delta < op.theta);
    assert!(op.delta_i_limit.is_some());
    let dv = op.delta_v_limit.expect("10% reachable");
    assert_close(dv, 2.0 * (0.05_f64).asin(), 1e-12, "ΔV% limit angle");
}

#[test]
fn reference_sweep_has_121_rows() {
    let sys = reference_system();
    let rows = sweep(&sys, 0.0, sys.omega() * 7.5e-5, 60.0, 0.5).expect("valid range");
    assert_eq!(rows.len(), 121);
    assert_eq!(rows[0].p_mw, 0.0);
    assert_eq!(rows[0].i_a, 0.0);
    assert_eq!(rows[0].dv_pct, 0.0);
    assert_close(rows[120].delta_deg, 60.0, 1e-12, "last δ");
}

#[test]
fn session_keeps_previous_result_on_failure() {
    let mut session = Session::new(false);
    let first = session.calc_scr(&ScrInputs::default()).expect("default inputs");

    let bad = ScrInputs {
        l_line: "0".to_string(),
        ..ScrInputs::default()
    };
    assert!(session.calc_scr(&bad).is_err());
    assert_eq!(session.last_result(), Some(&first));
}

#[test]
fn session_sweep_and_operate_require_a_result() {
    let mut session = Session::new(false);
    assert_eq!(session.run_sweep(60.0, 0.5).err(), Some(ScrError::NoResult));
    assert_eq!(
        session.operating_point(&OperatingInputs::default()).err(),
        Some(ScrError::NoResult)
    );

    session.calc_scr(&ScrInputs::default()).expect("default inputs");
    assert_eq!(session.run_sweep(60.0, 0.5).map(<[_]>::len), Ok(121));
    let op = session
        .operating_point(&OperatingInputs::default())
        .expect("1 kW is within P_max");
    assert_close(op.p, 1000.0, 1e-9, "P");
}

#[test]
fn session_per_unit_line_matches_absolute() {
    let sys = reference_system();
    let pu_l = 7.5e-5 / sys.l_base();

    let mut abs = Session::new(false);
    let a = abs.calc_scr(&ScrInputs::default()).expect("absolute");

    let mut pu = Session::new(true);
    let b = pu
        .calc_scr(&ScrInputs {
            l_line: format!("{pu_l}pu"),
            ..ScrInputs::default()
        })
        .expect("per-unit");
    assert_close(b.scr, a.scr, 1e-9, "SCR");
}

#[test]
fn session_line_solve_from_unit_text() {
    let mut session = Session::new(false);
    let line = session
        .calc_line(&LineInputs {
            v_ll: "0.4 kV".to_string(),
            s_n: "250 kVA".to_string(),
            f: "50".to_string(),
            target_scr: "5".to_string(),
            r_over_l: "50".to_string(),
            r_tr: "2 mohm".to_string(),
            l_tr: "20 uH".to_string(),
        })
        .expect("feasible");
    assert_close(line.scr, 5.0, 1e-9, "achieved SCR");
    assert_eq!(session.last_line(), Some(&line));
}

#[test]
fn bundled_scenarios_load_and_run() {
    for name in ["weak_grid.toml", "with_transformer.toml"] {
        let path = common::scenario_path(name);
        let cfg = ScenarioConfig::from_toml_file(std::path::Path::new(&path))
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        let errors = cfg.validate();
        assert!(errors.is_empty(), "{name} should be valid: {errors:?}");

        let mut session = Session::new(cfg.options.per_unit);
        let res = session.calc_scr(&cfg.scr_inputs()).expect("valid scenario");
        assert!(res.scr > 0.0);
        let line = session.calc_line(&cfg.line_inputs()).expect("feasible target");
        let target: f64 = cfg.target.scr.parse().expect("numeric target");
        assert_close(line.scr, target, 1e-9, "achieved SCR");
        session
            .operating_point(&cfg.operating_inputs())
            .expect("operating point within limits");
    }
}

#[test]
fn system_accessors_are_consistent() {
    let sys = System::new(400.0, 250_000.0, 50.0);
    assert_close(sys.z_base(), 0.64, 1e-12, "z_base");
    assert_close(sys.l_base(), 0.64 / sys.omega(), 1e-12, "l_base");
    assert_close(sys.v_ph() * 3.0_f64.sqrt(), 400.0, 1e-12, "v_ph");
}
