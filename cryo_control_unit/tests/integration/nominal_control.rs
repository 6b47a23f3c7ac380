//! Integration test: closed-loop regulation at mild ambient.

use cryo_common::control_unit::config::ControlConfiguration;
use cryo_common::control_unit::state::OperatingMode;
use cryo_control_unit::control::analytics::DEFAULT_TREND_SAMPLES;

use super::{MINUTE_MS, Rig};

#[test]
fn pulls_return_water_down_to_setpoint() {
    let mut rig = Rig::nominal(14.0, 30.0);

    assert!(
        rig.run_until(20 * MINUTE_MS, |r| r.plant.return_water() < 11.0),
        "pull-down too slow: {:.2} °C after 20 min",
        rig.plant.return_water()
    );
    rig.run_for(20 * MINUTE_MS - rig.now);

    let (mut lo, mut hi) = (f64::MAX, f64::MIN);
    while rig.now < 60 * MINUTE_MS {
        let cmd = rig.pass();
        assert!((0.0..=100.0).contains(&cmd.output));
        let rw = rig.plant.return_water();
        lo = lo.min(rw);
        hi = hi.max(rw);
    }
    assert!(lo > 8.0 && hi < 12.0, "return water left [8, 12]: {lo:.2}..{hi:.2}");

    // Never forced safe, never locked out.
    assert_eq!(rig.core.stats().forced_safe, 0);
    assert_eq!(rig.core.interlock().lockouts_total(), 0);
}

#[test]
fn status_pushed_on_cadence() {
    let mut rig = Rig::nominal(12.0, 30.0);
    rig.run_for(10_000);

    // 0, 2, 4, 6, 8 s
    assert_eq!(rig.status.pushes, 5);
    let snap = rig.status.snapshot.unwrap();
    assert_eq!(snap.setpoint, 10.0);
    assert_eq!(snap.mode, OperatingMode::Auto);
    assert_eq!(rig.status.registers.setpoint, 100);
    assert_eq!(rig.core.stats().passes, 20);
    assert_eq!(rig.core.stats().control_updates, 10);
}

#[test]
fn deadband_holds_output() {
    let mut rig = Rig::nominal(10.1, 30.0);

    for _ in 0..10 {
        assert_eq!(rig.pass().output, 0.0);
    }
    assert!(rig.plant.return_water() < 10.2);

    // The loop warms until the error leaves the band.
    assert!(rig.run_until(MINUTE_MS, |r| r.last.output > 0.0));
    assert!(rig.plant.return_water() > 10.2);
}

#[test]
fn manual_output_and_return_to_auto() {
    let cfg = ControlConfiguration {
        manual_override: true,
        manual_output: 40.0,
        ..Default::default()
    };
    let mut rig = Rig::new(cfg, 14.0, 30.0);

    let cmd = rig.pass();
    assert_eq!(rig.core.mode(), OperatingMode::Manual);
    assert_eq!(cmd.output, 40.0);
    assert_eq!(cmd.compressor_stages, 1);

    rig.command("auto").unwrap();
    rig.run_for(1_000);
    assert_eq!(rig.core.mode(), OperatingMode::Auto);
    assert!(rig.last.output > 40.0);
}

#[test]
fn disabled_controller_stops_plant() {
    let mut rig = Rig::nominal(14.0, 30.0);
    rig.run_for(5_000);
    assert!(rig.last.output > 0.0);

    rig.command("disable").unwrap();
    rig.run_for(1_000);
    assert_eq!(rig.core.mode(), OperatingMode::Off);
    assert_eq!(rig.last.output, 0.0);
    assert_eq!(rig.last.compressor_stages, 0);
    assert!(!rig.last.pump);
    assert_eq!(rig.last.shutdown, None);
}

#[test]
fn plant_efficiency_tracked() {
    let mut rig = Rig::nominal(12.0, 30.0);
    rig.run_for(5 * MINUTE_MS);

    let snap = rig.core.snapshot(rig.now);
    assert!(snap.efficiency > 0.5 && snap.efficiency <= 1.0);
    assert_eq!(rig.core.analytics().samples(), 64);
    // Well above the target: no gain nudges.
    assert_eq!(rig.core.algorithm().pid().unwrap().gains().kp, 2.0);
    assert!(rig.core.optimizer().metrics().cycles >= 2);

    let analytics = rig.core.analytics();
    assert_eq!(
        snap.efficiency_trend,
        analytics.efficiency_trend(DEFAULT_TREND_SAMPLES)
    );
    assert_eq!(snap.power_trend, analytics.power_trend(DEFAULT_TREND_SAMPLES));
    let pushed = rig.status.snapshot.unwrap();
    assert!(pushed.efficiency_trend.is_finite());
    assert!(pushed.efficiency_trend.abs() < 0.01, "{}", pushed.efficiency_trend);
    assert!(pushed.power_trend.is_finite());
}
