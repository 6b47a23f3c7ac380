//! Integration test: sensor loss, fault slot and recovery.

use cryo_common::control_unit::alarm::AlarmId;
use cryo_common::control_unit::fault::FaultKind;
use cryo_common::control_unit::sensor::ChannelId;
use cryo_common::control_unit::state::ControlState;

use super::Rig;

#[test]
fn primary_sensor_loss_blocks_auto() {
    let mut rig = Rig::nominal(12.0, 30.0);
    rig.run_for(5_000);
    assert!(rig.last.output > 0.0);

    rig.plant.fail(ChannelId::ReturnWater);
    rig.run_for(1_000);
    let fault = rig.core.detector().active().unwrap();
    assert_eq!(fault.kind, FaultKind::PrimarySensorTimeout);
    assert_eq!(rig.core.control_state(), ControlState::Fault);
    assert!(!rig.core.can_operate());
    assert_eq!(rig.last.output, 0.0);
    // Blocked by the detector, not the interlock.
    assert_eq!(rig.last.shutdown, None);

    rig.run_for(5_000);
    assert!(rig.core.alarms().is_active(AlarmId::SensorFailure));

    rig.plant.restore(ChannelId::ReturnWater);
    rig.run_for(1_000);
    assert!(rig.last.output > 0.0);
    // Slot keeps the fault until reset.
    assert_eq!(rig.core.control_state(), ControlState::Degraded);

    let reply = rig.command("reset_fault").unwrap();
    assert_eq!(reply.0, "fault reset: primary_sensor_timeout");
    rig.run_for(1_000);
    assert_eq!(rig.core.control_state(), ControlState::Normal);
    assert_eq!(rig.core.detector().active(), None);

    rig.run_for(5_000);
    assert!(!rig.core.alarms().is_active(AlarmId::SensorFailure));
}

#[test]
fn supply_sensor_loss_only_degrades() {
    let mut rig = Rig::nominal(12.0, 30.0);
    rig.run_for(2_000);

    rig.plant.fail(ChannelId::SupplyWater);
    rig.run_for(1_000);
    assert_eq!(
        rig.core.detector().active().map(|f| f.kind),
        Some(FaultKind::SupplySensorTimeout)
    );
    assert_eq!(rig.core.control_state(), ControlState::Degraded);
    assert!(rig.core.can_operate());
    assert!(rig.last.output > 0.0);
}

#[test]
fn primary_loss_wins_the_fault_slot() {
    let mut rig = Rig::nominal(12.0, 30.0);
    rig.run_for(2_000);

    rig.plant.fail(ChannelId::SupplyWater);
    rig.plant.fail(ChannelId::ReturnWater);
    rig.run_for(1_000);
    assert_eq!(
        rig.core.detector().active().map(|f| f.kind),
        Some(FaultKind::PrimarySensorTimeout)
    );
    assert_eq!(rig.core.detector().raised_total(), 2);
}

#[test]
fn implausible_reading_rejected() {
    let mut rig = Rig::nominal(12.0, 30.0);
    rig.run_for(2_000);
    let before = rig.core.sensors().fault_count(ChannelId::ReturnWater);

    // Above the 25 °C plausibility window.
    rig.plant.set_return_water(30.0);
    rig.run_for(1_000);
    assert!(rig.core.sensors().fault_count(ChannelId::ReturnWater) > before);
    assert_eq!(rig.core.sensors().reading(ChannelId::ReturnWater, rig.now), None);
    assert_eq!(rig.last.output, 0.0);
    assert!(!rig.core.alarms().is_active(AlarmId::ReturnWaterHigh));

    // Rejects invalidate immediately: the last good sample is younger
    // than the sensor timeout, yet automatic control is already blocked.
    let last_good = rig.core.sensors().channel(ChannelId::ReturnWater).unwrap().last_update;
    assert!(rig.now - last_good < rig.core.config().timing.fault_timeout_ms);
    assert_eq!(
        rig.core.detector().active().map(|f| f.kind),
        Some(FaultKind::PrimarySensorTimeout)
    );

    rig.plant.set_return_water(12.0);
    rig.run_for(1_000);
    assert!(rig.core.sensors().reading(ChannelId::ReturnWater, rig.now).is_some());
    assert!(rig.last.output > 0.0);
}
