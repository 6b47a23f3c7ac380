//! Integration test: emergency lockout, latching and recovery.

use cryo_common::control_unit::alarm::{AlarmId, AlarmSeverity};
use cryo_common::control_unit::inputs::SafetyInputs;
use cryo_common::control_unit::state::{SafetyState, ShutdownCommand};

use super::Rig;

#[test]
fn emergency_stop_locks_out_until_cleared() {
    let mut rig = Rig::nominal(14.0, 30.0);
    rig.run_for(5_000);
    assert!(rig.last.output > 0.0);

    rig.core.estop_handle().trigger();
    let cmd = rig.pass();
    assert_eq!(cmd.output, 0.0);
    assert_eq!(cmd.shutdown, Some(ShutdownCommand::Emergency));
    assert!(!cmd.pump);
    assert_eq!(rig.core.interlock().state(), SafetyState::Lockout);
    assert!(rig.core.alarms().is_active(AlarmId::EmergencyStop));

    rig.run_for(25_000);
    assert!(rig.core.interlock().is_locked_out());

    // Timer expired; the emergency alarm still latches.
    rig.run_for(10_000);
    assert!(!rig.core.interlock().is_locked_out());
    assert_eq!(rig.core.interlock().state(), SafetyState::Emergency);
    assert_eq!(rig.last.shutdown, Some(ShutdownCommand::Emergency));

    rig.command("clear_alarm emergency_stop").unwrap();
    assert!(rig.core.interlock().can_operate());
    rig.run_for(1_000);
    assert!(rig.last.output > 0.0);
    assert_eq!(rig.last.shutdown, None);
    assert_eq!(rig.core.interlock().lockouts_total(), 1);
}

#[test]
fn trip_command_expires_on_its_own() {
    let mut rig = Rig::nominal(14.0, 30.0);
    rig.run_for(2_000);

    rig.command("trip 10").unwrap();
    rig.pass();
    assert_eq!(rig.last.shutdown, Some(ShutdownCommand::Emergency));
    assert!(rig.core.snapshot(rig.now).lockout_remaining_ms > 9_000);

    // A shorter trip keeps the running timer.
    rig.command("trip 1").unwrap();
    assert!(rig.core.interlock().lockout_remaining(rig.now) > 5_000);

    rig.run_for(11_000);
    assert!(!rig.core.interlock().is_locked_out());
    assert!(rig.core.interlock().can_operate());
    assert!(rig.last.output > 0.0);
    assert_eq!(rig.core.interlock().lockouts_total(), 1);
}

#[test]
fn phase_failure_latches_critical() {
    let mut rig = Rig::nominal(14.0, 30.0);
    rig.plant.set_inputs(SafetyInputs::PHASE_FAILURE);
    rig.run_for(1_000);

    assert_eq!(rig.core.interlock().state(), SafetyState::Critical);
    assert_eq!(rig.last.shutdown, Some(ShutdownCommand::Controlled));
    assert_eq!(rig.last.output, 0.0);
    assert!(rig.last.pump);
    assert!(rig.last.alarm_horn);

    rig.plant.set_inputs(SafetyInputs::empty());
    rig.run_for(5_000);
    assert_eq!(rig.core.interlock().state(), SafetyState::Critical);

    // Acknowledging silences the horn but does not clear.
    rig.command("acknowledge_alarm phase_failure").unwrap();
    rig.pass();
    assert!(!rig.last.alarm_horn);
    assert_eq!(rig.core.interlock().state(), SafetyState::Critical);

    rig.command("clear_alarm phase_failure").unwrap();
    rig.run_for(1_000);
    assert!(rig.core.interlock().state() <= SafetyState::Warning);
    assert!(rig.last.output > 0.0);
}

#[test]
fn flow_loss_alarms_then_clears() {
    let mut rig = Rig::nominal(14.0, 30.0);
    rig.plant.set_inputs(SafetyInputs::FLOW_LOSS);
    rig.run_for(1_000);

    let alarm = rig.core.alarms().get(AlarmId::WaterFlowLoss).copied().unwrap();
    assert_eq!(alarm.severity, AlarmSeverity::Alarm);
    assert_eq!(rig.core.interlock().state(), SafetyState::Alarm);
    // Alarm level still permits operation.
    assert!(rig.last.output > 0.0);
    assert!(rig.last.alarm_horn);

    rig.plant.set_inputs(SafetyInputs::empty());
    rig.run_for(1_000);
    assert!(!rig.core.alarms().is_active(AlarmId::WaterFlowLoss));
    assert_eq!(rig.core.interlock().state(), SafetyState::Normal);
    assert!(!rig.last.alarm_horn);
    assert!(
        rig.events
            .for_subsystem("safety")
            .any(|e| e.message == "alarm resolved: water_flow_loss")
    );
}

#[test]
fn wired_emergency_stop_trips_immediately() {
    let mut rig = Rig::nominal(14.0, 30.0);
    rig.run_for(1_000);
    rig.plant.set_inputs(SafetyInputs::EMERGENCY_STOP);
    let cmd = rig.pass();
    assert_eq!(cmd.shutdown, Some(ShutdownCommand::Emergency));
    assert_eq!(cmd.compressor_stages, 0);
}
