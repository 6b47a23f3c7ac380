//! Integration test: operator command session.

use cryo_common::control_unit::config::ControlConfiguration;
use cryo_common::control_unit::inputs::SafetyInputs;
use cryo_common::control_unit::state::{AlgorithmKind, OperatingMode};
use cryo_control_unit::command::{CommandContext, CommandError, handle_line};
use cryo_control_unit::cycle::ControlCore;
use cryo_control_unit::error::CoreError;
use cryo_control_unit::io::{ConfigStore, MemoryEventLog, TomlConfigStore};
use tempfile::TempDir;

use super::Rig;

#[test]
fn operator_session() {
    let mut rig = Rig::nominal(12.0, 30.0);
    rig.run_for(2_000);

    assert_eq!(rig.command("set_mode adaptive").unwrap().0, "algorithm adaptive");
    assert_eq!(rig.core.algorithm().kind(), AlgorithmKind::AdaptivePid);
    // Gains carried across the switch.
    assert_eq!(rig.core.algorithm().pid().unwrap().gains().kp, 2.0);

    rig.command("set_deadband 0.5").unwrap();
    assert_eq!(rig.core.config().deadband, 0.5);
    assert!(matches!(
        rig.command("set_deadband 6"),
        Err(CommandError::Rejected(CoreError::InvalidParameter { name: "deadband", .. }))
    ));

    assert!(rig.command("set_manual 150").is_err());
    rig.command("set_manual 35").unwrap();
    rig.run_for(1_000);
    assert_eq!(rig.core.mode(), OperatingMode::Manual);
    assert_eq!(rig.last.output, 35.0);

    rig.command("auto").unwrap();
    rig.run_for(1_000);
    assert_eq!(rig.core.mode(), OperatingMode::Auto);

    assert_eq!(
        rig.command("defrost"),
        Err(CommandError::UnknownCommand("defrost".into()))
    );
}

#[test]
fn status_reports_json() {
    let mut rig = Rig::nominal(12.0, 30.0);
    rig.command("set_mode fuzzy").unwrap();
    rig.run_for(2_000);

    let reply = rig.command("status").unwrap();
    let v: serde_json::Value = serde_json::from_str(&reply.0).unwrap();
    assert_eq!(v["algorithm"], "fuzzy_logic");
    assert_eq!(v["mode"], "auto");
    assert_eq!(v["safety_state"], "normal");
    assert!(v["output"].as_f64().unwrap() > 0.0);
    assert!(v["active_fault"].is_null());
}

#[test]
fn acknowledge_all_silences_horn() {
    let mut rig = Rig::nominal(12.0, 30.0);
    rig.plant.set_inputs(SafetyInputs::FLOW_LOSS);
    rig.run_for(1_000);
    assert!(rig.last.alarm_horn);

    assert_eq!(rig.command("acknowledge_alarm all").unwrap().0, "acknowledged 1");
    rig.pass();
    assert!(!rig.last.alarm_horn);

    let listing = rig.command("alarms").unwrap().0;
    assert_eq!(listing, "0x0305 water_flow_loss alarm ack");
}

#[test]
fn saved_configuration_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("control.toml");
    let mut store = TomlConfigStore::new(&path);
    let mut events = MemoryEventLog::new();

    let mut core = ControlCore::from_store(&mut store, 0).unwrap();
    assert_eq!(core.config(), &ControlConfiguration::default());

    let mut ctx = CommandContext {
        events: &mut events,
        store: &mut store,
    };
    for line in ["set_setpoint 8.5", "set_mode hybrid", "set_compensation off", "save_config"] {
        handle_line(&mut core, line, &mut ctx, 0).unwrap();
    }

    let mut reopened = TomlConfigStore::new(&path);
    let cfg = reopened.load().unwrap();
    assert_eq!(cfg.setpoint, 8.5);
    assert_eq!(cfg.algorithm, AlgorithmKind::Hybrid);
    assert!(!cfg.compensation.enabled);

    let restarted = ControlCore::from_store(&mut reopened, 0).unwrap();
    assert_eq!(restarted.algorithm().kind(), AlgorithmKind::Hybrid);
    assert_eq!(restarted.effective_setpoint(), 8.5);
}
