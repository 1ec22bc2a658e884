use nalgebra::{UnitQuaternion, Vector3};
use uav_fc::dynamics::{Airframe, Consts, Plant, State};
use uav_fc::{
    Axis, AxisMode, AxisModes, ControlConfig, Estimate, FlightController, MixerGeometry, SharedTarget,
    TargetState,
};

const LOOP_RATE_HZ: f32 = 500.0;

fn plant(attitude: UnitQuaternion<f64>) -> Plant {
    let consts = Consts {
        g: 9.81,
        mass: 1.0,
        ixx: 0.01,
        iyy: 0.01,
        izz: 0.02,
    };
    let airframe = Airframe {
        geometry: MixerGeometry::QUAD_X,
        max_thrust: consts.mass * consts.g / 2.0,
        arm_length: 0.1,
        yaw_torque_coeff: 0.02,
    };
    let state = State {
        position: Vector3::new(0.0, 0.0, 10.0),
        attitude,
        ..State::default()
    };
    Plant::new(state, consts, airframe)
}

fn controller() -> FlightController {
    let config = ControlConfig {
        loop_rate_hz: LOOP_RATE_HZ,
        ..ControlConfig::default()
    };
    FlightController::new(config).unwrap()
}

/// Runs the cascade against the plant, checking the allocation bounds on
/// every tick.
fn fly(
    controller: &mut FlightController,
    plant: &mut Plant,
    target: &mut TargetState,
    seconds: f32,
) {
    let dt = 1.0 / LOOP_RATE_HZ;
    let minimal_thrust = controller.config().minimal_thrust;
    let ticks = (seconds * LOOP_RATE_HZ) as usize;

    for _ in 0..ticks {
        let estimate = Estimate::sample(&*plant);
        let powers = controller.tick(&estimate, target, &mut *plant);

        for (rotor, p) in powers.iter() {
            assert!(
                (minimal_thrust..=1.0).contains(&p),
                "{:?} commanded {}",
                rotor,
                p
            );
        }
        assert_eq!(plant.powers(), powers);

        plant.step(dt as f64).unwrap();
    }
}

fn tilt(attitude: &UnitQuaternion<f64>) -> f64 {
    let z = attitude * Vector3::z();
    z.z.clamp(-1.0, 1.0).acos()
}

#[test]
fn test_levels_from_tilted_attitude() {
    let mut controller = controller();
    let mut plant = plant(UnitQuaternion::from_euler_angles(0.3, -0.2, 0.0));
    let mut target = TargetState::default();

    assert!(tilt(&plant.state.attitude) > 0.3);
    fly(&mut controller, &mut plant, &mut target, 3.0);

    assert!(
        tilt(&plant.state.attitude) < 0.01,
        "tilt after recovery: {}",
        tilt(&plant.state.attitude)
    );
    assert!(plant.state.rate.norm() < 0.05);
}

#[test]
fn test_levels_from_negated_attitude() {
    let q = UnitQuaternion::from_euler_angles(0.2, -0.1, 0.0);
    let negated = UnitQuaternion::new_unchecked(-q.into_inner());
    assert!(negated.w < 0.0);

    let mut controller = controller();
    let mut plant = plant(negated);
    let mut target = TargetState::default();

    fly(&mut controller, &mut plant, &mut target, 3.0);

    assert!(
        tilt(&plant.state.attitude) < 0.01,
        "tilt after recovery: {}",
        tilt(&plant.state.attitude)
    );
}

#[test]
fn test_full_rate_mode_holds_attitude() {
    let attitude = UnitQuaternion::from_euler_angles(0.2, 0.0, 0.0);
    let mut controller = controller();
    let mut plant = plant(attitude);
    let mut target = TargetState::default();
    target.set_modes(AxisModes::uniform(AxisMode::Rate));

    fly(&mut controller, &mut plant, &mut target, 1.0);

    assert!((tilt(&plant.state.attitude) - 0.2).abs() < 0.01);
    assert!(plant.state.rate.norm() < 0.01);
    assert_eq!(target.modes(), AxisModes::uniform(AxisMode::Rate));
}

#[test]
fn test_tracks_commanded_tilt() {
    let mut controller = controller();
    let mut plant = plant(UnitQuaternion::identity());
    let mut target = TargetState::default();
    target.set_target_attitude(UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.2));

    fly(&mut controller, &mut plant, &mut target, 3.0);

    let (roll, pitch, _) = plant.state.attitude.euler_angles();
    assert!((pitch - 0.2).abs() < 0.01, "pitch {}", pitch);
    assert!(roll.abs() < 0.01, "roll {}", roll);
}

#[test]
fn test_partial_yaw_weight_still_reaches_heading() {
    let mut controller = controller();
    let mut plant = plant(UnitQuaternion::identity());
    let mut target = TargetState::default();
    target.set_target_attitude(UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.5));

    fly(&mut controller, &mut plant, &mut target, 6.0);

    let (_, _, yaw) = plant.state.attitude.euler_angles();
    assert!((yaw - 0.5).abs() < 0.05, "yaw {}", yaw);
    assert!(tilt(&plant.state.attitude) < 0.01);
}

#[test]
fn test_rate_mode_yaw_follows_stick() {
    let mut controller = controller();
    let mut plant = plant(UnitQuaternion::identity());
    let shared = SharedTarget::default();
    shared.update(|t| {
        t.set_axis_mode(Axis::Yaw, AxisMode::Rate);
        t.set_target_rate(Vector3::new(0.0, 0.0, 1.0));
    });

    let dt = 1.0 / LOOP_RATE_HZ;
    for _ in 0..(2.0 * LOOP_RATE_HZ) as usize {
        let estimate = Estimate::sample(&plant);
        shared.update(|t| controller.tick(&estimate, t, &mut plant));
        plant.step(dt as f64).unwrap();
    }

    assert!((plant.state.rate.z - 1.0).abs() < 0.02, "yaw rate {}", plant.state.rate.z);
    assert!(tilt(&plant.state.attitude) < 0.01);
    assert_eq!(shared.snapshot().target_rate().z, 1.0);
}
