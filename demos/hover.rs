use nalgebra::{UnitQuaternion, Vector3};
use uav_fc::dynamics::{Airframe, Consts, Plant, State};
use uav_fc::{ControlConfig, Estimate, FlightController, MixerGeometry, TargetState};

// Level recovery followed by a heading change
fn main() {
    let consts = Consts {
        g: 9.81,
        mass: 1.2,
        ixx: 0.012,
        iyy: 0.012,
        izz: 0.022,
    };

    let airframe = Airframe {
        geometry: MixerGeometry::QUAD_X,
        max_thrust: consts.mass * consts.g / 2.0, // hover at half power
        arm_length: 0.12,
        yaw_torque_coeff: 0.02,
    };

    let initial_state = State {
        position: Vector3::new(0.0, 0.0, 5.0),
        attitude: UnitQuaternion::from_euler_angles(0.35, -0.25, 0.0),
        ..State::default()
    };

    let config = match std::env::args().nth(1) {
        Some(path) => match ControlConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                println!("Could not load {}: {}", path, e);
                return;
            }
        },
        None => ControlConfig::default(),
    };

    let mut controller = match FlightController::new(config) {
        Ok(controller) => controller,
        Err(e) => {
            println!("Invalid configuration: {}", e);
            return;
        }
    };

    let mut plant = Plant::new(initial_state, consts, airframe);
    let mut target = TargetState::default();

    let dt = controller.config().dt();
    let simulation_span = 6.0;
    let mut current_time = 0.0;

    while current_time < simulation_span {
        if current_time >= 3.0 {
            target.set_target_attitude(UnitQuaternion::from_euler_angles(0.0, 0.0, 0.8));
        }

        let estimate = Estimate::sample(&plant);
        let powers = controller.tick(&estimate, &mut target, &mut plant);

        if let Err(e) = plant.step(dt as f64) {
            println!("Simulation failed: {}", e);
            return;
        }

        let (roll, pitch, yaw) = plant.state.attitude.euler_angles();
        println!(
            "{:.3} {:.4} {:.4} {:.4} {:.3} {:.3} {:.3} {:.3}",
            current_time,
            roll,
            pitch,
            yaw,
            powers.0[0],
            powers.0[1],
            powers.0[2],
            powers.0[3]
        );

        current_time += dt;
    }
}
