use std::convert::Infallible;
use log::info;
use tokio::time::{sleep, Duration};

use crate::device::types::{HeadingSample, WindSample};
use crate::output::channel::{OutputChannel, TransportFactory};
use crate::output::sentence::{heading_sentence, wind_sentence};

/**
 * How often (milliseconds) a simulated sample is sent.
 */
pub const SIMULATION_PERIOD: u64 = 1000;

/**
 * How far the simulated clock moves per sample.
 */
pub const SIMULATION_TIME_STEP: f64 = 0.1;

/// Wind and heading at simulated time `t`: the angle swings around 90°, the speed between 0
/// and 10 knots and the heading around 180°.
pub fn sample_at(t: f64) -> (WindSample, HeadingSample) {
    let wind = WindSample {
        apparent_angle_deg: (90.0 + (t / 10.0).sin() * 80.0).rem_euclid(360.0),
        apparent_speed_kts: 10.0 * 0.5 * (t.sin() + 1.0),
    };
    let heading = HeadingSample {
        heading_deg: (180.0 + (t / 15.0).sin() * 10.0).rem_euclid(360.0),
    };

    (wind, heading)
}

pub struct SimulationGenerator<F: TransportFactory> {
    output: OutputChannel<F>,
    t: f64,
}

impl<F: TransportFactory> SimulationGenerator<F> {
    pub fn new(output: OutputChannel<F>) -> Self {
        SimulationGenerator { output, t: 0.0 }
    }

    pub fn tick(&mut self) {
        let (wind, heading) = sample_at(self.t);

        self.output.send(&wind_sentence(&wind));
        self.output.send(&heading_sentence(&heading));

        self.t += SIMULATION_TIME_STEP;
    }

    pub async fn run(mut self) -> Infallible {
        info!("Running in simulation mode, sending to {}", self.output.destination());

        loop {
            self.tick();
            sleep(Duration::from_millis(SIMULATION_PERIOD)).await;
        }
    }
}
