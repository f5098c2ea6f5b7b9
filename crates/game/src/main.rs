use std::process::ExitCode;

use tracing::error;

mod app;

fn main() -> ExitCode {
    let wiring = match app::bootstrap::build_app() {
        Ok(wiring) => wiring,
        Err(err) => {
            error!(error = %err, "startup_failed");
            eprintln!("startup failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    match app::loop_runner::run_scenario(wiring.settings, &wiring.defs, &wiring.scenario) {
        Ok(outcome) => {
            println!(
                "ran {} steps: {} notifications, handlers {:?}, player at ({:.2}, {:.2}), label '{}'",
                outcome.steps_run,
                outcome.notifications.len(),
                outcome.invocations,
                outcome.player_position.x,
                outcome.player_position.y,
                outcome.final_label
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "scenario_failed");
            ExitCode::FAILURE
        }
    }
}
