use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info, warn};

use paneld::{GpioBackend, Panel, PanelConfig};

#[cfg(not(feature = "hardware-gpio"))]
use paneld::MockGpioBackend;
#[cfg(feature = "hardware-gpio")]
use paneld::SysfsBackend;

fn main() -> ExitCode {
    env_logger::init();

    let config = PanelConfig::default();

    let backend = {
        #[cfg(feature = "hardware-gpio")]
        {
            match SysfsBackend::new() {
                Ok(backend) => Arc::new(backend),
                Err(e) => {
                    error!("backend init failed: {e}");
                    return ExitCode::from(e.exit_code());
                }
            }
        }
        #[cfg(not(feature = "hardware-gpio"))]
        {
            Arc::new(MockGpioBackend::default())
        }
    };

    // SIGINT and SIGTERM wake the blocked wait through the cancellation
    // descriptor, so the loop drains and the pins get unexported
    {
        let backend = backend.clone();
        if let Err(e) = ctrlc::set_handler(move || backend.request_shutdown()) {
            warn!("signal handler not installed: {e}");
        }
    }

    let mut panel = match Panel::new(&config, backend) {
        Ok(panel) => panel,
        Err(e) => {
            error!("panel bring-up failed: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    info!(
        "watching buttons start={} pause={} stop={}, driving lamps red={} green={}",
        config.start_pin, config.pause_pin, config.stop_pin, config.red_pin, config.green_pin
    );
    panel.run();

    ExitCode::SUCCESS
}
