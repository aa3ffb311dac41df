use std::io::{self, Write};
use std::panic;

/// Install `better_panic` backtraces and make sure the panic also lands in
/// the log file before the process exits.
pub fn initialize_panic_handler() {
    better_panic::install();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        log::error!("Panic: {panic_info}");
        log::logger().flush();
        let _ = io::stdout().flush();

        default_hook(panic_info);

        std::process::exit(1);
    }));
}
