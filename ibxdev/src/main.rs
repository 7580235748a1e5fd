mod application;
mod presentation;

use std::process::ExitCode;

use ibx_core::error::Result;

fn main() -> Result<ExitCode> {
    application::run()
}
