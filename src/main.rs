mod cli;

use crate::cli::app::App;
use anyhow::Result;

fn main() -> Result<()> {
    cli::init_tracing();
    let app = App::from_args();
    app.run()
}
