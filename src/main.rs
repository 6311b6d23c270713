use anyhow::Result;
use sigsleep::{
    config::Config,
    fixture::{Fixture, terminate},
    logging,
    options::Options,
};
use tracing::debug;

fn main() -> Result<()> {
    let options = Options::parse_env();
    logging::init();

    // Exit directly if nothing was asked of us, handy as a sanity check.
    if options.flags_set() == 0 {
        eprintln!("No arguments specified. Exiting...");
        terminate(0);
    }

    debug!("parsed {:?}", options);
    match Fixture::new(Config::from(&options)).run()? {}
}
