use fart_runtime::{run, LibraryError};

fn main() -> Result<(), LibraryError> {
    env_logger::init();
    run(std::env::args().collect())
}
