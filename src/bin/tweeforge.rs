use color_eyre::Result;

fn main() -> Result<()> {
    env_logger::init();
    tweeforge::tweeforge::run()
}
