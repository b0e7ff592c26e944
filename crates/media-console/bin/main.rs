mod cmd;

use clap::Parser;
use cmd::console::ConsoleArgs;

fn main() -> eyre::Result<()> {
    ConsoleArgs::parse().run()
}
