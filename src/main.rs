use clap::Parser;
use tile_collapse::AppConfig;

fn main() {
    let cli = AppConfig::parse();
    std::process::exit(match tile_collapse::run(&cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    });
}
