use clap::Parser;
use paging_sim::config::Config;
use paging_sim::run_simulation;
use std::process;

fn init_msg() {
    println!("virtual memory paging simulation");
}

fn main() {
    env_logger::init();
    init_msg();
    let config = Config::parse();
    config.display();
    if let Err(err) = config.validate() {
        eprintln!("{}", err);
        process::exit(1);
    }
    println!();
    if let Err(err) = run_simulation(config) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}
